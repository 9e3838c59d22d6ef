//! Signature verification middleware.
//!
//! Requests under the protected path prefixes are buffered, handed to the
//! [`SignatureValidator`] and either forwarded with the
//! [`VerifiedClient`](crate::services::validator::VerifiedClient) in
//! their extensions or answered with a bare `400 Bad Request`. The response
//! never says which check failed.

use crate::{
    middleware::request_id::RequestId,
    models::audit::SignatureAuditEvent,
    services::{
        AppMetrics,
        validator::{InboundRequest, SignatureValidator, Verdict},
    },
    utils::{extract_client_ip, extract_user_agent, full_path},
};
use actix_web::{
    Error, HttpMessage, HttpResponse,
    body::EitherBody,
    dev::{Payload as HttpPayload, Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    rc::Rc,
    sync::Arc,
};

/// Signature middleware factory
///
/// With no protected prefixes every request is checked.
#[derive(Clone)]
pub struct SignatureRequired {
    validator: Arc<SignatureValidator>,
    protected: Vec<String>,
}

impl SignatureRequired {
    pub fn new(validator: Arc<SignatureValidator>) -> Self {
        Self {
            validator,
            protected: Vec::new(),
        }
    }

    /// Require signatures for paths starting with `prefix`.
    pub fn protect(mut self, prefix: impl Into<String>) -> Self {
        self.protected.push(prefix.into());
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for SignatureRequired
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = SignatureRequiredService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SignatureRequiredService {
            service: Rc::new(service),
            validator: self.validator.clone(),
            protected: Rc::new(self.protected.clone()),
        }))
    }
}

/// The actual signature middleware service
pub struct SignatureRequiredService<S> {
    service: Rc<S>,
    validator: Arc<SignatureValidator>,
    protected: Rc<Vec<String>>,
}

impl<S> SignatureRequiredService<S> {
    fn is_protected(&self, path: &str) -> bool {
        self.protected.is_empty() || self.protected.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }
}

impl<S, B> Service<ServiceRequest> for SignatureRequiredService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, mut req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();

        if !self.is_protected(req.path()) {
            return Box::pin(async move { Ok(service.call(req).await?.map_into_left_body()) });
        }

        let validator = self.validator.clone();

        Box::pin(async move {
            let body = match req.extract::<web::Bytes>().await {
                Ok(body) => body,
                Err(e) => {
                    tracing::warn!(error = %e, "Could not read body of signed request");
                    return Ok(bad_request(req));
                }
            };

            let inbound = inbound_request(&req, &body);
            req.set_payload(HttpPayload::from(body));

            let verdict = validator.validate(&inbound).await;
            audit(&req, &verdict);

            match verdict {
                Verdict::Rejected(_) => Ok(bad_request(req)),
                Verdict::Valid(client) => {
                    req.extensions_mut().insert(client);
                    Ok(service.call(req).await?.map_into_left_body())
                }
                Verdict::Unsigned(_) => Ok(service.call(req).await?.map_into_left_body()),
            }
        })
    }
}

fn bad_request<B>(req: ServiceRequest) -> ServiceResponse<EitherBody<B>> {
    req.into_response(HttpResponse::BadRequest().finish())
        .map_into_right_body()
}

fn inbound_request(req: &ServiceRequest, body: &web::Bytes) -> InboundRequest {
    let mut inbound = InboundRequest::new(req.method().as_str(), full_path(req.request()));
    for (name, value) in req.headers() {
        if let Ok(value) = value.to_str() {
            inbound = inbound.with_header(name.as_str(), value);
        }
    }
    inbound.body = body.to_vec();
    inbound
}

fn audit(req: &ServiceRequest, verdict: &Verdict) {
    let http_req = req.request();
    let reason = verdict.reason().map(|reason| reason.as_str());

    SignatureAuditEvent::new(
        verdict.outcome(),
        extract_client_ip(http_req),
        req.method().to_string(),
        &full_path(http_req),
    )
    .with_user_agent(extract_user_agent(http_req))
    .with_client_id(verdict.client().map(|client| client.client_id.clone()))
    .with_request_id(RequestId::of(http_req))
    .with_reason(reason.map(str::to_string))
    .with_unescaped_match(verdict.client().is_some_and(|client| client.unescaped_match))
    .log();

    if let Some(metrics) = req.app_data::<web::Data<AppMetrics>>() {
        metrics.record_signature_verdict(verdict.outcome(), reason);
    }
}
