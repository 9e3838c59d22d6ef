//! Request metrics middleware.
//!
//! Feeds `http_requests_total` and `http_request_duration_seconds` in the
//! [`AppMetrics`] registered as app data. Signature verdicts are counted
//! separately, in `signed_requests_total`, by
//! [`SignatureRequired`](crate::middleware::SignatureRequired); a rejected
//! signed request therefore shows up in both, once as a 400 here.

use crate::{services::AppMetrics, utils::extract_route_pattern};
use actix_web::{
    Error,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use std::{
    future::{Ready, ready},
    pin::Pin,
    time::Instant,
};

/// Records one observation per request, labelled by method, route pattern
/// and response status. Requests pass through untouched when no
/// `AppMetrics` is registered.
pub struct MetricsMiddleware;

impl<S, B> Transform<S, ServiceRequest> for MetricsMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = MetricsService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(MetricsService { service }))
    }
}

pub struct MetricsService<S> {
    service: S,
}

impl<S, B> Service<ServiceRequest> for MetricsService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = Pin<Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>>>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let started = Instant::now();
        let method = req.method().to_string();
        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            // Matched pattern is only known after routing
            let http_req = res.request();
            if let Some(metrics) = http_req.app_data::<web::Data<AppMetrics>>() {
                metrics.record_request(
                    &method,
                    &extract_route_pattern(http_req),
                    res.status().as_u16(),
                    started.elapsed(),
                );
            }

            Ok(res)
        })
    }
}
