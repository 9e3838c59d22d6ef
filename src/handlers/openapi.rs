//! OpenAPI specification generation and app factory.

use crate::{
    handlers::{get_metrics, health, signed_sample, version},
    middleware::{MetricsMiddleware, RequestIdMiddleware, SignatureRequired},
    services::{AppMetrics, validator::SignatureValidator},
};
use actix_web::{App, body::MessageBody};
use paperclip::actix::{OpenApiExt, web};
use paperclip::v2::models::{DefaultApiRaw, Info};
use std::sync::Arc;

/// Path prefix of the routes that require a signature.
pub const SIGNED_SCOPE: &str = "/api/signed";

/// Creates the shared OpenAPI specification for the API
pub fn create_openapi_spec() -> DefaultApiRaw {
    DefaultApiRaw {
        info: Info {
            title: "Request Signer".into(),
            version: env!("CARGO_PKG_VERSION").into(),
            description: Some(
                "HMAC-SHA256 signed requests between known clients and this server.\n\n\
                ## Signing\n\
                1. Append `__client_id=<id>` to the query string\n\
                2. Canonicalize the query: decode pairs, drop blank values, sort keys and values, re-encode\n\
                3. Canonicalize form bodies the same way; JSON bodies are used as sent\n\
                4. `signature = base64url(HMAC-SHA256(key, path + \"?\" + query + body))`\n\
                5. Append `__signature=<signature>` as the last query parameter\n\
                \n\
                With header transport (`REQUEST_SIGNER_TRANSPORT=headers`) the client id and signature \
                travel in `X-Auth-Client-Id` and `X-Auth-Signature` instead.\n\
                \n\
                Routes under `/api/signed` answer `400 Bad Request` for any verification failure."
                    .into(),
            ),
            ..Default::default()
        },
        ..Default::default()
    }
}

/// Creates the application with signature verification on `/api/signed`
///
/// Used by the server binary and by the integration tests.
pub fn create_app(
    validator: Arc<SignatureValidator>,
    metrics: AppMetrics,
) -> App<
    impl actix_web::dev::ServiceFactory<
        actix_web::dev::ServiceRequest,
        Config = (),
        Response = actix_web::dev::ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .wrap(SignatureRequired::new(validator).protect(SIGNED_SCOPE))
        .wrap(MetricsMiddleware)
        .wrap(RequestIdMiddleware)
        .wrap_api_with_spec(create_openapi_spec())
        .app_data(web::Data::new(metrics))
        .service(web::resource("/api/health").route(web::get().to(health)))
        .service(web::resource("/api/version").route(web::get().to(version)))
        .service(web::resource("/api/metrics").route(web::get().to(get_metrics)))
        .service(
            web::resource("/api/signed/sample")
                .route(web::get().to(signed_sample))
                .route(web::post().to(signed_sample))
                .route(web::put().to(signed_sample))
                .route(web::patch().to(signed_sample))
                .route(web::delete().to(signed_sample)),
        )
        .with_json_spec_at("/api/spec/v2")
        .build()
}
