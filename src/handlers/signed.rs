//! Sample endpoint behind signature verification.

use crate::{models::SignedSampleResponse, services::validator::VerifiedClient};
use actix_web::{Error, HttpMessage, HttpRequest, Result, web};
use paperclip::actix::api_v2_operation;

/// Signed sample endpoint
///
/// Echoes who the request was verified for. `client_id` is absent only when
/// unsigned requests are allowed and this one was not signed.
#[api_v2_operation(
    summary = "Signed Sample Endpoint",
    description = "Requires `__client_id` and `__signature` query parameters (or the X-Auth-Client-Id and X-Auth-Signature headers). The signature is the base64url HMAC-SHA256 of the path, the canonical query and the canonical body. Any verification failure returns a bare 400.",
    tags("Signed"),
    responses(
        (status = 200, description = "Request verified", body = SignedSampleResponse),
        (status = 400, description = "Missing, unknown or invalid signature")
    )
)]
pub async fn signed_sample(req: HttpRequest) -> Result<web::Json<SignedSampleResponse>, Error> {
    let client = req.extensions().get::<VerifiedClient>().cloned();

    Ok(web::Json(SignedSampleResponse {
        client_id: client.as_ref().map(|c| c.client_id.clone()),
        unescaped_match: client.is_some_and(|c| c.unescaped_match),
        method: req.method().to_string(),
        path: req.path().to_string(),
    }))
}
