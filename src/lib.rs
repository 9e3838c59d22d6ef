//! Request Signer - HMAC-SHA256 signed HTTP requests
//!
//! Clients embed their id and a signature over the request's URL, query and
//! body; the server recomputes the signature from the same canonical inputs
//! and accepts the request only on an exact, constant-time match.
//!
//! ## Architecture
//!
//! - `utils/` - canonical encoding, HMAC signing, request helpers
//! - `models/` - payload shapes, credentials, audit events, API responses
//! - `services/` - credential stores, validator, request builder, signed client
//! - `middleware/` - actix middleware enforcing signatures on protected routes
//! - `handlers/` - demo endpoints and the app factory
//! - `config/` - environment-driven configuration
//!
//! ## Quick Start
//!
//! ```
//! use request_signer::{FormData, SignedRequestFactory};
//!
//! let factory = SignedRequestFactory::new(
//!     "POST",
//!     "apps-testclient",
//!     "oVB_b3qrP3R6IDApALqehQzFy3DpMfob6Y4627WEK5A=",
//! )?;
//! let request = factory.create_request(
//!     "http://localhost:8080/api/signed/sample",
//!     &FormData::from([("name", "value")]),
//! )?;
//! assert!(request.url.contains("__signature="));
//! # Ok::<(), request_signer::SignerError>(())
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod utils;

// Re-export commonly used types and functions for convenience
pub use config::{ClientSettings, ServerConfig, SignerConfig};
pub use error::{RejectionReason, SignerError};
pub use handlers::{create_app, create_openapi_spec, get_metrics, health, signed_sample, version};
pub use middleware::{MetricsMiddleware, RequestId, RequestIdMiddleware, SignatureRequired};
pub use models::{
    AuthorizedClient, Credential, CredentialTransport, FieldValue, FormData, Payload,
    SignatureAuditEvent, SignatureOutcome,
};
pub use services::{
    ApiResponse, AppMetrics, ClientError, ClientRegistry, ContentType, CredentialLookup,
    InboundRequest, SignatureValidator, SignedClient, SignedRequest, SignedRequestFactory,
    SignedRequestObserver, StaticCredentials, Verdict, VerifiedClient, create_private_key,
    provision_client,
};
pub use utils::{SignatureMaker, encode_form, get_signature, signatures_match};
