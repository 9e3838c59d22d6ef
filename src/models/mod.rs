//! Data models for the request signer.
//!
//! Payload shapes accepted for signing, client credentials, audit events and
//! the response bodies of the demo endpoints.

pub mod api;
pub mod audit;
pub mod credential;
pub mod payload;

pub use api::*;
pub use audit::*;
pub use credential::*;
pub use payload::*;
