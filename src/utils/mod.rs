//! Utility functions and helper modules.
//!
//! Canonical encoding and HMAC signing live here, together with the request
//! helpers and log redaction shared by the middleware.

pub mod encoding;
pub mod hmac;
pub mod http;
pub mod redact;

pub use encoding::*;
pub use hmac::*;
pub use http::*;
pub use redact::*;
