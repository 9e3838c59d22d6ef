//! Custom middleware implementations for the API.
//!
//! Signature verification, request IDs and metrics collection.

pub mod metrics;
pub mod request_id;
pub mod signature;

pub use metrics::*;
pub use request_id::*;
pub use signature::*;
