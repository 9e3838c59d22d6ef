//! HTTP request handlers for API endpoints.
//!
//! Health, version and metrics are open; everything under `/api/signed`
//! passes through signature verification first.

pub mod health;
pub mod metrics;
pub mod openapi;
pub mod signed;
pub mod version;

pub use health::*;
pub use metrics::*;
pub use openapi::*;
pub use signed::*;
pub use version::*;
