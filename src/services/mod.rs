//! Business logic and service layer modules.
//!
//! Credential stores, the server-side validator, the client-side request
//! builder and signed client, provisioning, and metrics collection.

pub mod client;
pub mod credentials;
pub mod metrics;
pub mod provisioning;
pub mod request_builder;
pub mod validator;

pub use client::*;
pub use credentials::*;
pub use metrics::*;
pub use provisioning::*;
pub use request_builder::*;
pub use validator::*;
