//! Configuration structures and loading utilities.
//!
//! Everything is read from environment variables with defaults, see each
//! type's `from_env`.

pub mod client;
pub mod server;
pub mod signer;

pub use client::*;
pub use server::*;
pub use signer::*;

/// Serializes tests that modify environment variables.
#[cfg(test)]
pub(crate) static ENV_MUTEX: std::sync::Mutex<()> = std::sync::Mutex::new(());
