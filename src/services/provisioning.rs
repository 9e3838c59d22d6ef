//! Client provisioning: key generation and registry updates.

use crate::{error::SignerError, models::credential::AuthorizedClient, services::credentials::ClientRegistry};
use base64::{Engine as _, engine::general_purpose::URL_SAFE};
use rand::{RngCore, rngs::OsRng};
use std::path::Path;

/// Length in bytes of a generated private key.
pub const PRIVATE_KEY_BYTES: usize = 32;

/// Generate a new private key from the operating system's CSPRNG.
///
/// The key is base64url encoded with padding, 44 characters long.
pub fn create_private_key() -> String {
    let mut key = [0u8; PRIVATE_KEY_BYTES];
    OsRng.fill_bytes(&mut key);
    URL_SAFE.encode(key)
}

/// Add a client to the registry file at `store`, creating the file if needed.
///
/// Returns the stored client, including its private key.
pub fn provision_client(
    store: impl AsRef<Path>,
    client_id: &str,
    private_key: Option<&str>,
) -> Result<AuthorizedClient, SignerError> {
    let registry = ClientRegistry::load(store)?;
    let client = registry.create_client(client_id, private_key)?;
    registry.save()?;
    Ok(client)
}
