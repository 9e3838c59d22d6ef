//! Signature verification configuration.

use crate::{
    error::SignerError,
    models::credential::CredentialTransport,
    services::credentials::{ClientRegistry, CredentialLookup, StaticCredentials},
};
use std::{env, path::PathBuf, sync::Arc};
use tracing::info;

/// Configuration for verifying signed requests
#[derive(Clone)]
pub struct SignerConfig {
    /// Let requests through even when verification fails. Off by default.
    pub allow_unsigned: bool,
    pub transport: CredentialTransport,
    /// Retry a failed comparison against the percent-decoded URL.
    pub unquote_retry: bool,
    /// Static `client_id -> private_key` mapping.
    pub api_keys: Option<StaticCredentials>,
    /// JSON file holding provisioned clients.
    pub clients_file: Option<PathBuf>,
}

impl Default for SignerConfig {
    fn default() -> Self {
        Self {
            allow_unsigned: false,
            transport: CredentialTransport::QueryParams,
            unquote_retry: true,
            api_keys: None,
            clients_file: None,
        }
    }
}

impl SignerConfig {
    /// Load configuration from environment variables, falling back to defaults
    ///
    /// Malformed values are configuration errors.
    pub fn from_env() -> Result<Self, SignerError> {
        let allow_unsigned = env_flag("REQUEST_SIGNER_ALLOW_UNSIGNED", false)?;
        let unquote_retry = env_flag("REQUEST_SIGNER_UNQUOTE_RETRY", true)?;

        let transport = match env::var("REQUEST_SIGNER_TRANSPORT") {
            Ok(value) => value
                .parse::<CredentialTransport>()
                .map_err(SignerError::configuration)?,
            Err(_) => CredentialTransport::default(),
        };

        let api_keys = env::var("REQUEST_SIGNER_API_KEYS")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(|value| StaticCredentials::from_json(&value))
            .transpose()?;

        let clients_file = env::var("REQUEST_SIGNER_CLIENTS_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            allow_unsigned,
            transport,
            unquote_retry,
            api_keys,
            clients_file,
        })
    }

    /// Build the configured credential store.
    ///
    /// Static API keys win over a clients file. Having neither is an error.
    pub fn credential_lookup(&self) -> Result<Arc<dyn CredentialLookup>, SignerError> {
        if let Some(keys) = self.api_keys.as_ref().filter(|keys| !keys.is_empty()) {
            info!(clients = keys.len(), "Using static API keys for signature verification");
            return Ok(Arc::new(keys.clone()));
        }

        if let Some(path) = &self.clients_file {
            info!(path = %path.display(), "Using client registry for signature verification");
            return Ok(Arc::new(ClientRegistry::load(path)?));
        }

        Err(SignerError::configuration(
            "either REQUEST_SIGNER_API_KEYS or REQUEST_SIGNER_CLIENTS_FILE must be set",
        ))
    }
}

fn env_flag(name: &str, default: bool) -> Result<bool, SignerError> {
    match env::var(name) {
        Err(_) => Ok(default),
        Ok(value) => match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            other => Err(SignerError::configuration(format!(
                "{name} must be true or false, got `{other}`"
            ))),
        },
    }
}
