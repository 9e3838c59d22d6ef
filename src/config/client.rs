//! Settings for the outbound signed client.
//!
//! Each remote service gets its own variable prefix, e.g. `APPS_AUTH` reads
//! `APPS_AUTH_DOMAIN`, `APPS_AUTH_CLIENT_ID` and `APPS_AUTH_PRIVATE_KEY`.

use crate::error::SignerError;
use std::env;

/// Connection and credential settings for one remote service.
#[derive(Clone)]
pub struct ClientSettings {
    /// Base URL requests are sent to, without a trailing slash.
    pub domain: String,
    pub client_id: String,
    pub private_key: String,
    /// Whole-request timeout in seconds.
    pub timeout_seconds: u64,
}

impl ClientSettings {
    pub fn new(
        domain: impl Into<String>,
        client_id: impl Into<String>,
        private_key: impl Into<String>,
    ) -> Self {
        Self {
            domain: domain.into().trim_end_matches('/').to_string(),
            client_id: client_id.into(),
            private_key: private_key.into(),
            timeout_seconds: 30,
        }
    }

    /// Load `<PREFIX>_DOMAIN`, `<PREFIX>_CLIENT_ID` and `<PREFIX>_PRIVATE_KEY`.
    ///
    /// `<PREFIX>_TIMEOUT_SECONDS` is optional and defaults to 30.
    pub fn from_env(prefix: &str) -> Result<Self, SignerError> {
        let domain = required(prefix, "DOMAIN")?;
        let client_id = required(prefix, "CLIENT_ID")?;
        let private_key = required(prefix, "PRIVATE_KEY")?;

        let mut settings = Self::new(domain, client_id, private_key);
        settings.timeout_seconds = env::var(format!("{prefix}_TIMEOUT_SECONDS"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(settings.timeout_seconds);
        Ok(settings)
    }
}

fn required(prefix: &str, name: &str) -> Result<String, SignerError> {
    let var = format!("{prefix}_{name}");
    env::var(&var)
        .ok()
        .filter(|value| !value.is_empty())
        .ok_or_else(|| SignerError::configuration(format!("Settings must contain a `{var}` attribute")))
}

impl std::fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSettings")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("private_key", &"[REDACTED]")
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}
