//! Client credentials: the shared secrets that requests are signed with.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a request carries its client id and signature.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialTransport {
    /// `__client_id` and `__signature` query parameters.
    #[default]
    QueryParams,
    /// `X-Auth-Client-Id` and `X-Auth-Signature` headers.
    Headers,
}

impl std::str::FromStr for CredentialTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "query" | "query_params" => Ok(Self::QueryParams),
            "headers" | "header" => Ok(Self::Headers),
            other => Err(format!("unknown credential transport `{other}`")),
        }
    }
}

/// A client id and the private key it signs with.
///
/// This is what a credential lookup hands to the validator.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub client_id: String,
    pub private_key: String,
}

impl Credential {
    pub fn new(client_id: impl Into<String>, private_key: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            private_key: private_key.into(),
        }
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("client_id", &self.client_id)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// A registered client as persisted by the client registry.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizedClient {
    pub client_id: String,
    pub private_key: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created: DateTime<Utc>,
    pub updated: DateTime<Utc>,
}

fn default_active() -> bool {
    true
}

impl AuthorizedClient {
    /// A new, active client.
    pub fn new(client_id: impl Into<String>, private_key: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            client_id: client_id.into(),
            private_key: private_key.into(),
            is_active: true,
            created: now,
            updated: now,
        }
    }

    /// Stop accepting signatures from this client.
    pub fn deactivate(&mut self) {
        self.is_active = false;
        self.updated = Utc::now();
    }

    /// The signing credential, or `None` while the client is inactive.
    pub fn credential(&self) -> Option<Credential> {
        self.is_active
            .then(|| Credential::new(&self.client_id, &self.private_key))
    }
}

impl fmt::Debug for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthorizedClient")
            .field("client_id", &self.client_id)
            .field("private_key", &"[REDACTED]")
            .field("is_active", &self.is_active)
            .field("created", &self.created)
            .field("updated", &self.updated)
            .finish()
    }
}

impl fmt::Display for AuthorizedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.client_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deactivated_client_has_no_credential() {
        let mut client = AuthorizedClient::new("apps-testclient", "YQ==");
        assert_eq!(
            client.credential(),
            Some(Credential::new("apps-testclient", "YQ=="))
        );

        client.deactivate();
        assert!(!client.is_active);
        assert!(client.updated >= client.created);
        assert_eq!(client.credential(), None);
    }

    #[test]
    fn test_debug_output_hides_key() {
        let client = AuthorizedClient::new("apps-testclient", "super-secret-key");
        assert!(!format!("{client:?}").contains("super-secret-key"));
        assert!(!format!("{:?}", Credential::new("c", "super-secret-key")).contains("super-secret-key"));
        assert_eq!(client.to_string(), "apps-testclient");
    }

    #[test]
    fn test_transport_parsing() {
        assert_eq!("query".parse(), Ok(CredentialTransport::QueryParams));
        assert_eq!(" Headers ".parse(), Ok(CredentialTransport::Headers));
        assert!("cookie".parse::<CredentialTransport>().is_err());
    }

    #[test]
    fn test_missing_is_active_defaults_to_true() {
        let json = r#"{"client_id":"c","private_key":"YQ==","created":"2024-01-01T00:00:00Z","updated":"2024-01-01T00:00:00Z"}"#;
        let client: AuthorizedClient = serde_json::from_str(json).unwrap();
        assert!(client.is_active);
    }
}
