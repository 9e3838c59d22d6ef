//! Credential lookup: mapping a client id to the key it signs with.
//!
//! The validator only sees the [`CredentialLookup`] trait. Two stores ship
//! with the crate: a static mapping configured at startup and a
//! [`ClientRegistry`] of provisioned clients persisted as JSON.

use crate::{
    error::SignerError,
    models::credential::{AuthorizedClient, Credential},
    utils::hmac::SignatureMaker,
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, HashMap},
    fs,
    path::{Path, PathBuf},
    sync::{PoisonError, RwLock},
};
use tracing::{debug, info};

/// Resolves client ids to signing credentials.
///
/// Called at most once per validated request. Unknown and inactive clients
/// both resolve to `Ok(None)`; `Err` is reserved for a store that could not
/// answer.
#[async_trait]
pub trait CredentialLookup: Send + Sync {
    async fn resolve(&self, client_id: &str) -> Result<Option<Credential>, SignerError>;
}

/// Fixed `client_id -> private_key` mapping.
#[derive(Debug, Default, Clone)]
pub struct StaticCredentials {
    keys: HashMap<String, String>,
}

impl StaticCredentials {
    pub fn new<I, K, V>(keys: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// Parse a JSON object of client ids to private keys.
    pub fn from_json(json: &str) -> Result<Self, SignerError> {
        let keys: HashMap<String, String> = serde_json::from_str(json).map_err(|e| {
            SignerError::configuration(format!("API keys must be a JSON object of strings: {e}"))
        })?;
        Ok(Self { keys })
    }

    pub fn insert(&mut self, client_id: impl Into<String>, private_key: impl Into<String>) {
        self.keys.insert(client_id.into(), private_key.into());
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }
}

#[async_trait]
impl CredentialLookup for StaticCredentials {
    async fn resolve(&self, client_id: &str) -> Result<Option<Credential>, SignerError> {
        Ok(self
            .keys
            .get(client_id)
            .map(|key| Credential::new(client_id, key)))
    }
}

/// Provisioned clients, optionally backed by a JSON file.
///
/// Clients are never removed; revoking access deactivates them.
#[derive(Debug, Default)]
pub struct ClientRegistry {
    clients: RwLock<BTreeMap<String, AuthorizedClient>>,
    path: Option<PathBuf>,
}

impl ClientRegistry {
    /// An empty, in-memory registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the registry stored at `path`.
    ///
    /// A missing file yields an empty registry that will be written to
    /// `path` on the next [`save`](Self::save).
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SignerError> {
        let path = path.as_ref();
        let clients = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let list: Vec<AuthorizedClient> = serde_json::from_str(&contents).map_err(|e| {
                SignerError::configuration(format!(
                    "client registry {} is not valid: {e}",
                    path.display()
                ))
            })?;
            list.into_iter()
                .map(|client| (client.client_id.clone(), client))
                .collect()
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), clients = clients.len(), "Loaded client registry");

        Ok(Self {
            clients: RwLock::new(clients),
            path: Some(path.to_path_buf()),
        })
    }

    /// Write the registry back to the file it was loaded from.
    pub fn save(&self) -> Result<(), SignerError> {
        let path = self.path.as_deref().ok_or_else(|| {
            SignerError::configuration("client registry has no backing file")
        })?;
        self.save_to(path)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SignerError> {
        let json = serde_json::to_string_pretty(&self.clients())?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Register a new active client.
    ///
    /// A supplied key must decode; without one a fresh key is generated.
    pub fn create_client(
        &self,
        client_id: &str,
        private_key: Option<&str>,
    ) -> Result<AuthorizedClient, SignerError> {
        if client_id.trim().is_empty() {
            return Err(SignerError::configuration("Client is required."));
        }

        let private_key = match private_key {
            Some(key) => {
                SignatureMaker::new(key)?;
                key.to_string()
            }
            None => super::provisioning::create_private_key(),
        };

        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        if clients.contains_key(client_id) {
            return Err(SignerError::DuplicateClient {
                client_id: client_id.to_string(),
            });
        }

        let client = AuthorizedClient::new(client_id, private_key);
        clients.insert(client_id.to_string(), client.clone());
        info!(client_id, "Created authorized client");
        Ok(client)
    }

    /// Revoke a client without deleting it.
    pub fn deactivate(&self, client_id: &str) -> Result<(), SignerError> {
        let mut clients = self.clients.write().unwrap_or_else(PoisonError::into_inner);
        let client = clients
            .get_mut(client_id)
            .ok_or_else(|| SignerError::UnknownClient {
                client_id: client_id.to_string(),
            })?;
        client.deactivate();
        info!(client_id, "Deactivated authorized client");
        Ok(())
    }

    /// The client with this id, if it exists and is active.
    pub fn get_by_client(&self, client_id: &str) -> Option<AuthorizedClient> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(client_id)
            .filter(|client| client.is_active)
            .cloned()
    }

    /// Every client, active or not, ordered by id.
    pub fn clients(&self) -> Vec<AuthorizedClient> {
        self.clients
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl CredentialLookup for ClientRegistry {
    async fn resolve(&self, client_id: &str) -> Result<Option<Credential>, SignerError> {
        Ok(self
            .get_by_client(client_id)
            .and_then(|client| client.credential()))
    }
}
