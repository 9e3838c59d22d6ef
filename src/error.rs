//! Error types for signing, verification and credential administration.

use std::fmt;
use thiserror::Error;

/// Main error type for the request signer.
#[derive(Error, Debug)]
pub enum SignerError {
    /// The private key is missing or is not valid base64url.
    #[error("Invalid private key: {message}")]
    InvalidKey { message: String },

    /// Settings are missing or malformed.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// The credential store failed to answer a lookup.
    #[error("Credential store error: {message}")]
    CredentialStore { message: String },

    /// A payload shape that has no deterministic form encoding.
    #[error("Payload cannot be canonicalized: {message}")]
    EncodingAmbiguity { message: String },

    /// The HTTP method is not one a signed request can be built for.
    #[error("HTTP method not allowed: {method}")]
    MethodNotAllowed { method: String },

    /// A client with the same id already exists in the registry.
    #[error("Client already exists: {client_id}")]
    DuplicateClient { client_id: String },

    /// No client with this id exists in the registry.
    #[error("Unknown client: {client_id}")]
    UnknownClient { client_id: String },

    /// I/O errors.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SignerError {
    pub(crate) fn invalid_key(message: impl Into<String>) -> Self {
        Self::InvalidKey {
            message: message.into(),
        }
    }

    pub(crate) fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }
}

/// Why an inbound request failed verification.
///
/// Only ever logged. Callers see a uniform 400 regardless of the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectionReason {
    /// Signature or client id absent from the request.
    MissingCredentials,
    /// The client id is unknown or the client is inactive.
    UnknownClient,
    /// The recomputed signature differs from the one received.
    SignatureMismatch,
}

impl RejectionReason {
    /// Stable label for logs and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredentials => "missing_credentials",
            Self::UnknownClient => "unknown_client",
            Self::SignatureMismatch => "signature_mismatch",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
