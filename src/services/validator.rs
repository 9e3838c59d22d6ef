//! Server-side verification of signed requests.
//!
//! [`SignatureValidator::validate`] runs the verification steps in order:
//!
//! 1. extract the client id and signature (query or headers)
//! 2. resolve the client's credential
//! 3. strip the signature from the URL and pick the payload to sign
//! 4. recompute and compare in constant time
//! 5. optionally retry against the percent-decoded URL
//!
//! Every failure maps to a [`RejectionReason`] that is only ever logged.

use crate::{
    constants::{
        CLIENT_ID_HEADER_NAME, CLIENT_ID_PARAM_NAME, SIGNATURE_HEADER_NAME, SIGNATURE_PARAM_NAME,
    },
    error::RejectionReason,
    models::{
        audit::SignatureOutcome,
        credential::CredentialTransport,
        payload::{FormData, Payload},
    },
    services::credentials::CredentialLookup,
    utils::{
        encoding::{query_pairs, split_url, strip_query_param, unquote},
        hmac::SignatureMaker,
    },
};
use std::{fmt, sync::Arc};
use tracing::{debug, error, warn};

/// Content types whose bodies are signed as raw bytes.
const RAW_BODY_CONTENT_TYPES: &[&str] = &["application/json", "application/vnd.api+json"];

/// Framework-independent view of an inbound request.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub method: String,
    /// Path and query exactly as received.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl InboundRequest {
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn with_body(mut self, content_type: &str, body: impl Into<Vec<u8>>) -> Self {
        self.headers
            .push(("Content-Type".to_string(), content_type.to_string()));
        self.body = body.into();
        self
    }

    /// First header with this name, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Media type without parameters, lowercased.
    pub fn media_type(&self) -> Option<String> {
        self.header("Content-Type").map(|value| {
            value
                .split(';')
                .next()
                .unwrap_or(value)
                .trim()
                .to_ascii_lowercase()
        })
    }

    /// First value of a query parameter, decoded.
    pub fn query_param(&self, name: &str) -> Option<String> {
        let (_, query) = split_url(&self.url);
        query_pairs(query)
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// The payload the client signed.
    ///
    /// JSON bodies are taken verbatim. Other bodies are parsed as form
    /// fields, and an empty body contributes nothing.
    pub fn payload(&self) -> Payload {
        let is_raw = self
            .media_type()
            .is_some_and(|media| RAW_BODY_CONTENT_TYPES.contains(&media.as_str()));

        if is_raw {
            Payload::Raw(self.body.clone())
        } else if self.body.is_empty() {
            Payload::Empty
        } else {
            Payload::Form(FormData::parse(&self.body))
        }
    }
}

impl CredentialTransport {
    /// Pull `(client_id, signature)` out of the request.
    ///
    /// Either value missing or empty means the request is unsigned.
    pub fn extract(&self, request: &InboundRequest) -> Option<(String, String)> {
        let (client_id, signature) = match self {
            CredentialTransport::QueryParams => (
                request.query_param(CLIENT_ID_PARAM_NAME),
                request.query_param(SIGNATURE_PARAM_NAME),
            ),
            CredentialTransport::Headers => (
                request.header(CLIENT_ID_HEADER_NAME).map(str::to_string),
                request.header(SIGNATURE_HEADER_NAME).map(str::to_string),
            ),
        };

        match (client_id, signature) {
            (Some(id), Some(sig)) if !id.is_empty() && !sig.is_empty() => Some((id, sig)),
            _ => None,
        }
    }
}

/// The client a request was verified for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedClient {
    pub client_id: String,
    /// The signature only matched once the URL was percent-decoded.
    pub unescaped_match: bool,
}

/// Result of validating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Signature checked out.
    Valid(VerifiedClient),
    /// Verification failed but unsigned requests are allowed.
    Unsigned(RejectionReason),
    Rejected(RejectionReason),
}

impl Verdict {
    /// Whether the request may proceed to the handler.
    pub fn is_accepted(&self) -> bool {
        !matches!(self, Verdict::Rejected(_))
    }

    pub fn client(&self) -> Option<&VerifiedClient> {
        match self {
            Verdict::Valid(client) => Some(client),
            _ => None,
        }
    }

    pub fn reason(&self) -> Option<RejectionReason> {
        match self {
            Verdict::Valid(_) => None,
            Verdict::Unsigned(reason) | Verdict::Rejected(reason) => Some(*reason),
        }
    }

    pub fn outcome(&self) -> SignatureOutcome {
        match self {
            Verdict::Valid(_) => SignatureOutcome::Valid,
            Verdict::Unsigned(_) => SignatureOutcome::Unsigned,
            Verdict::Rejected(_) => SignatureOutcome::Rejected,
        }
    }
}

/// Notified after every `Valid` verdict.
pub trait SignedRequestObserver: Send + Sync {
    fn on_valid_signature(
        &self,
        validator: &SignatureValidator,
        request: &InboundRequest,
        client: &VerifiedClient,
    );
}

/// Verifies inbound requests against a credential store.
pub struct SignatureValidator {
    credentials: Arc<dyn CredentialLookup>,
    transport: CredentialTransport,
    allow_unsigned: bool,
    unquote_retry: bool,
    observers: Vec<Arc<dyn SignedRequestObserver>>,
}

impl SignatureValidator {
    /// Query-parameter transport, unsigned requests refused, unquote retry on.
    pub fn new(credentials: Arc<dyn CredentialLookup>) -> Self {
        Self {
            credentials,
            transport: CredentialTransport::QueryParams,
            allow_unsigned: false,
            unquote_retry: true,
            observers: Vec::new(),
        }
    }

    pub fn with_transport(mut self, transport: CredentialTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_allow_unsigned(mut self, allow_unsigned: bool) -> Self {
        self.allow_unsigned = allow_unsigned;
        self
    }

    pub fn with_unquote_retry(mut self, unquote_retry: bool) -> Self {
        self.unquote_retry = unquote_retry;
        self
    }

    pub fn with_observer(mut self, observer: Arc<dyn SignedRequestObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    pub fn transport(&self) -> CredentialTransport {
        self.transport
    }

    pub fn allows_unsigned(&self) -> bool {
        self.allow_unsigned
    }

    /// Validate `request` and notify observers if it is `Valid`.
    pub async fn validate(&self, request: &InboundRequest) -> Verdict {
        match self.check(request).await {
            Ok(client) => {
                for observer in &self.observers {
                    observer.on_valid_signature(self, request, &client);
                }
                Verdict::Valid(client)
            }
            Err(reason) if self.allow_unsigned => {
                debug!(%reason, "Allowing request without a valid signature");
                Verdict::Unsigned(reason)
            }
            Err(reason) => Verdict::Rejected(reason),
        }
    }

    async fn check(&self, request: &InboundRequest) -> Result<VerifiedClient, RejectionReason> {
        let (client_id, signature) = self
            .transport
            .extract(request)
            .ok_or(RejectionReason::MissingCredentials)?;

        let credential = match self.credentials.resolve(&client_id).await {
            Ok(Some(credential)) => credential,
            Ok(None) => return Err(RejectionReason::UnknownClient),
            Err(e) => {
                error!(client_id = %client_id, error = %e, "Credential lookup failed");
                return Err(RejectionReason::UnknownClient);
            }
        };

        let signer = SignatureMaker::new(&credential.private_key).map_err(|e| {
            error!(client_id = %client_id, error = %e, "Stored private key is unusable");
            RejectionReason::UnknownClient
        })?;

        let url = strip_query_param(&request.url, SIGNATURE_PARAM_NAME);
        let payload = request.payload();

        if signer.verify(&url, &payload, &signature) {
            return Ok(VerifiedClient {
                client_id,
                unescaped_match: false,
            });
        }

        if self.unquote_retry {
            let unquoted = unquote(&url);
            if unquoted != url && signer.verify(&unquoted, &payload, &signature) {
                warn!(
                    client_id = %client_id,
                    method = %request.method,
                    "Signature matched only after percent-decoding the URL"
                );
                return Ok(VerifiedClient {
                    client_id,
                    unescaped_match: true,
                });
            }
        }

        Err(RejectionReason::SignatureMismatch)
    }
}

impl fmt::Debug for SignatureValidator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureValidator")
            .field("transport", &self.transport)
            .field("allow_unsigned", &self.allow_unsigned)
            .field("unquote_retry", &self.unquote_retry)
            .field("observers", &self.observers.len())
            .finish_non_exhaustive()
    }
}
