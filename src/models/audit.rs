//! Audit logging data structures and types.

use crate::utils::redact_sensitive_data;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// Outcome of signature verification for audit logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SignatureOutcome {
    Valid,
    Unsigned,
    Rejected,
}

impl SignatureOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Valid => "valid",
            Self::Unsigned => "unsigned",
            Self::Rejected => "rejected",
        }
    }
}

/// Structured audit log entry for a verified (or refused) request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignatureAuditEvent {
    pub outcome: SignatureOutcome,
    pub timestamp: DateTime<Utc>,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub client_id: Option<String>,
    pub method: String,
    /// Request path and query, with the signature redacted.
    pub endpoint: String,
    pub request_id: Option<String>,
    pub reason: Option<String>,
    pub unescaped_match: bool,
}

impl SignatureAuditEvent {
    /// Create a new audit event with basic information
    pub fn new(outcome: SignatureOutcome, ip_address: String, method: String, endpoint: &str) -> Self {
        Self {
            outcome,
            timestamp: Utc::now(),
            ip_address,
            user_agent: None,
            client_id: None,
            method,
            endpoint: redact_sensitive_data(endpoint),
            request_id: None,
            reason: None,
            unescaped_match: false,
        }
    }

    pub fn with_user_agent(mut self, user_agent: Option<String>) -> Self {
        self.user_agent = user_agent;
        self
    }

    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = client_id;
        self
    }

    pub fn with_request_id(mut self, request_id: Option<String>) -> Self {
        self.request_id = request_id;
        self
    }

    pub fn with_reason(mut self, reason: Option<String>) -> Self {
        self.reason = reason;
        self
    }

    pub fn with_unescaped_match(mut self, unescaped_match: bool) -> Self {
        self.unescaped_match = unescaped_match;
        self
    }

    /// Log the audit event using structured logging
    pub fn log(&self) {
        match self.outcome {
            SignatureOutcome::Rejected => warn!(
                target: "signature_audit",
                outcome = self.outcome.as_str(),
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                client_id = ?self.client_id,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                reason = ?self.reason,
                "Signed request rejected"
            ),
            _ => info!(
                target: "signature_audit",
                outcome = self.outcome.as_str(),
                timestamp = %self.timestamp,
                ip_address = %self.ip_address,
                user_agent = ?self.user_agent,
                client_id = ?self.client_id,
                method = %self.method,
                endpoint = %self.endpoint,
                request_id = ?self.request_id,
                reason = ?self.reason,
                unescaped_match = self.unescaped_match,
                "Signed request accepted"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_is_redacted() {
        let event = SignatureAuditEvent::new(
            SignatureOutcome::Rejected,
            "127.0.0.1".to_string(),
            "GET".to_string(),
            "/api/signed/sample?__client_id=apps&__signature=abc",
        )
        .with_reason(Some("signature_mismatch".to_string()));

        assert_eq!(
            event.endpoint,
            "/api/signed/sample?__client_id=apps&__signature=[REDACTED]"
        );
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["outcome"], "rejected");
        assert_eq!(json["reason"], "signature_mismatch");
    }
}
