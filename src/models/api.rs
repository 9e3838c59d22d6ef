//! API response models for standard endpoints.

use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Serialize};

/// Response model for the health check endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct HealthResponse {
    pub status: String,
}

/// Response model for the version information endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct VersionResponse {
    pub version: String,
    pub commit: String,
    pub build_time: String,
}

/// Response model for the signed sample endpoint
#[derive(Clone, Serialize, Deserialize, Apiv2Schema)]
pub struct SignedSampleResponse {
    /// Client the request was verified for, absent for unsigned requests
    pub client_id: Option<String>,
    /// True when only the percent-decoded URL matched the signature
    pub unescaped_match: bool,
    pub method: String,
    pub path: String,
}
