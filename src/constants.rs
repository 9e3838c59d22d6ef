//! Parameter and header names shared by signers and validators.

/// Query parameter carrying the signature. Always the last parameter.
pub const SIGNATURE_PARAM_NAME: &str = "__signature";

/// Query parameter carrying the client id.
pub const CLIENT_ID_PARAM_NAME: &str = "__client_id";

pub const CLIENT_ID_HEADER_NAME: &str = "X-Auth-Client-Id";

pub const SIGNATURE_HEADER_NAME: &str = "X-Auth-Signature";
