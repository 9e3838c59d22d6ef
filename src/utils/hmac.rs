//! HMAC-SHA256 request signatures.
//!
//! A signature is `base64url(HMAC-SHA256(key, signable_url + payload))`, where
//! `signable_url` is the request path plus its canonical query and `payload`
//! is the canonical form encoding of the body (or the raw body for JSON).

use crate::{
    error::SignerError,
    models::payload::Payload,
    utils::encoding::{encode_payload, signable_url},
};
use base64::{
    Engine as _, alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig, general_purpose::URL_SAFE},
};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Private keys are issued padded, but hand-copied keys often lose padding.
const KEY_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Decode a base64url private key into HMAC key bytes.
///
/// Standard-alphabet keys (`+`, `/`) are accepted as well.
pub fn decode_private_key(private_key: &str) -> Result<Vec<u8>, SignerError> {
    let trimmed = private_key.trim();
    if trimmed.is_empty() {
        return Err(SignerError::invalid_key("Private key is required."));
    }

    let normalized = trimmed.replace('+', "-").replace('/', "_");
    KEY_ENGINE
        .decode(normalized)
        .map_err(|e| SignerError::invalid_key(format!("not valid base64url: {e}")))
}

/// Computes and checks signatures for one private key.
#[derive(Clone)]
pub struct SignatureMaker {
    mac: HmacSha256,
}

impl SignatureMaker {
    /// Build a signer from a base64url private key.
    ///
    /// Fails with [`SignerError::InvalidKey`] if the key is empty or does not
    /// decode.
    pub fn new(private_key: &str) -> Result<Self, SignerError> {
        let key = decode_private_key(private_key)?;
        let mac = HmacSha256::new_from_slice(&key)
            .map_err(|e| SignerError::invalid_key(e.to_string()))?;
        Ok(Self { mac })
    }

    /// Sign `url` together with `payload`.
    ///
    /// Any `__signature` already present in the query or in form data is
    /// ignored, so re-signing an already signed request yields the same value.
    pub fn create_signature(&self, url: &str, payload: &Payload) -> String {
        let mut mac = self.mac.clone();
        mac.update(signable_url(url).as_bytes());
        match payload {
            Payload::Empty => {}
            Payload::Form(data) => mac.update(encode_payload(data).as_bytes()),
            Payload::Raw(body) => mac.update(body),
        }
        URL_SAFE.encode(mac.finalize().into_bytes())
    }

    /// Check `signature` against the one computed for `url` and `payload`.
    pub fn verify(&self, url: &str, payload: &Payload, signature: &str) -> bool {
        signatures_match(&self.create_signature(url, payload), signature)
    }
}

impl fmt::Debug for SignatureMaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureMaker")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// One-shot signing without keeping a [`SignatureMaker`] around.
pub fn get_signature(private_key: &str, url: &str, payload: &Payload) -> Result<String, SignerError> {
    Ok(SignatureMaker::new(private_key)?.create_signature(url, payload))
}

/// Constant-time comparison of two signature strings.
pub fn signatures_match(expected: &str, provided: &str) -> bool {
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::payload::FormData;

    const PRIVATE_KEY: &str = "CoVTr95Xv2Xlu4ZjPo2bWl7u4SnnAMAD7EFFBMS4Dy4=";
    const USER_ADD_URL: &str = "http://www.example.com/accounts/user/add/";
    const USER_ADD_SIGNATURE: &str = "4ZAQJqmWE_C9ozPkpJ3Owh0Z_DFtYkCdi4XAc-vOLtI=";

    fn user_data() -> FormData {
        FormData::from([("username", "some tester"), ("first_name", "Mr. Test")])
    }

    #[test]
    fn test_signs_request() {
        let signer = SignatureMaker::new(PRIVATE_KEY).unwrap();
        let signature = signer.create_signature(USER_ADD_URL, &user_data().into());
        assert_eq!(signature, USER_ADD_SIGNATURE);
    }

    #[test]
    fn test_one_shot_signature_matches() {
        let signature = get_signature(PRIVATE_KEY, USER_ADD_URL, &user_data().into()).unwrap();
        assert_eq!(signature, USER_ADD_SIGNATURE);
    }

    #[test]
    fn test_signs_request_without_payload() {
        let signature = get_signature(PRIVATE_KEY, USER_ADD_URL, &Payload::Empty).unwrap();
        assert_eq!(signature, "2ZzgF8AGioIfYzPqedI0FfJKEDG2asRA1LR70q4IOYs=");
    }

    #[test]
    fn test_ignores_signature_param_in_query() {
        let url = format!("{USER_ADD_URL}?__signature={USER_ADD_SIGNATURE}");
        let signature = get_signature(PRIVATE_KEY, &url, &user_data().into()).unwrap();
        assert_eq!(signature, USER_ADD_SIGNATURE);
    }

    #[test]
    fn test_ignores_signature_field_in_payload() {
        let data = user_data().with("__signature", USER_ADD_SIGNATURE);
        let signature = get_signature(PRIVATE_KEY, USER_ADD_URL, &data.into()).unwrap();
        assert_eq!(signature, USER_ADD_SIGNATURE);
    }

    #[test]
    fn test_requires_private_key() {
        let err = SignatureMaker::new("").unwrap_err();
        assert!(matches!(err, SignerError::InvalidKey { .. }));
        assert!(err.to_string().contains("Private key is required."));

        assert!(SignatureMaker::new("not base64 at all!").is_err());
    }

    #[test]
    fn test_accepts_unpadded_and_standard_alphabet_keys() {
        let unpadded = SignatureMaker::new(PRIVATE_KEY.trim_end_matches('=')).unwrap();
        assert_eq!(
            unpadded.create_signature(USER_ADD_URL, &user_data().into()),
            USER_ADD_SIGNATURE
        );
        assert!(SignatureMaker::new("abc123==").is_ok());
        assert!(SignatureMaker::new("a+b/cd==").is_ok());
    }

    #[test]
    fn test_verify_detects_tampering() {
        let signer = SignatureMaker::new(PRIVATE_KEY).unwrap();
        let payload: Payload = user_data().into();
        assert!(signer.verify(USER_ADD_URL, &payload, USER_ADD_SIGNATURE));
        assert!(!signer.verify(&format!("{USER_ADD_URL}?extra=1"), &payload, USER_ADD_SIGNATURE));
        assert!(!signer.verify(USER_ADD_URL, &Payload::Empty, USER_ADD_SIGNATURE));
        assert!(!signer.verify(USER_ADD_URL, &payload, ""));
    }

    #[test]
    fn test_raw_payload_is_signed_verbatim() {
        let signer = SignatureMaker::new(PRIVATE_KEY).unwrap();
        let compact = signer.create_signature("/api/", &Payload::raw(r#"{"a":1}"#));
        let spaced = signer.create_signature("/api/", &Payload::raw(r#"{"a": 1}"#));
        assert_ne!(compact, spaced);
    }

    #[test]
    fn test_debug_redacts_key() {
        let signer = SignatureMaker::new(PRIVATE_KEY).unwrap();
        assert!(!format!("{signer:?}").contains(PRIVATE_KEY));
    }
}
