//! Client-side construction of signed requests.
//!
//! A [`SignedRequest`] built here verifies as valid under
//! [`SignatureValidator`](crate::services::validator::SignatureValidator) when
//! it is sent unmodified to a server that knows the same private key.

use crate::{
    constants::{
        CLIENT_ID_HEADER_NAME, CLIENT_ID_PARAM_NAME, SIGNATURE_HEADER_NAME, SIGNATURE_PARAM_NAME,
    },
    error::SignerError,
    models::{
        credential::CredentialTransport,
        payload::{FormData, Payload},
    },
    utils::{
        encoding::{append_query, encode_form, quote_plus},
        hmac::SignatureMaker,
    },
};
use actix_web::http::Method;
use serde::Serialize;

/// Methods a signed request can be built for.
pub const ALLOWED_METHODS: &[&str] = &[
    "GET", "HEAD", "POST", "PUT", "PATCH", "DELETE", "OPTIONS", "TRACE",
];

/// Body encoding for methods that carry a body.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ContentType {
    #[default]
    Form,
    Json,
    JsonApi,
}

impl ContentType {
    pub fn mime(&self) -> &'static str {
        match self {
            ContentType::Form => "application/x-www-form-urlencoded",
            ContentType::Json => "application/json",
            ContentType::JsonApi => "application/vnd.api+json",
        }
    }

    /// JSON bodies are signed as the exact bytes sent.
    pub fn is_json(&self) -> bool {
        matches!(self, ContentType::Json | ContentType::JsonApi)
    }
}

/// A request ready to hand to an HTTP client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedRequest {
    pub method: Method,
    /// Full URL including client id and signature for query transport.
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<Vec<u8>>,
}

impl SignedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Builds signed requests for one client and one HTTP method.
#[derive(Debug, Clone)]
pub struct SignedRequestFactory {
    method: Method,
    client_id: String,
    signer: SignatureMaker,
    content_type: ContentType,
    transport: CredentialTransport,
}

impl SignedRequestFactory {
    /// Fails on a method outside [`ALLOWED_METHODS`] or an unusable key.
    pub fn new(method: &str, client_id: &str, private_key: &str) -> Result<Self, SignerError> {
        let method = parse_method(method)?;
        let signer = SignatureMaker::new(private_key)?;
        Ok(Self {
            method,
            client_id: client_id.to_string(),
            signer,
            content_type: ContentType::default(),
            transport: CredentialTransport::default(),
        })
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_transport(mut self, transport: CredentialTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Sign a request carrying `data`.
    ///
    /// For GET and HEAD the data is folded into the query and nothing is sent
    /// in the body. Otherwise the data becomes a form or JSON body.
    pub fn create_request(&self, url: &str, data: &FormData) -> Result<SignedRequest, SignerError> {
        if self.carries_query() {
            let mut url = self.url_with_client_id(url);
            append_query(&mut url, &encode_form(data));
            return Ok(self.finish(url, Payload::Empty, None));
        }

        if self.content_type.is_json() {
            let body = serde_json::to_vec(&data.to_json())?;
            return Ok(self.finish(
                self.url_with_client_id(url),
                Payload::Raw(body.clone()),
                Some(body),
            ));
        }

        let body = encode_form(data).into_bytes();
        Ok(self.finish(
            self.url_with_client_id(url),
            Payload::Form(data.clone()),
            Some(body),
        ))
    }

    /// Sign a request with an arbitrary JSON body.
    ///
    /// The serialized bytes are what gets signed, so any `Serialize` type
    /// works, nested or not. For GET and HEAD the body is dropped.
    pub fn create_json_request<T: Serialize + ?Sized>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<SignedRequest, SignerError> {
        let url = self.url_with_client_id(url);
        if self.carries_query() {
            return Ok(self.finish(url, Payload::Empty, None));
        }

        let body = serde_json::to_vec(body)?;
        let content_type = match self.content_type {
            ContentType::Form => ContentType::Json,
            json => json,
        };
        let mut request = self.finish(url, Payload::Raw(body.clone()), Some(body));
        set_content_type(&mut request, content_type);
        Ok(request)
    }

    fn carries_query(&self) -> bool {
        self.method == Method::GET || self.method == Method::HEAD
    }

    fn url_with_client_id(&self, url: &str) -> String {
        let mut url = url.to_string();
        if self.transport == CredentialTransport::QueryParams {
            append_query(
                &mut url,
                &format!("{CLIENT_ID_PARAM_NAME}={}", quote_plus(&self.client_id)),
            );
        }
        url
    }

    fn finish(&self, mut url: String, payload: Payload, body: Option<Vec<u8>>) -> SignedRequest {
        let signature = self.signer.create_signature(&url, &payload);

        let mut headers = Vec::new();
        match self.transport {
            CredentialTransport::QueryParams => {
                append_query(&mut url, &format!("{SIGNATURE_PARAM_NAME}={signature}"));
            }
            CredentialTransport::Headers => {
                headers.push((CLIENT_ID_HEADER_NAME.to_string(), self.client_id.clone()));
                headers.push((SIGNATURE_HEADER_NAME.to_string(), signature));
            }
        }

        let mut request = SignedRequest {
            method: self.method.clone(),
            url,
            headers,
            body,
        };
        if request.body.is_some() {
            set_content_type(&mut request, self.content_type);
        }
        request
    }
}

fn set_content_type(request: &mut SignedRequest, content_type: ContentType) {
    request
        .headers
        .retain(|(key, _)| !key.eq_ignore_ascii_case("Content-Type"));
    request
        .headers
        .push(("Content-Type".to_string(), content_type.mime().to_string()));
}

fn parse_method(method: &str) -> Result<Method, SignerError> {
    let upper = method.trim().to_ascii_uppercase();
    if !ALLOWED_METHODS.contains(&upper.as_str()) {
        return Err(SignerError::MethodNotAllowed {
            method: method.to_string(),
        });
    }
    Method::from_bytes(upper.as_bytes()).map_err(|_| SignerError::MethodNotAllowed {
        method: method.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLIENT_ID: &str = "client_id";
    const PRIVATE_KEY: &str = "oVB_b3qrP3R6IDApALqehQzFy3DpMfob6Y4627WEK5A=";

    fn factory(method: &str) -> SignedRequestFactory {
        SignedRequestFactory::new(method, CLIENT_ID, PRIVATE_KEY).unwrap()
    }

    fn sample_data() -> FormData {
        FormData::from([("some", "da ta"), ("goes", "he re")])
    }

    #[test]
    fn test_adds_client_id_and_signature_to_url() {
        let request = factory("GET")
            .create_request("http://example.com/my/url", &FormData::new())
            .unwrap();
        assert_eq!(
            request.url,
            "http://example.com/my/url?__client_id=client_id&__signature=N1WOdyaBUVlPjKVyL3ionapOLAasFdvagfotfCdCW-Y="
        );
        assert_eq!(request.body, None);
        assert!(request.headers.is_empty());
    }

    #[test]
    fn test_get_folds_data_into_query() {
        let request = factory("get").create_request("www.myurl.com", &sample_data()).unwrap();
        assert_eq!(
            request.url,
            "www.myurl.com?__client_id=client_id&goes=he+re&some=da+ta&__signature=4wSh_P_esdOD7fu3Vtq1dFy8XgdbuvKEwhkVF-b0PPU="
        );
        assert_eq!(request.body, None);
    }

    #[test]
    fn test_post_sends_form_body() {
        let request = factory("POST").create_request("www.myurl.com", &sample_data()).unwrap();
        assert_eq!(
            request.url,
            "www.myurl.com?__client_id=client_id&__signature=3sh6DOlYgbsCGT5rNlY819eFAdfl6Fy9GiyHHgUAwLQ="
        );
        assert_eq!(request.body.as_deref(), Some(b"goes=he+re&some=da+ta".as_slice()));
        assert_eq!(
            request.header("content-type"),
            Some("application/x-www-form-urlencoded")
        );
    }

    #[test]
    fn test_json_body_is_signed_as_sent() {
        let request = factory("PUT")
            .with_content_type(ContentType::Json)
            .create_request("/api/", &sample_data())
            .unwrap();
        let body = request.body.clone().unwrap();
        let parsed: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(parsed, serde_json::json!({"some": "da ta", "goes": "he re"}));

        let signer = SignatureMaker::new(PRIVATE_KEY).unwrap();
        let signature = signer.create_signature("/api/?__client_id=client_id", &Payload::Raw(body));
        assert!(request.url.ends_with(&format!("&__signature={signature}")));
        assert_eq!(request.header("Content-Type"), Some("application/json"));
    }

    #[test]
    fn test_json_request_with_nested_body() {
        let body = serde_json::json!({"data": {"type": "users", "attributes": {"name": "x"}}});
        let request = factory("POST")
            .with_content_type(ContentType::JsonApi)
            .create_json_request("/api/users/", &body)
            .unwrap();
        assert_eq!(request.header("Content-Type"), Some("application/vnd.api+json"));
        assert_eq!(request.body, Some(serde_json::to_vec(&body).unwrap()));
    }

    #[test]
    fn test_header_transport_leaves_url_alone() {
        let request = factory("GET")
            .with_transport(CredentialTransport::Headers)
            .create_request("/my/url", &FormData::new())
            .unwrap();
        assert_eq!(request.url, "/my/url");
        assert_eq!(request.header(CLIENT_ID_HEADER_NAME), Some(CLIENT_ID));
        assert!(request.header(SIGNATURE_HEADER_NAME).is_some());
    }

    #[test]
    fn test_method_not_allowed() {
        let err = SignedRequestFactory::new("CONNECT", CLIENT_ID, PRIVATE_KEY).unwrap_err();
        assert!(matches!(err, SignerError::MethodNotAllowed { .. }));
        assert!(SignedRequestFactory::new("BREW", CLIENT_ID, PRIVATE_KEY).is_err());
        for method in ALLOWED_METHODS {
            assert!(SignedRequestFactory::new(method, CLIENT_ID, PRIVATE_KEY).is_ok());
        }
    }

    #[test]
    fn test_requires_private_key() {
        assert!(matches!(
            SignedRequestFactory::new("GET", CLIENT_ID, ""),
            Err(SignerError::InvalidKey { .. })
        ));
    }

    #[test]
    fn test_client_id_is_quoted() {
        let request = factory("DELETE");
        let request = SignedRequestFactory { client_id: "a b&c".to_string(), ..request }
            .create_request("/x", &FormData::new())
            .unwrap();
        assert!(request.url.starts_with("/x?__client_id=a+b%26c&__signature="));
    }
}
