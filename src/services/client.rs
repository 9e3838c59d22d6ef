//! HTTP client that signs every request it sends.

use crate::{
    config::client::ClientSettings,
    error::SignerError,
    models::{credential::CredentialTransport, payload::FormData},
    services::request_builder::{ContentType, SignedRequest, SignedRequestFactory},
    utils::{hmac::SignatureMaker, redact::redact_sensitive_data},
};
use reqwest::Client;
use serde::{Serialize, de::DeserializeOwned};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Errors from sending a signed request.
///
/// Non-2xx statuses are not errors; they come back as an [`ApiResponse`].
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Signing error: {0}")]
    Signer(#[from] SignerError),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// A received response with its body read into memory.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status_code: u16,
    content_type: Option<String>,
    body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status_code: u16, content_type: Option<String>, body: Vec<u8>) -> Self {
        Self {
            status_code,
            content_type,
            body,
        }
    }

    pub fn status_code(&self) -> u16 {
        self.status_code
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Deserialize the body. An empty body reads as `{}`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        if self.body.is_empty() {
            serde_json::from_slice(b"{}")
        } else {
            serde_json::from_slice(&self.body)
        }
    }

    /// True for 2xx statuses.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status_code)
    }
}

/// Sends requests to one configured service, signed with its client key.
#[derive(Debug, Clone)]
pub struct SignedClient {
    http: Client,
    settings: ClientSettings,
    content_type: ContentType,
    transport: CredentialTransport,
}

impl SignedClient {
    /// Fails if the configured private key cannot be decoded.
    pub fn new(settings: ClientSettings) -> Result<Self, ClientError> {
        SignatureMaker::new(&settings.private_key)?;
        let http = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()?;

        Ok(Self {
            http,
            settings,
            content_type: ContentType::default(),
            transport: CredentialTransport::default(),
        })
    }

    /// Build a client from `<PREFIX>_*` environment variables.
    pub fn from_env(prefix: &str) -> Result<Self, ClientError> {
        Self::new(ClientSettings::from_env(prefix)?)
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_transport(mut self, transport: CredentialTransport) -> Self {
        self.transport = transport;
        self
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Full URL for an endpoint path on the configured domain.
    pub fn url_for(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{endpoint}", self.settings.domain)
        } else {
            format!("{}/{endpoint}", self.settings.domain)
        }
    }

    fn factory(&self, method: &str) -> Result<SignedRequestFactory, SignerError> {
        Ok(SignedRequestFactory::new(
            method,
            &self.settings.client_id,
            &self.settings.private_key,
        )?
        .with_content_type(self.content_type)
        .with_transport(self.transport))
    }

    /// Build the signed request without sending it.
    pub fn build_request(
        &self,
        method: &str,
        endpoint: &str,
        data: &FormData,
    ) -> Result<SignedRequest, SignerError> {
        self.factory(method)?
            .create_request(&self.url_for(endpoint), data)
    }

    /// Sign and send a request with form data (query data for GET/HEAD).
    pub async fn get_response(
        &self,
        method: &str,
        endpoint: &str,
        data: &FormData,
    ) -> Result<ApiResponse, ClientError> {
        let request = self.build_request(method, endpoint, data)?;
        self.send(request).await
    }

    /// Sign and send a request with a JSON body.
    pub async fn get_json_response<T: Serialize + ?Sized>(
        &self,
        method: &str,
        endpoint: &str,
        body: &T,
    ) -> Result<ApiResponse, ClientError> {
        let request = self
            .factory(method)?
            .create_json_request(&self.url_for(endpoint), body)?;
        self.send(request).await
    }

    /// Send an already signed request.
    pub async fn send(&self, request: SignedRequest) -> Result<ApiResponse, ClientError> {
        // actix and reqwest sit on different `http` major versions
        let method = reqwest::Method::from_bytes(request.method.as_str().as_bytes()).map_err(|_| {
            SignerError::MethodNotAllowed {
                method: request.method.to_string(),
            }
        })?;

        debug!(
            method = %method,
            url = %redact_sensitive_data(&request.url),
            "Sending signed request"
        );

        let mut builder = self.http.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(status = status_code, "Received response");

        Ok(ApiResponse::new(status_code, content_type, body))
    }
}
