use actix_web::HttpServer;
use request_signer::{
    AppMetrics, ServerConfig, SignatureValidator, SignerConfig, create_app,
};
use std::{io, sync::Arc};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize logging. `LOG_FORMAT=text` switches from JSON to plain output.
fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match std::env::var("LOG_FORMAT").as_deref() {
        Ok("text") => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init(),
        _ => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
    }
}

fn build_validator(config: &SignerConfig) -> Result<SignatureValidator, request_signer::SignerError> {
    let credentials = config.credential_lookup()?;
    Ok(SignatureValidator::new(credentials)
        .with_transport(config.transport)
        .with_allow_unsigned(config.allow_unsigned)
        .with_unquote_retry(config.unquote_retry))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    init_logging();

    let server_config = ServerConfig::from_env();
    let validator = SignerConfig::from_env()
        .and_then(|config| {
            if config.allow_unsigned {
                tracing::warn!("REQUEST_SIGNER_ALLOW_UNSIGNED is set; unsigned requests will be accepted");
            }
            build_validator(&config)
        })
        .map_err(|e| {
            tracing::error!(error = %e, "Invalid signer configuration");
            io::Error::other(e)
        })?;
    let validator = Arc::new(validator);

    let metrics = AppMetrics::new().map_err(|e| {
        tracing::error!(error = %e, "Failed to create metrics");
        io::Error::other(e)
    })?;

    tracing::info!(bind_address = %server_config.bind_address, "Server starting");

    HttpServer::new(move || create_app(validator.clone(), metrics.clone()))
        .bind(&server_config.bind_address)?
        .run()
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use request_signer::StaticCredentials;

    #[test]
    fn test_build_validator_requires_credentials() {
        assert!(build_validator(&SignerConfig::default()).is_err());

        let config = SignerConfig {
            api_keys: Some(StaticCredentials::new([("apps-testclient", "YQ==")])),
            allow_unsigned: true,
            ..SignerConfig::default()
        };
        let validator = build_validator(&config).unwrap();
        assert!(validator.allows_unsigned());
    }
}
