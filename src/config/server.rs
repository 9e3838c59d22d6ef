//! HTTP server configuration.

use std::env;

/// Configuration for the demo server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        let bind_address = env::var("BIND_ADDRESS")
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| Self::default().bind_address);

        Self { bind_address }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ENV_MUTEX;

    #[test]
    fn test_bind_address() {
        let _lock = ENV_MUTEX.lock().unwrap_or_else(|e| e.into_inner());
        unsafe { env::remove_var("BIND_ADDRESS") };
        assert_eq!(ServerConfig::from_env().bind_address, "127.0.0.1:8080");

        unsafe { env::set_var("BIND_ADDRESS", "0.0.0.0:9000") };
        assert_eq!(ServerConfig::from_env().bind_address, "0.0.0.0:9000");
        unsafe { env::remove_var("BIND_ADDRESS") };
    }
}
