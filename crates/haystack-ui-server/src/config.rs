// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::env;

use haystack_trace_store::StoreConfig;

use crate::error::ServerError;

pub const ENV_HOST: &str = "HAYSTACK_HOST";
pub const ENV_PORT: &str = "HAYSTACK_PORT";
pub const ENV_LOG_LEVEL: &str = "HAYSTACK_LOG_LEVEL";

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";
const VALID_LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Configuration for the API server and the trace store behind it
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Interface to listen on
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Log level (e.g., trace, debug, info, warn, error)
    pub log_level: String,
    pub store: StoreConfig,
}

impl ServerConfig {
    pub fn new(store: StoreConfig) -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            store,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_env_iter(env::vars())
    }

    pub fn from_env_iter<I, K, V>(iter: I) -> Result<Self, ServerError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let store = StoreConfig::from_env_iter(map.clone())?;
        let host = map
            .get(ENV_HOST)
            .cloned()
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = map
            .get(ENV_PORT)
            .and_then(|port| port.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let config = Self {
            host,
            port,
            log_level: log_level_from(&map),
            store,
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ServerError> {
        if self.port == 0 {
            return Err(ServerError::InvalidConfig(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.host.trim().is_empty() {
            return Err(ServerError::InvalidConfig(format!(
                "{ENV_HOST} cannot be empty"
            )));
        }

        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(ServerError::InvalidConfig(format!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.log_level
            )));
        }

        self.store.validate()?;
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Reads the log level on its own so logging can be set up before the rest of
/// the configuration is validated.
pub fn log_level_from_env() -> String {
    let vars: HashMap<String, String> = env::vars().collect();
    log_level_from(&vars)
}

fn log_level_from(map: &HashMap<String, String>) -> String {
    map.get(ENV_LOG_LEVEL)
        .map(|val| val.to_lowercase())
        .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use haystack_trace_store::config::ENV_ZIPKIN_URL;

    fn default_config() -> ServerConfig {
        ServerConfig::new(StoreConfig::new("http://zipkin:9411/api/v1"))
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(default_config().validate().is_ok());
    }

    #[test]
    fn test_from_env_iter() {
        let config = ServerConfig::from_env_iter([
            (ENV_ZIPKIN_URL, "http://zipkin:9411/api/v1"),
            (ENV_PORT, "9090"),
            (ENV_HOST, "127.0.0.1"),
            (ENV_LOG_LEVEL, "DEBUG"),
        ])
        .expect("valid config");

        assert_eq!(config.bind_addr(), "127.0.0.1:9090");
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.store.zipkin_url, "http://zipkin:9411/api/v1");
    }

    #[test]
    fn test_from_env_iter_requires_zipkin_url() {
        let err = ServerConfig::from_env_iter([(ENV_PORT, "9090")]).expect_err("missing url");
        assert!(matches!(err, ServerError::Store(_)));
    }

    #[test]
    fn test_unparseable_port_falls_back_to_default() {
        let config = ServerConfig::from_env_iter([
            (ENV_ZIPKIN_URL, "http://zipkin:9411"),
            (ENV_PORT, "eighty"),
        ])
        .expect("valid config");
        assert_eq!(config.port, DEFAULT_PORT);
    }

    #[test]
    fn test_validate_invalid_port() {
        let config = ServerConfig {
            port: 0,
            ..default_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_empty_host() {
        let config = ServerConfig {
            host: "   ".to_string(),
            ..default_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_valid_log_levels() {
        for level in VALID_LOG_LEVELS {
            let config = ServerConfig {
                log_level: level.to_string(),
                ..default_config()
            };
            assert!(
                config.validate().is_ok(),
                "Log level '{}' should be valid",
                level
            );
        }

        let config = ServerConfig {
            log_level: "verbose".to_string(),
            ..default_config()
        };
        assert!(config.validate().is_err());
    }
}
