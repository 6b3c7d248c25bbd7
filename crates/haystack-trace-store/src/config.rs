// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::collections::HashMap;
use std::env;
use std::time::Duration;

use crate::error::StoreError;

pub const ENV_ZIPKIN_URL: &str = "HAYSTACK_ZIPKIN_URL";
pub const ENV_ZIPKIN_TIMEOUT_SECS: &str = "HAYSTACK_ZIPKIN_TIMEOUT_SECS";
pub const ENV_PROXY_HTTPS: &str = "HAYSTACK_PROXY_HTTPS";
const ENV_HTTPS_PROXY: &str = "HTTPS_PROXY";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Connection settings for the Zipkin trace store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Base URL of the Zipkin v1 API, e.g. `http://zipkin:9411/api/v1`
    pub zipkin_url: String,
    /// Per-request timeout enforced by the HTTP client
    pub timeout: Duration,
    /// HTTPS proxy URL
    pub https_proxy: Option<String>,
}

impl StoreConfig {
    pub fn new(zipkin_url: impl Into<String>) -> Self {
        Self {
            zipkin_url: zipkin_url.into().trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            https_proxy: None,
        }
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, StoreError> {
        Self::from_env_iter(env::vars())
    }

    pub fn from_env_iter<I, K, V>(iter: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let map: HashMap<String, String> = iter
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let zipkin_url = map
            .get(ENV_ZIPKIN_URL)
            .map(|url| url.trim().to_string())
            .ok_or_else(|| {
                StoreError::InvalidConfig(format!("{ENV_ZIPKIN_URL} is not set"))
            })?;
        let timeout_secs = map
            .get(ENV_ZIPKIN_TIMEOUT_SECS)
            .and_then(|secs| secs.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        let https_proxy = map
            .get(ENV_PROXY_HTTPS)
            .or_else(|| map.get(ENV_HTTPS_PROXY))
            .filter(|proxy| !proxy.trim().is_empty())
            .cloned();

        let config = Self {
            timeout: Duration::from_secs(timeout_secs),
            https_proxy,
            ..Self::new(zipkin_url)
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.zipkin_url.is_empty() {
            return Err(StoreError::InvalidConfig(format!(
                "{ENV_ZIPKIN_URL} cannot be empty"
            )));
        }

        if !self.zipkin_url.starts_with("http://") && !self.zipkin_url.starts_with("https://") {
            return Err(StoreError::InvalidConfig(format!(
                "Zipkin URL '{}' must start with http:// or https://",
                self.zipkin_url
            )));
        }

        if self.timeout.is_zero() {
            return Err(StoreError::InvalidConfig(
                "Zipkin timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}
