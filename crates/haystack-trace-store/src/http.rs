// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Thin GET-and-decode wrapper around a shared `reqwest::Client`.

use std::time::Duration;

use reqwest::{Client, Method};
use serde::de::DeserializeOwned;

use crate::error::StoreError;

/// Builds a reqwest client with optional HTTPS proxy configuration and timeout.
pub fn build_client(proxy_url: Option<&str>, timeout: Duration) -> Result<Client, StoreError> {
    let mut builder = Client::builder().use_rustls_tls().timeout(timeout);
    if let Some(proxy) = proxy_url {
        builder = builder.proxy(reqwest::Proxy::https(proxy)?);
    }
    Ok(builder.build()?)
}

#[derive(Debug, Clone)]
pub struct HttpClient {
    /// Underlying HTTP client (shared across requests).
    client: Client,
    /// Provider base URL without a trailing slash.
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { client, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Issues one GET for `path_and_query` relative to the base URL and decodes the JSON body.
    ///
    /// Non-2xx statuses are reported as [`StoreError::Status`] carrying the
    /// response body so the caller can surface the provider's message.
    pub async fn get_json<T: DeserializeOwned>(&self, path_and_query: &str) -> Result<T, StoreError> {
        let url = format!("{}{}", self.base_url, path_and_query);
        tracing::debug!(method = %Method::GET, url = %url, "zipkin HTTP request");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        tracing::debug!(
            method = %Method::GET,
            url = %url,
            status = %status,
            content_length = body.len(),
            "zipkin HTTP response"
        );

        if !status.is_success() {
            return Err(StoreError::Status {
                status,
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(serde_json::from_slice(&body)?)
    }
}
