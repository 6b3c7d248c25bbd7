// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::config::StoreConfig;
use crate::converter;
use crate::error::{normalize, ErrorEnvelope, StoreError};
use crate::http::{build_client, HttpClient};
use crate::model::{SearchResult, Trace, ZipkinSpan};
use crate::query::{encode_component, map_query_params, SearchQuery};

/// Read-only access to a tracing backend.
///
/// Every call issues exactly one request and resolves to either the result or
/// a normalized [`ErrorEnvelope`]. Implementations hold no per-call state and
/// may be shared across tasks.
#[async_trait]
pub trait TraceStore: Send + Sync {
    /// Names of all services known to the backend.
    async fn get_services(&self) -> Result<Vec<String>, ErrorEnvelope>;
    /// Names of the operations recorded for `service_name`.
    async fn get_operations(&self, service_name: &str) -> Result<Vec<String>, ErrorEnvelope>;
    /// A whole trace in the Haystack model.
    async fn get_trace(&self, trace_id: &str) -> Result<Trace, ErrorEnvelope>;
    /// A whole trace exactly as the backend returned it.
    async fn get_raw_trace(&self, trace_id: &str) -> Result<Value, ErrorEnvelope>;
    /// A single span exactly as the backend returned it.
    async fn get_raw_span(&self, trace_id: &str, span_id: &str) -> Result<Value, ErrorEnvelope>;
    /// Searches traces. A query carrying a `traceId` (any casing) looks that trace up directly.
    async fn find_traces(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ErrorEnvelope>;
}

/// [`TraceStore`] backed by the Zipkin v1 REST API.
#[derive(Debug, Clone)]
pub struct ZipkinTraceStore {
    http: HttpClient,
}

impl ZipkinTraceStore {
    pub fn new(config: &StoreConfig) -> Result<Self, StoreError> {
        config.validate()?;
        let client = build_client(config.https_proxy.as_deref(), config.timeout)?;
        Ok(Self::with_client(HttpClient::new(&config.zipkin_url, client)))
    }

    pub fn with_client(http: HttpClient) -> Self {
        Self { http }
    }

    pub fn base_url(&self) -> &str {
        self.http.base_url()
    }
}

#[async_trait]
impl TraceStore for ZipkinTraceStore {
    async fn get_services(&self) -> Result<Vec<String>, ErrorEnvelope> {
        self.http
            .get_json("/services")
            .await
            .map_err(|e| normalize("get_services", e))
    }

    async fn get_operations(&self, service_name: &str) -> Result<Vec<String>, ErrorEnvelope> {
        let path = format!("/spans?serviceName={}", encode_component(service_name));
        self.http
            .get_json(&path)
            .await
            .map_err(|e| normalize("get_operations", e))
    }

    async fn get_trace(&self, trace_id: &str) -> Result<Trace, ErrorEnvelope> {
        let path = format!("/trace/{}", encode_component(trace_id));
        let spans: Vec<ZipkinSpan> = self
            .http
            .get_json(&path)
            .await
            .map_err(|e| normalize("get_trace", e))?;
        Ok(converter::to_haystack_trace(&spans))
    }

    async fn get_raw_trace(&self, trace_id: &str) -> Result<Value, ErrorEnvelope> {
        let path = format!("/trace/raw/{}", encode_component(trace_id));
        self.http
            .get_json(&path)
            .await
            .map_err(|e| normalize("get_raw_trace", e))
    }

    async fn get_raw_span(&self, trace_id: &str, span_id: &str) -> Result<Value, ErrorEnvelope> {
        let path = format!(
            "/trace/raw/{}/{}",
            encode_component(trace_id),
            encode_component(span_id)
        );
        self.http
            .get_json(&path)
            .await
            .map_err(|e| normalize("get_raw_span", e))
    }

    async fn find_traces(&self, query: &SearchQuery) -> Result<Vec<SearchResult>, ErrorEnvelope> {
        if let Some(trace_id) = query.get_ignoring_case("traceId").filter(|id| !id.is_empty()) {
            debug!(trace_id = trace_id, "trace id search, looking up the trace directly");
            let path = format!("/trace/{}", encode_component(trace_id));
            let spans: Vec<ZipkinSpan> = self
                .http
                .get_json(&path)
                .await
                .map_err(|e| normalize("find_traces", e))?;
            return Ok(converter::to_haystack_search_result(&[spans], query));
        }

        let path = format!("/traces?{}", map_query_params(query));
        let traces: Vec<Vec<ZipkinSpan>> = self
            .http
            .get_json(&path)
            .await
            .map_err(|e| normalize("find_traces", e))?;
        debug!("zipkin returned {} traces", traces.len());
        Ok(converter::to_haystack_search_result(&traces, query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_rejects_invalid_config() {
        let err = ZipkinTraceStore::new(&StoreConfig::new("ftp://zipkin")).expect_err("invalid");
        assert!(matches!(err, StoreError::InvalidConfig(_)));
    }

    #[test]
    fn test_new_uses_configured_url() {
        let store = ZipkinTraceStore::new(&StoreConfig::new("http://zipkin:9411/api/v1/"))
            .expect("valid config");
        assert_eq!(store.base_url(), "http://zipkin:9411/api/v1");
    }
}
