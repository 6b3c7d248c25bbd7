// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Zipkin v1 wire types and the provider-independent Haystack trace model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Network location of the service that recorded an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinEndpoint {
    #[serde(default)]
    pub service_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ipv6: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

/// Timestamped event, e.g. `cs`/`sr`/`ss`/`cr` or a free-form message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinAnnotation {
    pub timestamp: i64,
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ZipkinEndpoint>,
}

/// Key/value tag. Zipkin allows the value to be any JSON scalar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinBinaryAnnotation {
    pub key: String,
    pub value: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<ZipkinEndpoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZipkinSpan {
    pub trace_id: String,
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    /// Microseconds since epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    /// Microseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default)]
    pub annotations: Vec<ZipkinAnnotation>,
    #[serde(default)]
    pub binary_annotations: Vec<ZipkinBinaryAnnotation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub debug: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Log {
    pub timestamp: i64,
    pub fields: Vec<Tag>,
}

/// A span in the Haystack model. Times are in microseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Span {
    pub trace_id: String,
    pub span_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_span_id: Option<String>,
    pub service_name: String,
    pub operation_name: String,
    pub start_time: i64,
    pub duration: i64,
    pub logs: Vec<Log>,
    pub tags: Vec<Tag>,
}

impl Span {
    /// A span is in error when it carries an `error` tag whose value is not `false`.
    pub fn is_error(&self) -> bool {
        self.tags
            .iter()
            .any(|tag| tag.key == "error" && !tag.value.eq_ignore_ascii_case("false"))
    }
}

pub type Trace = Vec<Span>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceSpanCount {
    pub name: String,
    pub span_count: usize,
}

/// One row of the search results list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub trace_id: String,
    pub service_name: String,
    pub root_operation: String,
    pub root_error: bool,
    pub span_count: usize,
    pub error_span_count: usize,
    pub services: Vec<ServiceSpanCount>,
    pub start_time: i64,
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queried_service: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queried_operation: Option<String>,
}
