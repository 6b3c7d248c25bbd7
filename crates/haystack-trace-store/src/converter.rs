// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Reshapes Zipkin v1 spans into the Haystack trace and search-result model.

use serde_json::Value;

use crate::model::{
    Log, SearchResult, ServiceSpanCount, Span, Tag, Trace, ZipkinEndpoint, ZipkinSpan,
};
use crate::query::SearchQuery;

/// Core annotations recorded by the instrumented service itself.
const CORE_ANNOTATIONS: [&str; 4] = ["sr", "cs", "ss", "cr"];

pub fn to_haystack_span(span: &ZipkinSpan) -> Span {
    let (start_time, duration) = span_timing(span);
    Span {
        trace_id: span.trace_id.clone(),
        span_id: span.id.clone(),
        parent_span_id: span.parent_id.clone(),
        service_name: service_name(span).unwrap_or_default(),
        operation_name: span.name.clone(),
        start_time,
        duration,
        logs: span
            .annotations
            .iter()
            .map(|annotation| Log {
                timestamp: annotation.timestamp,
                fields: vec![Tag {
                    key: "event".to_string(),
                    value: annotation.value.clone(),
                }],
            })
            .collect(),
        tags: span
            .binary_annotations
            .iter()
            .map(|annotation| Tag {
                key: annotation.key.clone(),
                value: tag_value(&annotation.value),
            })
            .collect(),
    }
}

pub fn to_haystack_trace(spans: &[ZipkinSpan]) -> Trace {
    spans.iter().map(to_haystack_span).collect()
}

/// Summarises each Zipkin trace into a search result. Empty traces are skipped.
pub fn to_haystack_search_result(
    traces: &[Vec<ZipkinSpan>],
    query: &SearchQuery,
) -> Vec<SearchResult> {
    traces
        .iter()
        .filter_map(|spans| summarize(&to_haystack_trace(spans), query))
        .collect()
}

fn summarize(trace: &Trace, query: &SearchQuery) -> Option<SearchResult> {
    let root = trace
        .iter()
        .find(|span| span.parent_span_id.is_none())
        .or_else(|| trace.first())?;

    let start_time = trace.iter().map(|span| span.start_time).min().unwrap_or(0);
    let end_time = trace
        .iter()
        .map(|span| span.start_time.saturating_add(span.duration))
        .max()
        .unwrap_or(start_time);

    let mut services: Vec<ServiceSpanCount> = Vec::new();
    for span in trace {
        match services.iter_mut().find(|s| s.name == span.service_name) {
            Some(service) => service.span_count += 1,
            None => services.push(ServiceSpanCount {
                name: span.service_name.clone(),
                span_count: 1,
            }),
        }
    }

    Some(SearchResult {
        trace_id: root.trace_id.clone(),
        service_name: root.service_name.clone(),
        root_operation: root.operation_name.clone(),
        root_error: root.is_error(),
        span_count: trace.len(),
        error_span_count: trace.iter().filter(|span| span.is_error()).count(),
        services,
        start_time,
        duration: end_time.saturating_sub(start_time),
        queried_service: non_empty(query.service_name()),
        queried_operation: non_empty(query.operation_name()),
    })
}

/// Prefers the endpoint of a core annotation, then any annotation, then any tag.
fn service_name(span: &ZipkinSpan) -> Option<String> {
    let core = span
        .annotations
        .iter()
        .filter(|a| CORE_ANNOTATIONS.contains(&a.value.as_str()))
        .find_map(|a| named_endpoint(a.endpoint.as_ref()));
    core.or_else(|| {
        span.annotations
            .iter()
            .find_map(|a| named_endpoint(a.endpoint.as_ref()))
    })
    .or_else(|| {
        span.binary_annotations
            .iter()
            .find_map(|a| named_endpoint(a.endpoint.as_ref()))
    })
}

fn named_endpoint(endpoint: Option<&ZipkinEndpoint>) -> Option<String> {
    endpoint
        .map(|e| e.service_name.clone())
        .filter(|name| !name.is_empty())
}

/// Falls back to the annotation range when Zipkin did not record timestamp/duration.
fn span_timing(span: &ZipkinSpan) -> (i64, i64) {
    let first = span.annotations.iter().map(|a| a.timestamp).min();
    let last = span.annotations.iter().map(|a| a.timestamp).max();
    let start_time = span.timestamp.or(first).unwrap_or(0);
    let duration = span
        .duration
        .or_else(|| first.zip(last).map(|(first, last)| last.saturating_sub(first)))
        .unwrap_or(0);
    (start_time, duration)
}

fn tag_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
