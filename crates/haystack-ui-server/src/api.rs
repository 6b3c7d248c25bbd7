// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! JSON endpoints the Haystack UI calls for trace data.
//!
//! | Path | Store operation |
//! |---|---|
//! | `GET /api/services` | `get_services` |
//! | `GET /api/operations?serviceName=` | `get_operations` |
//! | `GET /api/trace/{traceId}` | `get_trace` |
//! | `GET /api/trace/raw/{traceId}` | `get_raw_trace` |
//! | `GET /api/trace/raw/{traceId}/{spanId}` | `get_raw_span` |
//! | `GET /api/traces?{search}` | `find_traces` |

use bytes::Bytes;
use haystack_trace_store::{ErrorEnvelope, SearchQuery, TraceStore};
use http_body_util::Full;
use hyper::{header, http, Method, Response, StatusCode, Uri};
use percent_encoding::percent_decode_str;
use serde::Serialize;
use serde_json::json;
use tracing::{debug, error};

pub type ApiResponse = Response<Full<Bytes>>;

/// Logs `message` and returns it as `{"message": message}` with `status`.
/// Success statuses are logged at debug level, everything else as an error.
pub fn log_and_create_http_response(
    message: &str,
    status: StatusCode,
) -> http::Result<ApiResponse> {
    if status.is_success() {
        debug!("{message}");
    } else {
        error!("{message}");
    }
    let body = json!({ "message": message }).to_string();
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Full::new(Bytes::from(body)))
}

fn json_response<T: Serialize>(status: StatusCode, value: &T) -> http::Result<ApiResponse> {
    match serde_json::to_vec(value) {
        Ok(body) => Response::builder()
            .status(status)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body))),
        Err(e) => log_and_create_http_response(
            &format!("Failed to serialize response: {e}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        ),
    }
}

fn store_response<T: Serialize>(result: Result<T, ErrorEnvelope>) -> http::Result<ApiResponse> {
    match result {
        Ok(value) => json_response(StatusCode::OK, &value),
        Err(envelope) => {
            let status =
                StatusCode::from_u16(envelope.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            json_response(status, &envelope)
        }
    }
}

/// Routes one request to the matching store operation.
pub async fn handle_request(
    store: &dyn TraceStore,
    method: &Method,
    uri: &Uri,
) -> http::Result<ApiResponse> {
    if *method != Method::GET {
        return log_and_create_http_response(
            &format!("Method {method} not allowed for {}", uri.path()),
            StatusCode::METHOD_NOT_ALLOWED,
        );
    }

    let segments: Vec<String> = uri
        .path()
        .trim_matches('/')
        .split('/')
        .map(|segment| percent_decode_str(segment).decode_utf8_lossy().into_owned())
        .collect();
    let segments: Vec<&str> = segments.iter().map(String::as_str).collect();
    let query = SearchQuery::from_query_string(uri.query().unwrap_or(""));

    debug!(path = uri.path(), "api request");

    match segments.as_slice() {
        ["api", "services"] => store_response(store.get_services().await),
        ["api", "operations"] => match query.service_name().filter(|s| !s.is_empty()) {
            Some(service_name) => store_response(store.get_operations(service_name).await),
            None => log_and_create_http_response(
                "serviceName query parameter is required",
                StatusCode::BAD_REQUEST,
            ),
        },
        ["api", "trace", "raw", trace_id] => store_response(store.get_raw_trace(trace_id).await),
        ["api", "trace", "raw", trace_id, span_id] => {
            store_response(store.get_raw_span(trace_id, span_id).await)
        }
        ["api", "trace", trace_id] => store_response(store.get_trace(trace_id).await),
        ["api", "traces"] => store_response(store.find_traces(&query).await),
        _ => log_and_create_http_response(
            &format!("No route for {}", uri.path()),
            StatusCode::NOT_FOUND,
        ),
    }
}
