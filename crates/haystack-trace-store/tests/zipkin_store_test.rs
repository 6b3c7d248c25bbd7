// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::time::Duration;

use haystack_trace_store::{ErrorEnvelope, SearchQuery, StoreConfig, TraceStore, ZipkinTraceStore};
use mockito::{Matcher, Server};
use serde_json::json;

fn store_for(url: &str) -> ZipkinTraceStore {
    let config = StoreConfig {
        timeout: Duration::from_secs(2),
        ..StoreConfig::new(url)
    };
    ZipkinTraceStore::new(&config).expect("failed to create store")
}

fn zipkin_trace(trace_id: &str) -> serde_json::Value {
    json!([
        {
            "traceId": trace_id,
            "id": "root",
            "name": "get /checkout",
            "timestamp": 1000,
            "duration": 500,
            "annotations": [
                {"timestamp": 1000, "value": "sr", "endpoint": {"serviceName": "frontend"}}
            ],
            "binaryAnnotations": []
        },
        {
            "traceId": trace_id,
            "id": "child",
            "parentId": "root",
            "name": "charge",
            "timestamp": 1100,
            "duration": 200,
            "annotations": [
                {"timestamp": 1100, "value": "sr", "endpoint": {"serviceName": "payments"}}
            ],
            "binaryAnnotations": [{"key": "error", "value": "card declined"}]
        }
    ])
}

#[tokio::test]
async fn get_services_returns_raw_names() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/services")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"["frontend","payments"]"#)
        .create_async()
        .await;

    let services = store_for(&server.url())
        .get_services()
        .await
        .expect("services");

    assert_eq!(services, vec!["frontend", "payments"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn get_operations_queries_spans_by_service() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/spans")
        .match_query(Matcher::UrlEncoded(
            "serviceName".into(),
            "front end".into(),
        ))
        .with_status(200)
        .with_body(r#"["get /checkout","get /cart"]"#)
        .create_async()
        .await;

    let operations = store_for(&server.url())
        .get_operations("front end")
        .await
        .expect("operations");

    assert_eq!(operations, vec!["get /checkout", "get /cart"]);
    mock.assert_async().await;
}

#[tokio::test]
async fn get_trace_converts_to_haystack_spans() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/trace/abc123")
        .with_status(200)
        .with_body(zipkin_trace("abc123").to_string())
        .create_async()
        .await;

    let trace = store_for(&server.url())
        .get_trace("abc123")
        .await
        .expect("trace");

    assert_eq!(trace.len(), 2);
    assert_eq!(trace[0].span_id, "root");
    assert_eq!(trace[0].service_name, "frontend");
    assert_eq!(trace[1].parent_span_id.as_deref(), Some("root"));
    assert!(trace[1].is_error());
    mock.assert_async().await;
}

#[tokio::test]
async fn raw_operations_pass_payload_through() {
    let mut server = Server::new_async().await;
    let raw_trace = zipkin_trace("abc123");
    let raw_span = raw_trace[1].clone();
    let trace_mock = server
        .mock("GET", "/trace/raw/abc123")
        .with_status(200)
        .with_body(raw_trace.to_string())
        .create_async()
        .await;
    let span_mock = server
        .mock("GET", "/trace/raw/abc123/child")
        .with_status(200)
        .with_body(raw_span.to_string())
        .create_async()
        .await;

    let store = store_for(&server.url());
    assert_eq!(store.get_raw_trace("abc123").await.expect("raw trace"), raw_trace);
    assert_eq!(
        store.get_raw_span("abc123", "child").await.expect("raw span"),
        raw_span
    );
    trace_mock.assert_async().await;
    span_mock.assert_async().await;
}

#[tokio::test]
async fn find_traces_maps_search_query() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/traces")
        .match_query(Matcher::AllOf(vec![
            Matcher::UrlEncoded("serviceName".into(), "frontend".into()),
            Matcher::UrlEncoded("spanName".into(), "all".into()),
            Matcher::UrlEncoded("annotationQuery".into(), "error=true".into()),
            Matcher::UrlEncoded("endTs".into(), "1000".into()),
            Matcher::UrlEncoded("lookback".into(), "30000".into()),
            Matcher::UrlEncoded("limit".into(), "40".into()),
        ]))
        .with_status(200)
        .with_body(json!([zipkin_trace("t1"), zipkin_trace("t2")]).to_string())
        .create_async()
        .await;

    let query = SearchQuery::new()
        .with("serviceName", "frontend")
        .with("startTime", "1000000")
        .with("endTime", "31000000")
        .with("error", "true");
    let results = store_for(&server.url())
        .find_traces(&query)
        .await
        .expect("search results");

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].trace_id, "t1");
    assert_eq!(results[0].root_operation, "get /checkout");
    assert_eq!(results[0].span_count, 2);
    assert_eq!(results[0].error_span_count, 1);
    assert_eq!(results[0].duration, 500);
    assert_eq!(results[1].trace_id, "t2");
    mock.assert_async().await;
}

#[tokio::test]
async fn find_traces_with_trace_id_looks_up_single_trace() {
    let mut server = Server::new_async().await;
    let trace_mock = server
        .mock("GET", "/trace/abc123")
        .with_status(200)
        .with_body(zipkin_trace("abc123").to_string())
        .expect(1)
        .create_async()
        .await;
    let search_mock = server
        .mock("GET", "/traces")
        .match_query(Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let query = SearchQuery::new()
        .with("serviceName", "frontend")
        .with("TraceId", "abc123");
    let results = store_for(&server.url())
        .find_traces(&query)
        .await
        .expect("search results");

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trace_id, "abc123");
    assert_eq!(results[0].queried_service.as_deref(), Some("frontend"));
    trace_mock.assert_async().await;
    search_mock.assert_async().await;
}

#[tokio::test]
async fn find_traces_with_trace_id_and_no_spans_is_empty() {
    let mut server = Server::new_async().await;
    let trace_mock = server
        .mock("GET", "/trace/unknown")
        .with_status(200)
        .with_body("[]")
        .expect(1)
        .create_async()
        .await;

    let query = SearchQuery::new().with("traceId", "unknown");
    let results = store_for(&server.url())
        .find_traces(&query)
        .await
        .expect("search results");

    assert!(results.is_empty());
    trace_mock.assert_async().await;
}

#[tokio::test]
async fn every_operation_normalizes_provider_failures() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", Matcher::Any)
        .with_status(500)
        .with_body(r#"{"message":"storage unavailable"}"#)
        .create_async()
        .await;

    let store = store_for(&server.url());
    let query = SearchQuery::new().with("serviceName", "frontend");
    let errors: Vec<ErrorEnvelope> = vec![
        store.get_services().await.expect_err("services"),
        store.get_operations("frontend").await.expect_err("operations"),
        store.get_trace("abc").await.expect_err("trace"),
        store.get_raw_trace("abc").await.expect_err("raw trace"),
        store.get_raw_span("abc", "def").await.expect_err("raw span"),
        store.find_traces(&query).await.expect_err("search"),
    ];

    for error in errors {
        assert_eq!(error.status, 500);
        assert_eq!(error.data, Some(json!({"message": "storage unavailable"})));
    }
}

#[tokio::test]
async fn unreachable_provider_is_bad_gateway() {
    // Nothing listens on port 1.
    let store = store_for("http://127.0.0.1:1");

    let error = store.get_services().await.expect_err("connection refused");
    assert_eq!(error.status, 502);
    assert!(error.message.starts_with("transport error"));
}

#[tokio::test]
async fn undecodable_payload_is_bad_gateway() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/trace/abc")
        .with_status(200)
        .with_body("<html>not zipkin</html>")
        .create_async()
        .await;

    let error = store_for(&server.url())
        .get_trace("abc")
        .await
        .expect_err("html is not a trace");
    assert_eq!(error.status, 502);
}
