// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use std::io;
use std::sync::Arc;

use haystack_trace_store::TraceStore;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::api;
use crate::config::ServerConfig;
use crate::error::ServerError;

pub struct ApiServer {
    pub config: Arc<ServerConfig>,
    pub store: Arc<dyn TraceStore>,
}

impl ApiServer {
    pub fn new(config: Arc<ServerConfig>, store: Arc<dyn TraceStore>) -> Self {
        Self { config, store }
    }

    /// Binds the configured address and serves requests until the listener fails.
    pub async fn start(&self) -> Result<(), ServerError> {
        let addr = self.config.bind_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        info!("Haystack API listening on {addr}, zipkin at {}", self.config.store.zipkin_url);
        self.serve(listener).await
    }

    /// Serves every accepted connection on its own task.
    pub async fn serve(&self, listener: TcpListener) -> Result<(), ServerError> {
        let store = Arc::clone(&self.store);
        let service = service_fn(move |req: hyper::Request<hyper::body::Incoming>| {
            let store = Arc::clone(&store);
            async move { api::handle_request(store.as_ref(), req.method(), req.uri()).await }
        });

        let server = hyper::server::conn::http1::Builder::new();
        let mut joinset = tokio::task::JoinSet::new();

        loop {
            let conn = tokio::select! {
                con_res = listener.accept() => match con_res {
                    Err(e)
                        if matches!(
                            e.kind(),
                            io::ErrorKind::ConnectionAborted
                                | io::ErrorKind::ConnectionReset
                                | io::ErrorKind::ConnectionRefused
                        ) =>
                    {
                        continue;
                    }
                    Err(e) => {
                        error!("Server error: {e}");
                        return Err(e.into());
                    }
                    Ok((conn, peer)) => {
                        debug!("Accepted connection from {peer}");
                        conn
                    }
                },
                finished = async {
                    match joinset.join_next().await {
                        Some(finished) => finished,
                        None => std::future::pending().await,
                    }
                } => match finished {
                    Err(e) if e.is_panic() => {
                        // Don't kill server on panic - log and continue
                        error!("Connection handler panicked: {:?}", e);
                        continue;
                    },
                    Ok(()) | Err(_) => continue,
                },
            };
            let conn = TokioIo::new(conn);
            let server = server.clone();
            let service = service.clone();
            joinset.spawn(async move {
                if let Err(e) = server.serve_connection(conn, service).await {
                    error!("Connection error: {e}");
                }
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use haystack_trace_store::{ErrorEnvelope, SearchQuery, SearchResult, StoreConfig, Trace};
    use serde_json::Value;

    struct StaticStore;

    #[async_trait::async_trait]
    impl TraceStore for StaticStore {
        async fn get_services(&self) -> Result<Vec<String>, ErrorEnvelope> {
            Ok(vec!["frontend".to_string()])
        }
        async fn get_operations(&self, _: &str) -> Result<Vec<String>, ErrorEnvelope> {
            Ok(vec![])
        }
        async fn get_trace(&self, _: &str) -> Result<Trace, ErrorEnvelope> {
            Ok(vec![])
        }
        async fn get_raw_trace(&self, _: &str) -> Result<Value, ErrorEnvelope> {
            Ok(Value::Null)
        }
        async fn get_raw_span(&self, _: &str, _: &str) -> Result<Value, ErrorEnvelope> {
            Ok(Value::Null)
        }
        async fn find_traces(&self, _: &SearchQuery) -> Result<Vec<SearchResult>, ErrorEnvelope> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn test_serves_api_over_tcp() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let config = Arc::new(ServerConfig::new(StoreConfig::new("http://zipkin:9411")));
        let server = ApiServer::new(config, Arc::new(StaticStore));
        tokio::spawn(async move { server.serve(listener).await });

        let services: Vec<String> = reqwest::get(format!("http://{addr}/api/services"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(services, vec!["frontend"]);

        let response = reqwest::get(format!("http://{addr}/nowhere")).await.unwrap();
        assert_eq!(response.status().as_u16(), 404);
    }
}
