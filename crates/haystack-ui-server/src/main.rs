// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

use haystack_trace_store::ZipkinTraceStore;
use haystack_ui_server::{config, ApiServer, ServerConfig};

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    let log_level = config::log_level_from_env();
    let env_filter = format!("h2=off,hyper=off,rustls=off,{}", log_level);

    let subscriber = tracing_subscriber::fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_new(env_filter).context("could not parse log level in configuration")?,
        )
        .with_level(true)
        .with_thread_names(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .with_file(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    debug!("Logging subsystem enabled");

    let config = match ServerConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            error!("Error creating config on Haystack API startup: {e}");
            return Err(e.into());
        }
    };

    let store = ZipkinTraceStore::new(&config.store).context("failed to create zipkin store")?;

    let server = ApiServer::new(Arc::clone(&config), Arc::new(store));
    if let Err(e) = server.start().await {
        error!("Error when running Haystack API: {e}");
        return Err(e.into());
    }
    Ok(())
}
