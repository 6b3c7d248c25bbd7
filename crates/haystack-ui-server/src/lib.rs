// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! HTTP API exposing a [`haystack_trace_store::TraceStore`] to the Haystack UI.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod api;
pub mod config;
pub mod error;
pub mod server;

pub use config::ServerConfig;
pub use error::ServerError;
pub use server::ApiServer;
