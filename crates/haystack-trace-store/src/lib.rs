// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Trace store for the Haystack UI backed by a Zipkin v1 server.
//!
//! - [`query`]: maps UI searches onto Zipkin's `/traces` parameters
//! - [`store`]: the [`TraceStore`] operations and the Zipkin implementation
//! - [`converter`]: Zipkin spans to the Haystack trace and search-result model
//! - [`error`]: transport failures normalized into an [`ErrorEnvelope`]

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]
#![cfg_attr(not(test), deny(clippy::todo))]
#![cfg_attr(not(test), deny(clippy::unimplemented))]

pub mod config;
pub mod converter;
pub mod error;
pub mod http;
pub mod model;
pub mod query;
pub mod store;

pub use config::StoreConfig;
pub use error::{ErrorEnvelope, StoreError};
pub use model::{SearchResult, Span, Trace};
pub use query::{build_annotation_query, map_query_params, MappedQuery, SearchQuery};
pub use store::{TraceStore, ZipkinTraceStore};
