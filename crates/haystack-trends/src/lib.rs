// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! View model of the per-operation trends panel shown for a service.

#![cfg_attr(not(test), deny(clippy::panic))]
#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![cfg_attr(not(test), deny(clippy::expect_used))]

pub mod formatters;
pub mod results_table;
pub mod stats;

pub use results_table::{ExpansionState, ServiceResultsTable, StatsQuery, TableRow, TrendDetails};
pub use stats::{enrich_trends, DataPoint, EnrichedTrend, TrendStats};
