// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DataPoint {
    /// Milliseconds since epoch.
    pub timestamp: i64,
    pub value: f64,
}

/// Aggregated time series for one stats type (an operation, or the whole service).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendStats {
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default)]
    pub count_points: Vec<DataPoint>,
    /// tp99 latency in microseconds.
    #[serde(default)]
    pub tp99_duration_points: Vec<DataPoint>,
    #[serde(default)]
    pub success_percent_points: Vec<DataPoint>,
}

/// One table row worth of numbers derived from a [`TrendStats`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichedTrend {
    #[serde(rename = "type")]
    pub type_name: String,
    pub count: u64,
    pub last_tp99_duration: Option<f64>,
    pub success_percent: Option<f64>,
}

pub fn enrich_trends(stats: &[TrendStats]) -> Vec<EnrichedTrend> {
    stats.iter().map(enrich).collect()
}

fn enrich(stats: &TrendStats) -> EnrichedTrend {
    let count = stats
        .count_points
        .iter()
        .map(|p| p.value.max(0.0).round() as u64)
        .sum();
    let last_tp99_duration = stats
        .tp99_duration_points
        .iter()
        .max_by_key(|p| p.timestamp)
        .map(|p| p.value);
    let success_percent = if stats.success_percent_points.is_empty() {
        None
    } else {
        let total: f64 = stats.success_percent_points.iter().map(|p| p.value).sum();
        Some(total / stats.success_percent_points.len() as f64)
    };

    EnrichedTrend {
        type_name: stats.type_name.clone(),
        count,
        last_tp99_duration,
        success_percent,
    }
}
