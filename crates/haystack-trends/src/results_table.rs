// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Expandable per-operation trends table of a service.
//!
//! At most one row is expanded at a time. Expanding a row replaces whatever
//! was expanded before, collapsing clears the expansion.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::formatters::{
    column_label, format_count, format_duration, format_success_percent, success_health,
    SuccessHealth,
};
use crate::stats::{enrich_trends, EnrichedTrend, TrendStats};

/// The stats query the surrounding view navigated with.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsQuery {
    #[serde(default)]
    pub operation_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ExpansionState {
    #[default]
    Collapsed,
    Expanded(String),
}

/// What to render beneath the expanded row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendDetails {
    pub service_name: String,
    pub stats_type: String,
    pub service_summary: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRow {
    pub key: String,
    pub label: String,
    pub count: String,
    pub duration: String,
    pub success_percent: String,
    pub success_health: Option<SuccessHealth>,
    pub expanded: bool,
}

#[derive(Debug, Clone)]
pub struct ServiceResultsTable {
    service_name: String,
    state: ExpansionState,
}

impl ServiceResultsTable {
    /// Creates the table for `service_name`, expanding the operation named by
    /// `stats_query` right away when there is one.
    pub fn mount(service_name: impl Into<String>, stats_query: &StatsQuery) -> Self {
        let mut table = Self {
            service_name: service_name.into(),
            state: ExpansionState::Collapsed,
        };
        if let Some(operation) = stats_query
            .operation_name
            .as_deref()
            .filter(|op| !op.is_empty())
        {
            table.handle_expand(operation, true);
        }
        table
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn state(&self) -> &ExpansionState {
        &self.state
    }

    pub fn handle_expand(&mut self, row_key: impl Into<String>, is_expand: bool) {
        self.state = if is_expand {
            let row_key = row_key.into();
            debug!(service = %self.service_name, row = %row_key, "expanding trends row");
            ExpansionState::Expanded(row_key)
        } else {
            ExpansionState::Collapsed
        };
    }

    /// Keys of the expanded rows: empty or exactly one.
    pub fn expanding(&self) -> &[String] {
        match &self.state {
            ExpansionState::Collapsed => &[],
            ExpansionState::Expanded(key) => std::slice::from_ref(key),
        }
    }

    /// Keys of the selected rows. Selection always follows expansion.
    pub fn selected(&self) -> &[String] {
        self.expanding()
    }

    pub fn is_expanded(&self, row_key: &str) -> bool {
        matches!(&self.state, ExpansionState::Expanded(key) if key == row_key)
    }

    /// Details for `row`, only when it is the selected row.
    pub fn expand_component(&self, row: &EnrichedTrend) -> Option<TrendDetails> {
        self.is_expanded(&row.type_name).then(|| TrendDetails {
            service_name: self.service_name.clone(),
            stats_type: row.type_name.clone(),
            service_summary: true,
        })
    }

    pub fn rows(&self, stats: &[TrendStats]) -> Vec<TableRow> {
        enrich_trends(stats)
            .into_iter()
            .map(|trend| TableRow {
                expanded: self.is_expanded(&trend.type_name),
                label: column_label(&trend.type_name),
                count: format_count(trend.count),
                duration: format_duration(trend.last_tp99_duration),
                success_percent: format_success_percent(trend.success_percent),
                success_health: success_health(trend.success_percent),
                key: trend.type_name,
            })
            .collect()
    }
}
