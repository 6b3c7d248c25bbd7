// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Cell formatting for the trends table.

use serde::Serialize;

/// Shown in place of a value the stats do not provide.
pub const MISSING_VALUE: &str = "–";

/// Stats type covering every operation of the service.
pub const SERVICE_SUMMARY_TYPE: &str = "*";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuccessHealth {
    Healthy,
    Warning,
    Critical,
}

pub fn column_label(type_name: &str) -> String {
    if type_name == SERVICE_SUMMARY_TYPE {
        "All operations".to_string()
    } else {
        type_name.to_string()
    }
}

/// `1234567` → `1,234,567`
pub fn format_count(count: u64) -> String {
    let digits = count.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Formats a duration given in microseconds with the largest unit that keeps it readable.
pub fn format_duration(micros: Option<f64>) -> String {
    match micros {
        None => MISSING_VALUE.to_string(),
        Some(us) if us < 1_000.0 => format!("{} µs", us.round()),
        Some(us) if us < 1_000_000.0 => format!("{} ms", (us / 1_000.0).round()),
        Some(us) => format!("{:.2} s", us / 1_000_000.0),
    }
}

pub fn format_success_percent(percent: Option<f64>) -> String {
    match percent {
        None => MISSING_VALUE.to_string(),
        Some(p) => format!("{p:.1}%"),
    }
}

pub fn success_health(percent: Option<f64>) -> Option<SuccessHealth> {
    percent.map(|p| {
        if p >= 99.0 {
            SuccessHealth::Healthy
        } else if p >= 95.0 {
            SuccessHealth::Warning
        } else {
            SuccessHealth::Critical
        }
    })
}
