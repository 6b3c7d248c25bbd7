// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Translation of UI search queries into the Zipkin v1 `/traces` query dialect.
//!
//! Numeric inputs are parsed leniently: a missing or malformed `startTime`,
//! `endTime` or `limit` never raises an error, the derived parameter is simply
//! left out of the outgoing query (or replaced by its default, for `limit`).

use std::fmt;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Number of traces requested when the query does not carry a usable limit.
pub const DEFAULT_RESULTS_LIMIT: i64 = 40;

/// Span name Zipkin interprets as "any operation".
pub const ALL_SPANS: &str = "all";

/// Subtracted from `endTime` before it is sent as `endTs`, in microseconds.
const END_TS_LOOKBACK_PAD_MICROS: f64 = 30_000_000.0;

/// Characters left untouched by `encodeURIComponent`; everything else is escaped.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub const SERVICE_NAME: &str = "serviceName";
pub const OPERATION_NAME: &str = "operationName";
pub const START_TIME: &str = "startTime";
pub const END_TIME: &str = "endTime";
pub const LIMIT: &str = "limit";

/// Keys with a dedicated Zipkin parameter. They never appear in the annotation query.
pub fn is_reserved_field(key: &str) -> bool {
    matches!(
        key,
        SERVICE_NAME | OPERATION_NAME | START_TIME | END_TIME | LIMIT
    )
}

/// A search issued by the UI: well-known fields plus free-form annotation filters.
///
/// Keys keep their insertion order. Setting a key that is already present
/// replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchQuery {
    params: Vec<(String, String)>,
}

impl SearchQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses an `application/x-www-form-urlencoded` query string, as sent by the UI.
    pub fn from_query_string(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .into_owned()
            .collect()
    }

    /// Builder-style [`SearchQuery::set`].
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.params.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.params.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Looks up `key` comparing names case-insensitively; the first match wins.
    pub fn get_ignoring_case(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.get(SERVICE_NAME)
    }

    pub fn operation_name(&self) -> Option<&str> {
        self.get(OPERATION_NAME)
    }
}

impl<K, V> FromIterator<(K, V)> for SearchQuery
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = SearchQuery::new();
        for (key, value) in iter {
            query.set(key, value);
        }
        query
    }
}

/// Query parameters ready to be appended to a Zipkin `/traces` request.
///
/// Only fields that carry a value are present; `Display` renders the
/// percent-encoded `key=value&...` form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedQuery {
    params: Vec<(&'static str, String)>,
}

impl MappedQuery {
    fn push(&mut self, key: &'static str, value: Option<String>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.params.push((key, value));
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn keys(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.params.iter().map(|(k, _)| *k)
    }
}

impl fmt::Display for MappedQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str("&")?;
            }
            write!(f, "{}={}", encode_component(key), encode_component(value))?;
        }
        Ok(())
    }
}

/// Renders every non-reserved, non-empty filter as `key=value`, joined by single spaces.
///
/// Each key and value is escaped individually; the joined string is escaped
/// again when it becomes the `annotationQuery` parameter.
pub fn build_annotation_query(query: &SearchQuery) -> String {
    query
        .iter()
        .filter(|(key, value)| !value.is_empty() && !is_reserved_field(key))
        .map(|(key, value)| format!("{}={}", encode_component(key), encode_component(value)))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Maps a UI search onto Zipkin's `serviceName`, `spanName`, `annotationQuery`,
/// `endTs`, `lookback` and `limit` parameters.
///
/// `endTs` is `endTime` minus a 30 second pad and `lookback` is the window
/// length, both converted from microseconds to milliseconds. Either is
/// omitted when a bound is missing or unparseable, or when it works out to zero.
///
/// Window arithmetic is done in `f64`, so bounds of any magnitude map to a
/// number instead of overflowing.
pub fn map_query_params(query: &SearchQuery) -> MappedQuery {
    let start_time = parse_int(query.get(START_TIME));
    let end_time = parse_int(query.get(END_TIME));

    let end_ts = end_time.map(|end| end - END_TS_LOOKBACK_PAD_MICROS);
    let lookback = start_time.zip(end_time).map(|(start, end)| end - start);
    let limit = parse_int(query.get(LIMIT))
        .and_then(format_number)
        .unwrap_or_else(|| DEFAULT_RESULTS_LIMIT.to_string());

    let mut mapped = MappedQuery::default();
    mapped.push(SERVICE_NAME, query.service_name().map(str::to_string));
    mapped.push(
        "spanName",
        Some(
            query
                .operation_name()
                .filter(|name| !name.is_empty())
                .unwrap_or(ALL_SPANS)
                .to_string(),
        ),
    );
    mapped.push("annotationQuery", Some(build_annotation_query(query)));
    mapped.push("endTs", end_ts.and_then(micros_to_millis));
    mapped.push("lookback", lookback.and_then(micros_to_millis));
    mapped.push(LIMIT, Some(limit));
    mapped
}

pub fn encode_component(value: &str) -> String {
    utf8_percent_encode(value, URI_COMPONENT).to_string()
}

/// Lenient integer parse: leading whitespace, an optional sign, then the
/// longest run of decimal digits. Trailing garbage is ignored.
///
/// Digit runs too long for an integer type still parse, losing precision
/// the same way a JavaScript number does.
fn parse_int(value: Option<&str>) -> Option<f64> {
    let trimmed = value?.trim_start();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let digits_end = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(unsigned.len());
    let digits = &unsigned[..digits_end];
    if digits.is_empty() {
        return None;
    }
    let magnitude = digits.parse::<f64>().ok()?;
    Some(if negative { -magnitude } else { magnitude })
}

fn micros_to_millis(micros: f64) -> Option<String> {
    // Sub-millisecond remainders are kept as a fraction, e.g. `1000.5`.
    format_number(micros / 1000.0)
}

/// Renders `value` the way it appears on the wire (`1000`, `1000.5`).
/// Zero carries no information for Zipkin and is dropped like a missing
/// value, as is anything that is not finite.
fn format_number(value: f64) -> Option<String> {
    if value == 0.0 || !value.is_finite() {
        return None;
    }
    Some(value.to_string())
}
