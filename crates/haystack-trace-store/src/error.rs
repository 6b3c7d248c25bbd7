// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::error;

/// Failures talking to the tracing provider.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The provider answered with a non-2xx status.
    #[error("zipkin responded with status {status}")]
    Status { status: StatusCode, body: String },
    /// DNS, connect, TLS or timeout failure.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    /// The provider answered 2xx with a body that is not the expected JSON.
    #[error("failed to decode zipkin payload: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// The single error shape surfaced to callers of a trace store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
#[error("{message} (status {status})")]
pub struct ErrorEnvelope {
    /// HTTP status the failure should be reported with.
    pub status: u16,
    pub message: String,
    /// Provider response body, as JSON when it parses, otherwise as a string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl From<&StoreError> for ErrorEnvelope {
    fn from(err: &StoreError) -> Self {
        match err {
            StoreError::Status { status, body } => ErrorEnvelope {
                status: status.as_u16(),
                message: err.to_string(),
                data: response_data(body),
            },
            StoreError::Transport(e) => {
                let status = if e.is_timeout() {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    e.status().unwrap_or(StatusCode::BAD_GATEWAY)
                };
                ErrorEnvelope {
                    status: status.as_u16(),
                    message: err.to_string(),
                    data: None,
                }
            }
            StoreError::Decode(_) => ErrorEnvelope {
                status: StatusCode::BAD_GATEWAY.as_u16(),
                message: err.to_string(),
                data: None,
            },
            StoreError::InvalidConfig(_) => ErrorEnvelope {
                status: StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
                message: err.to_string(),
                data: None,
            },
        }
    }
}

impl From<StoreError> for ErrorEnvelope {
    fn from(err: StoreError) -> Self {
        ErrorEnvelope::from(&err)
    }
}

/// Logs a failed store operation and converts it to the envelope returned to callers.
pub fn normalize(operation: &str, err: StoreError) -> ErrorEnvelope {
    let envelope = ErrorEnvelope::from(&err);
    error!(
        operation = operation,
        status = envelope.status,
        "trace store request failed: {err}"
    );
    envelope
}

fn response_data(body: &str) -> Option<Value> {
    if body.trim().is_empty() {
        return None;
    }
    Some(serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string())))
}
