// Copyright 2023-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use haystack_trace_store::StoreError;

/// Errors that can occur when configuring or running the API server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to create trace store: {0}")]
    Store(#[from] StoreError),

    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = ServerError::InvalidConfig("port must be greater than 0".to_string());
        assert_eq!(
            error.to_string(),
            "Invalid configuration: port must be greater than 0"
        );
    }

    #[test]
    fn test_store_error_is_wrapped() {
        let error = ServerError::from(StoreError::InvalidConfig("no url".to_string()));
        assert_eq!(
            error.to_string(),
            "Failed to create trace store: Invalid configuration: no url"
        );
    }
}
