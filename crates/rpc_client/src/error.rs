//! Error types for status and block queries.

use thiserror::Error;

/// Errors that can occur while querying a remote status endpoint.
#[derive(Error, Debug)]
pub enum RpcError {
    /// The endpoint could not be turned into a request URL.
    #[error("Invalid endpoint '{endpoint}': {message}")]
    InvalidEndpoint {
        /// Endpoint as supplied by the operator.
        endpoint: String,
        /// Parser message.
        message: String,
    },

    /// Request failed before a response body was received.
    #[error("Request failed: {message}")]
    RequestFailed {
        /// Error message.
        message: String,
    },

    /// Response arrived but did not have the expected shape.
    #[error("Invalid response: {message}")]
    InvalidResponse {
        /// Error message.
        message: String,
    },

    /// The chain has fewer blocks than the trust safety margin.
    #[error("Chain too young: latest height {latest_height} is within the safety margin of {safety_margin} blocks")]
    ChainTooYoung {
        /// Latest height reported by the endpoint.
        latest_height: u64,
        /// Margin subtracted from the latest height.
        safety_margin: u64,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl RpcError {
    /// Create a request failed error.
    pub fn request_failed<S: Into<String>>(message: S) -> Self {
        Self::RequestFailed {
            message: message.into(),
        }
    }

    /// Create an invalid response error.
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    /// Create an invalid endpoint error.
    pub fn invalid_endpoint<E: Into<String>, S: Into<String>>(endpoint: E, message: S) -> Self {
        Self::InvalidEndpoint {
            endpoint: endpoint.into(),
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for RpcError {
    fn from(err: reqwest::Error) -> Self {
        Self::request_failed(err.to_string())
    }
}

/// Result type for status and block queries.
pub type RpcResult<T> = std::result::Result<T, RpcError>;
