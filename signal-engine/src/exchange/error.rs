//! Market data errors

use thiserror::Error;

/// Failure of a remote market-data call
#[derive(Error, Debug)]
pub enum DataFetchError {
    #[error("HTTP request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    #[error("API returned error: {code} - {message}")]
    Api { code: i64, message: String },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Authentication rejected: {0}")]
    Auth(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),
}

impl DataFetchError {
    /// Classify a transport error, separating timeouts from other failures
    pub fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DataFetchError::Timeout
        } else {
            DataFetchError::Http(err)
        }
    }

    /// Map a non-zero Bybit `retCode`
    pub fn from_ret_code(code: i64, message: String) -> Self {
        match code {
            10006 | 10018 => DataFetchError::RateLimited,
            10003 | 10004 | 10005 | 33004 => DataFetchError::Auth(message),
            10001 => DataFetchError::InvalidParams(message),
            _ => DataFetchError::Api { code, message },
        }
    }

    /// Whether retrying the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            DataFetchError::Http(_) | DataFetchError::Timeout | DataFetchError::RateLimited => true,
            DataFetchError::Status(status) => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}
