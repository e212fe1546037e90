//! Custom error types for hotelmatch.
//!
//! All fallible operations return `Result<T, RecommenderError>`. Oracle
//! failures are split into transport errors (network, HTTP status, timeout)
//! and output errors (text that does not parse), because the retry loop in
//! [`crate::oracle`] treats them differently.

use std::time::Duration;
use thiserror::Error;

/// Main error type for hotelmatch operations.
#[derive(Debug, Error)]
pub enum RecommenderError {
    /// Network/HTTP request error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// LLM endpoint returned a non-success status
    #[error("API error: {code} - {message}")]
    Api {
        /// HTTP status code
        code: u16,
        /// Response body or status text
        message: String,
    },

    /// A single oracle call exceeded its deadline
    #[error("Oracle call timed out after {0:?}")]
    Timeout(Duration),

    /// Transport kept failing until the retry budget ran out
    #[error("Oracle unavailable for {task} after {attempts} attempts: {reason}")]
    OracleUnavailable {
        task: &'static str,
        attempts: u32,
        reason: String,
    },

    /// The oracle kept answering with text that could not be parsed
    #[error("Malformed {task} output after {attempts} attempts")]
    MalformedOutput {
        task: &'static str,
        attempts: u32,
        /// Last raw oracle text
        raw: String,
    },

    /// The ranking answer could not be parsed; `raw` is the best-effort
    /// fallback text
    #[error("Hotel ranking output could not be parsed after {attempts} attempts")]
    RankingUnparsed { attempts: u32, raw: String },

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reading/writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Input data did not have the expected shape
    #[error("Validation error: {0}")]
    Validation(String),
}

impl RecommenderError {
    /// Whether a transport failure is worth another attempt.
    ///
    /// Rate limiting and server-side errors are; authentication and malformed
    /// requests are not, since repeating an identical request cannot fix them.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Timeout(_) => true,
            Self::Api { code, .. } => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Result type alias using `RecommenderError`
pub type Result<T> = std::result::Result<T, RecommenderError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_statuses() {
        let rate_limited = RecommenderError::Api {
            code: 429,
            message: "slow down".to_string(),
        };
        let unauthorized = RecommenderError::Api {
            code: 401,
            message: "bad key".to_string(),
        };
        let overloaded = RecommenderError::Api {
            code: 503,
            message: "busy".to_string(),
        };

        assert!(rate_limited.is_retryable());
        assert!(overloaded.is_retryable());
        assert!(!unauthorized.is_retryable());
        assert!(RecommenderError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!RecommenderError::Config("x".to_string()).is_retryable());
    }
}
