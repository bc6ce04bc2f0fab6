//! Analysis error types
//!
//! Failures callers react to differently stay distinct: a timeout suggests
//! retrying, a rate limit says when, an oversize prompt needs shortening,
//! and a malformed response is a service bug worth reporting.

use promptforge_common::{ErrorSeverity, PromptForgeError, QuotaExceeded, QuotaWindow, Severity};
use std::time::Duration;
use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Errors produced by prompt analysis
#[derive(Debug, Clone, Error)]
pub enum AnalysisError {
    /// The analysis request exceeded the client timeout
    #[error("Analysis request timed out after {}s", after.as_secs())]
    Timeout {
        /// How long the client waited
        after: Duration,
    },

    /// The analysis quota is exhausted
    #[error("Analysis rate limited: {window} quota exhausted, retry in {}s", retry_after.as_secs())]
    RateLimited {
        /// Which quota window ran out
        window: QuotaWindow,
        /// How long until that window resets
        retry_after: Duration,
    },

    /// The prompt content exceeds the analysis size limit
    #[error("Prompt content is too large for analysis: {len} characters (limit {max})")]
    ContentTooLarge {
        /// Content length in characters
        len: usize,
        /// Maximum analyzable length in characters
        max: usize,
    },

    /// The service response could not be parsed as an analysis
    #[error("Analysis response could not be parsed: {message}")]
    InvalidResponse {
        /// What went wrong while parsing
        message: String,
    },

    /// The service answered with a non-success status
    #[error("Analysis service returned HTTP {status}: {message}")]
    Http {
        /// HTTP status code
        status: u16,
        /// Response body, truncated
        message: String,
    },

    /// The request never completed
    #[error("Analysis request failed: {0}")]
    Transport(String),
}

impl Severity for AnalysisError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            // Quota exhaustion is expected operation, not a fault
            AnalysisError::RateLimited { .. } => ErrorSeverity::Warning,
            AnalysisError::Timeout { .. } => ErrorSeverity::Warning,
            _ => ErrorSeverity::Error,
        }
    }
}

impl From<QuotaExceeded> for AnalysisError {
    fn from(quota: QuotaExceeded) -> Self {
        AnalysisError::RateLimited {
            window: quota.window,
            retry_after: quota.retry_after,
        }
    }
}

impl From<AnalysisError> for PromptForgeError {
    fn from(error: AnalysisError) -> Self {
        PromptForgeError::Context {
            message: "Prompt analysis failed".to_string(),
            source: Box::new(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_display_messages() {
        let error = AnalysisError::Timeout {
            after: Duration::from_secs(55),
        };
        assert_eq!(error.to_string(), "Analysis request timed out after 55s");

        let error = AnalysisError::RateLimited {
            window: QuotaWindow::Minute,
            retry_after: Duration::from_secs(42),
        };
        assert_eq!(
            error.to_string(),
            "Analysis rate limited: minute quota exhausted, retry in 42s"
        );

        let error = AnalysisError::ContentTooLarge {
            len: 50_001,
            max: 50_000,
        };
        assert!(error.to_string().contains("50001 characters (limit 50000)"));
    }

    #[test]
    fn test_severity_classification() {
        let rate_limited = AnalysisError::RateLimited {
            window: QuotaWindow::Day,
            retry_after: Duration::from_secs(1),
        };
        assert_eq!(rate_limited.severity(), ErrorSeverity::Warning);

        let timeout = AnalysisError::Timeout {
            after: Duration::from_secs(1),
        };
        assert_eq!(timeout.severity(), ErrorSeverity::Warning);

        let http = AnalysisError::Http {
            status: 500,
            message: "boom".to_string(),
        };
        assert_eq!(http.severity(), ErrorSeverity::Error);
    }

    #[test]
    fn test_quota_exceeded_conversion() {
        let quota = QuotaExceeded {
            window: QuotaWindow::Day,
            resets_at: Utc::now(),
            retry_after: Duration::from_secs(3600),
        };
        let error: AnalysisError = quota.into();
        match error {
            AnalysisError::RateLimited {
                window,
                retry_after,
            } => {
                assert_eq!(window, QuotaWindow::Day);
                assert_eq!(retry_after, Duration::from_secs(3600));
            }
            other => panic!("Expected RateLimited, got: {other:?}"),
        }
    }

    #[test]
    fn test_error_chains_into_forge_error() {
        let error: PromptForgeError = AnalysisError::Transport("connection refused".to_string()).into();
        let display = error.to_string();
        assert!(display.contains("Prompt analysis failed"));
        assert!(std::error::Error::source(&error).is_some());
    }
}
