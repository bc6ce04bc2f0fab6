//! Error types for PromptForge Common
//!
//! This module provides structured error handling for operations throughout
//! the PromptForge ecosystem. It contains the core infrastructure errors that
//! are shared across all PromptForge crates; domain crates define their own
//! error enums and convert into these types at crate boundaries.

use std::fmt;
use thiserror::Error as ThisError;

use crate::quota::QuotaExceeded;

/// Severity levels for error classification
///
/// These levels categorize errors by impact and urgency, enabling appropriate
/// handling, logging, and user notification strategies.
///
/// # Severity Levels
///
/// - **Warning**: The request was refused for a recoverable, user-resolvable
///   reason (stale editor, exhausted quota). Nothing is wrong with the system.
/// - **Error**: Operation failed but the system can continue. The specific
///   operation cannot complete, but the system remains stable.
/// - **Critical**: System cannot continue, requires immediate attention.
///
/// # Examples
///
/// ```rust
/// use promptforge_common::ErrorSeverity;
///
/// // Warning: a conflicting edit blocks the save until the user reloads
/// let conflict = ErrorSeverity::Warning;
///
/// // Error: prompt not found prevents this operation but the system continues
/// let not_found = ErrorSeverity::Error;
///
/// // Critical: the persistence backend is failing
/// let storage = ErrorSeverity::Critical;
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Refused for a recoverable reason; the user can resolve and retry
    ///
    /// # Examples
    /// - Concurrent-edit conflicts (reload to resolve)
    /// - Exhausted analysis quota (retry after the window resets)
    Warning,

    /// Operation failed but system can continue
    ///
    /// # Examples
    /// - Prompt, version, or share not found
    /// - Field validation failures
    /// - Authorization refusals
    Error,

    /// System cannot continue, requires immediate attention
    ///
    /// # Examples
    /// - Persistence backend failures
    Critical,
}

/// Trait for error types that have severity levels
///
/// All PromptForge error types implement this trait so callers can pick
/// logging levels and user-facing presentation consistently across crates.
///
/// # Example
///
/// ```rust
/// use promptforge_common::{ErrorSeverity, Severity};
///
/// #[derive(Debug)]
/// enum MyError {
///     BackendDown,
///     NotFound,
///     StaleView,
/// }
///
/// impl Severity for MyError {
///     fn severity(&self) -> ErrorSeverity {
///         match self {
///             MyError::BackendDown => ErrorSeverity::Critical,
///             MyError::NotFound => ErrorSeverity::Error,
///             MyError::StaleView => ErrorSeverity::Warning,
///         }
///     }
/// }
///
/// assert_eq!(MyError::BackendDown.severity(), ErrorSeverity::Critical);
/// ```
pub trait Severity {
    /// Get the severity level of this error
    fn severity(&self) -> ErrorSeverity;
}

/// Result type alias for PromptForge operations
pub type Result<T> = std::result::Result<T, PromptForgeError>;

/// Common error types for PromptForge operations
///
/// This enum contains the error kinds that cross crate boundaries. Each kind
/// stays distinct: authentication is never folded into authorization, and the
/// named share-authorization refusals keep their identity when they arrive
/// here via the domain error conversions.
#[derive(Debug, ThisError)]
#[non_exhaustive]
pub enum PromptForgeError {
    /// No authenticated session; the caller must sign in again
    #[error("Session expired: sign in again to continue")]
    SessionExpired,

    /// Prompt not found
    #[error("Prompt not found: {0}")]
    PromptNotFound(String),

    /// Version not found for a prompt
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    /// Share grant not found
    #[error("Share not found")]
    ShareNotFound,

    /// A field failed validation
    #[error("Validation failed for {field}: {message}")]
    Validation {
        /// The field that failed validation
        field: String,
        /// The constraint that was violated
        message: String,
    },

    /// An authorization rule refused the operation
    #[error("Not authorized: {message}")]
    Authorization {
        /// Which rule refused and why
        message: String,
    },

    /// A concurrent edit was detected; save refused until reload or explicit overwrite
    #[error("Concurrent edit detected: {message}")]
    Conflict {
        /// What changed underneath the caller
        message: String,
    },

    /// Analysis quota exhausted for a window
    #[error(transparent)]
    Quota(#[from] QuotaExceeded),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{message}")]
    Context {
        /// The error message providing context
        message: String,
        #[source]
        /// The underlying error that caused this error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Other error with custom message
    #[error("{message}")]
    Other {
        /// Custom error message
        message: String,
    },
}

impl PromptForgeError {
    /// Create a prompt not found error
    pub fn prompt_not_found(id: impl fmt::Display) -> Self {
        PromptForgeError::PromptNotFound(id.to_string())
    }

    /// Create a version not found error
    pub fn version_not_found(version: impl fmt::Display) -> Self {
        PromptForgeError::VersionNotFound(version.to_string())
    }

    /// Create a validation error for a named field
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        PromptForgeError::Validation {
            field: field.to_string(),
            message: message.into(),
        }
    }

    /// Create an authorization error
    pub fn authorization(message: impl Into<String>) -> Self {
        PromptForgeError::Authorization {
            message: message.into(),
        }
    }

    /// Create a conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        PromptForgeError::Conflict {
            message: message.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<String>) -> Self {
        PromptForgeError::Storage(message.into())
    }

    /// Create a new other error
    pub fn other(message: impl Into<String>) -> Self {
        PromptForgeError::Other {
            message: message.into(),
        }
    }

    /// Check if this error is a not-found kind
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PromptForgeError::PromptNotFound(_)
                | PromptForgeError::VersionNotFound(_)
                | PromptForgeError::ShareNotFound
        )
    }

    /// Check if this error is a concurrent-edit conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, PromptForgeError::Conflict { .. })
    }
}

/// Severity classification for PromptForgeError
///
/// - **Critical**: persistence backend failures (Storage)
/// - **Error**: failed operations the system recovers from (not-found kinds,
///   validation, authentication, authorization, serialization, wrapped errors)
/// - **Warning**: advisory refusals the user resolves themselves (Conflict,
///   Quota)
impl Severity for PromptForgeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            // Critical: the backend is failing, every write is at risk
            PromptForgeError::Storage(_) => ErrorSeverity::Critical,

            // Error: operation failed but system can continue
            PromptForgeError::SessionExpired => ErrorSeverity::Error,
            PromptForgeError::PromptNotFound(_) => ErrorSeverity::Error,
            PromptForgeError::VersionNotFound(_) => ErrorSeverity::Error,
            PromptForgeError::ShareNotFound => ErrorSeverity::Error,
            PromptForgeError::Validation { .. } => ErrorSeverity::Error,
            PromptForgeError::Authorization { .. } => ErrorSeverity::Error,
            PromptForgeError::Json(_) => ErrorSeverity::Error,
            PromptForgeError::Context { .. } => ErrorSeverity::Error,
            PromptForgeError::Other { .. } => ErrorSeverity::Error,

            // Warning: advisory refusals, resolvable by the user
            PromptForgeError::Conflict { .. } => ErrorSeverity::Warning,
            PromptForgeError::Quota(_) => ErrorSeverity::Warning,
        }
    }
}

/// Extension trait for adding context to errors
pub trait ErrorContext<T> {
    /// Add context to an error
    fn context<S: Into<String>>(self, msg: S) -> Result<T>;

    /// Add context with a closure that's only called on error
    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<S: Into<String>>(self, msg: S) -> Result<T> {
        self.map_err(|e| PromptForgeError::Context {
            message: msg.into(),
            source: Box::new(e),
        })
    }

    fn with_context<F, S>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> S,
        S: Into<String>,
    {
        self.map_err(|e| PromptForgeError::Context {
            message: f().into(),
            source: Box::new(e),
        })
    }
}

/// Error chain formatter for detailed error reporting
pub struct ErrorChain<'a>(&'a dyn std::error::Error);

impl fmt::Display for ErrorChain<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Error: {}", self.0)?;

        let mut current = self.0.source();
        let mut level = 1;

        while let Some(err) = current {
            writeln!(f, "{:indent$}Caused by: {}", "", err, indent = level * 2)?;
            current = err.source();
            level += 1;
        }

        Ok(())
    }
}

/// Extension trait for error types to format the full error chain
pub trait ErrorChainExt {
    /// Format the full error chain
    fn error_chain(&self) -> ErrorChain<'_>;
}

impl<E: std::error::Error> ErrorChainExt for E {
    fn error_chain(&self) -> ErrorChain<'_> {
        ErrorChain(self)
    }
}
