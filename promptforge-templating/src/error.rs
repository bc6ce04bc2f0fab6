//! Error types for template processing

use promptforge_common::{ErrorSeverity, Severity};
use thiserror::Error as ThisError;

/// Result type for templating operations
pub type Result<T> = std::result::Result<T, TemplatingError>;

/// Errors raised while checking prompt content for templating
///
/// Placeholder scanning itself cannot fail: the grammar is regular and any
/// text that does not match is literal by contract. Only the resource limits
/// produce errors.
#[derive(Debug, ThisError)]
pub enum TemplatingError {
    /// Content exceeds the maximum allowed length
    #[error("Content too large: {len} characters (max allowed: {max})")]
    ContentTooLarge {
        /// Actual content length in characters
        len: usize,
        /// The enforced maximum
        max: usize,
    },

    /// Content references more distinct variables than allowed
    #[error("Too many template variables: {count} (max allowed: {max})")]
    TooManyVariables {
        /// Distinct variable names found
        count: usize,
        /// The enforced maximum
        max: usize,
    },
}

impl Severity for TemplatingError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            TemplatingError::ContentTooLarge { .. } => ErrorSeverity::Error,
            TemplatingError::TooManyVariables { .. } => ErrorSeverity::Error,
        }
    }
}

impl From<TemplatingError> for promptforge_common::PromptForgeError {
    fn from(err: TemplatingError) -> Self {
        promptforge_common::PromptForgeError::validation("content", err.to_string())
    }
}
