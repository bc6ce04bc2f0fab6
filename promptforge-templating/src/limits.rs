//! Resource limits for prompt content
//!
//! Guards against oversized content and runaway variable counts before any
//! scanning or persistence happens. Lengths are measured in characters, not
//! bytes, matching what editors show users.

use crate::error::{Result, TemplatingError};
use crate::extractor::extract_variables_relaxed;

/// Maximum allowed prompt content length in characters
pub const MAX_CONTENT_LEN: usize = 200_000;

/// Maximum distinct variables referenced by one prompt
pub const MAX_TEMPLATE_VARIABLES: usize = 1_000;

/// Check that content fits within the storage limit
pub fn check_content_len(content: &str) -> Result<()> {
    let len = content.chars().count();
    if len > MAX_CONTENT_LEN {
        return Err(TemplatingError::ContentTooLarge {
            len,
            max: MAX_CONTENT_LEN,
        });
    }
    Ok(())
}

/// Check that content references an acceptable number of distinct variables
pub fn check_variable_count(content: &str) -> Result<()> {
    let count = count_placeholders(content);
    if count > MAX_TEMPLATE_VARIABLES {
        return Err(TemplatingError::TooManyVariables {
            count,
            max: MAX_TEMPLATE_VARIABLES,
        });
    }
    Ok(())
}

/// Count distinct variable names referenced by content
pub fn count_placeholders(content: &str) -> usize {
    extract_variables_relaxed(content).len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_at_limit_is_ok() {
        let content = "a".repeat(MAX_CONTENT_LEN);
        assert!(check_content_len(&content).is_ok());
    }

    #[test]
    fn test_content_over_limit_is_rejected() {
        let content = "a".repeat(MAX_CONTENT_LEN + 1);
        let result = check_content_len(&content);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("too large"));
    }

    #[test]
    fn test_length_is_measured_in_characters() {
        // Multibyte characters count once each
        let content = "é".repeat(MAX_CONTENT_LEN);
        assert!(content.len() > MAX_CONTENT_LEN);
        assert!(check_content_len(&content).is_ok());
    }

    #[test]
    fn test_count_placeholders_is_distinct() {
        assert_eq!(count_placeholders("{{a}} {{b}} {{a}}"), 2);
        assert_eq!(count_placeholders("no placeholders"), 0);
    }

    #[test]
    fn test_variable_count_over_limit_is_rejected() {
        let mut content = String::new();
        for i in 0..(MAX_TEMPLATE_VARIABLES + 1) {
            content.push_str(&format!("{{{{var_{i}}}}} "));
        }
        let result = check_variable_count(&content);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Too many"));
    }

    #[test]
    fn test_variable_count_at_limit_is_ok() {
        let mut content = String::new();
        for i in 0..MAX_TEMPLATE_VARIABLES {
            content.push_str(&format!("{{{{var_{i}}}}} "));
        }
        assert!(check_variable_count(&content).is_ok());
    }
}
