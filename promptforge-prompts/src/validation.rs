//! Field validation for prompt payloads
//!
//! Length limits are counted in characters, not bytes, so multibyte text
//! is not penalized. Every check reports the offending field by name so
//! callers can surface errors next to the right input.

use once_cell::sync::Lazy;
use promptforge_common::PromptForgeError;
use promptforge_templating::{
    check_content_len, check_variable_count, is_valid_variable_name, NamePolicy, TemplatingError,
};
use regex::Regex;
use std::collections::HashSet;
use thiserror::Error;

use crate::model::{CreatePrompt, UpdatePrompt, Variable, VariableKind};

/// Maximum title length in characters
pub const MAX_TITLE_LEN: usize = 200;

/// Maximum description length in characters
pub const MAX_DESCRIPTION_LEN: usize = 3_000;

/// Maximum number of tags per prompt
pub const MAX_TAGS: usize = 20;

/// Maximum tag length in characters
pub const MAX_TAG_LEN: usize = 50;

/// Maximum variable name length in characters
pub const MAX_VARIABLE_NAME_LEN: usize = 100;

/// Maximum variable default value length in characters
pub const MAX_DEFAULT_VALUE_LEN: usize = 1_000;

/// Maximum variable help text length in characters
pub const MAX_HELP_TEXT_LEN: usize = 500;

/// Maximum variable validation pattern length in characters
pub const MAX_PATTERN_LEN: usize = 200;

/// Maximum option count for enum variables
pub const MAX_ENUM_OPTIONS: usize = 50;

/// Maximum option length in characters
pub const MAX_OPTION_LEN: usize = 100;

static TAG_CHARSET: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9 _-]+$").unwrap());

/// A single rejected field
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was empty or missing
    #[error("{field} is required")]
    Required {
        /// The empty field
        field: String,
    },

    /// A field fell outside its length range
    #[error("{field} must be between {min} and {max} characters, got {actual}")]
    LengthOutOfRange {
        /// The offending field
        field: String,
        /// Minimum length in characters
        min: usize,
        /// Maximum length in characters
        max: usize,
        /// Observed length in characters
        actual: usize,
    },

    /// A field exceeded its maximum length
    #[error("{field} must be at most {max} characters, got {actual}")]
    TooLong {
        /// The offending field
        field: String,
        /// Maximum length in characters
        max: usize,
        /// Observed length in characters
        actual: usize,
    },

    /// A collection exceeded its maximum size
    #[error("{field} allows at most {max} items, got {actual}")]
    TooManyItems {
        /// The offending field
        field: String,
        /// Maximum item count
        max: usize,
        /// Observed item count
        actual: usize,
    },

    /// A field contained characters outside its allowed set
    #[error("{field} '{value}' contains invalid characters (allowed: {allowed})")]
    InvalidCharacters {
        /// The offending field
        field: String,
        /// The rejected value
        value: String,
        /// Human-readable description of the allowed set
        allowed: &'static str,
    },

    /// A validation pattern failed to compile
    #[error("{field} is not a valid regular expression: {error}")]
    InvalidPattern {
        /// The offending field
        field: String,
        /// The regex compile error
        error: String,
    },

    /// An enum variable was declared without options
    #[error("{field} requires at least one option for enum variables")]
    MissingOptions {
        /// The offending field
        field: String,
    },

    /// A collection contained the same entry twice
    #[error("{field} contains duplicate entry '{value}'")]
    DuplicateItem {
        /// The offending field
        field: String,
        /// The duplicated value
        value: String,
    },
}

impl ValidationError {
    /// The field this error refers to
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::LengthOutOfRange { field, .. }
            | ValidationError::TooLong { field, .. }
            | ValidationError::TooManyItems { field, .. }
            | ValidationError::InvalidCharacters { field, .. }
            | ValidationError::InvalidPattern { field, .. }
            | ValidationError::MissingOptions { field }
            | ValidationError::DuplicateItem { field, .. } => field,
        }
    }
}

impl From<ValidationError> for PromptForgeError {
    fn from(error: ValidationError) -> Self {
        PromptForgeError::Validation {
            field: error.field().to_string(),
            message: error.to_string(),
        }
    }
}

/// Validate a prompt title
pub fn validate_title(title: &str) -> Result<(), ValidationError> {
    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::Required {
            field: "title".to_string(),
        });
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::LengthOutOfRange {
            field: "title".to_string(),
            min: 1,
            max: MAX_TITLE_LEN,
            actual: len,
        });
    }
    Ok(())
}

/// Validate an optional prompt description
pub fn validate_description(description: Option<&str>) -> Result<(), ValidationError> {
    if let Some(description) = description {
        let len = description.chars().count();
        if len > MAX_DESCRIPTION_LEN {
            return Err(ValidationError::TooLong {
                field: "description".to_string(),
                max: MAX_DESCRIPTION_LEN,
                actual: len,
            });
        }
    }
    Ok(())
}

/// Validate prompt content against the size and placeholder-count limits
pub fn validate_content(content: &str) -> Result<(), ValidationError> {
    if content.is_empty() {
        return Err(ValidationError::Required {
            field: "content".to_string(),
        });
    }
    check_content_len(content).map_err(|error| match error {
        TemplatingError::ContentTooLarge { len, max } => ValidationError::TooLong {
            field: "content".to_string(),
            max,
            actual: len,
        },
        TemplatingError::TooManyVariables { count, max } => ValidationError::TooManyItems {
            field: "content".to_string(),
            max,
            actual: count,
        },
    })?;
    check_variable_count(content).map_err(|error| match error {
        TemplatingError::TooManyVariables { count, max } => ValidationError::TooManyItems {
            field: "content".to_string(),
            max,
            actual: count,
        },
        TemplatingError::ContentTooLarge { len, max } => ValidationError::TooLong {
            field: "content".to_string(),
            max,
            actual: len,
        },
    })?;
    Ok(())
}

/// Validate a tag set
pub fn validate_tags(tags: &[String]) -> Result<(), ValidationError> {
    if tags.len() > MAX_TAGS {
        return Err(ValidationError::TooManyItems {
            field: "tags".to_string(),
            max: MAX_TAGS,
            actual: tags.len(),
        });
    }
    let mut seen = HashSet::new();
    for tag in tags {
        let len = tag.chars().count();
        if len == 0 || len > MAX_TAG_LEN {
            return Err(ValidationError::LengthOutOfRange {
                field: "tags".to_string(),
                min: 1,
                max: MAX_TAG_LEN,
                actual: len,
            });
        }
        if !TAG_CHARSET.is_match(tag) {
            return Err(ValidationError::InvalidCharacters {
                field: "tags".to_string(),
                value: tag.clone(),
                allowed: "letters, digits, spaces, hyphens, and underscores",
            });
        }
        if !seen.insert(tag.to_lowercase()) {
            return Err(ValidationError::DuplicateItem {
                field: "tags".to_string(),
                value: tag.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a single variable definition
///
/// Stored variable names follow the relaxed policy, which admits hyphens.
/// Names that only appear via strict extraction are a subset of these.
pub fn validate_variable(variable: &Variable) -> Result<(), ValidationError> {
    let name_len = variable.name.chars().count();
    if name_len == 0 || name_len > MAX_VARIABLE_NAME_LEN {
        return Err(ValidationError::LengthOutOfRange {
            field: "variable name".to_string(),
            min: 1,
            max: MAX_VARIABLE_NAME_LEN,
            actual: name_len,
        });
    }
    if !is_valid_variable_name(&variable.name, NamePolicy::Relaxed) {
        return Err(ValidationError::InvalidCharacters {
            field: "variable name".to_string(),
            value: variable.name.clone(),
            allowed: "letters, digits, underscores, and hyphens",
        });
    }

    if let Some(default) = &variable.default_value {
        let len = default.chars().count();
        if len > MAX_DEFAULT_VALUE_LEN {
            return Err(ValidationError::TooLong {
                field: format!("variable '{}' default value", variable.name),
                max: MAX_DEFAULT_VALUE_LEN,
                actual: len,
            });
        }
    }

    if let Some(help) = &variable.help_text {
        let len = help.chars().count();
        if len > MAX_HELP_TEXT_LEN {
            return Err(ValidationError::TooLong {
                field: format!("variable '{}' help text", variable.name),
                max: MAX_HELP_TEXT_LEN,
                actual: len,
            });
        }
    }

    if let Some(pattern) = &variable.pattern {
        let len = pattern.chars().count();
        if len > MAX_PATTERN_LEN {
            return Err(ValidationError::TooLong {
                field: format!("variable '{}' pattern", variable.name),
                max: MAX_PATTERN_LEN,
                actual: len,
            });
        }
        if let Err(error) = Regex::new(pattern) {
            return Err(ValidationError::InvalidPattern {
                field: format!("variable '{}' pattern", variable.name),
                error: error.to_string(),
            });
        }
    }

    if variable.kind == VariableKind::Enum {
        let options = variable.options.as_deref().unwrap_or_default();
        if options.is_empty() {
            return Err(ValidationError::MissingOptions {
                field: format!("variable '{}' options", variable.name),
            });
        }
        if options.len() > MAX_ENUM_OPTIONS {
            return Err(ValidationError::TooManyItems {
                field: format!("variable '{}' options", variable.name),
                max: MAX_ENUM_OPTIONS,
                actual: options.len(),
            });
        }
        for option in options {
            let len = option.chars().count();
            if len == 0 || len > MAX_OPTION_LEN {
                return Err(ValidationError::LengthOutOfRange {
                    field: format!("variable '{}' options", variable.name),
                    min: 1,
                    max: MAX_OPTION_LEN,
                    actual: len,
                });
            }
        }
    }

    Ok(())
}

/// Validate a variable set, including name uniqueness
pub fn validate_variables(variables: &[Variable]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for variable in variables {
        validate_variable(variable)?;
        if !seen.insert(variable.name.clone()) {
            return Err(ValidationError::DuplicateItem {
                field: "variables".to_string(),
                value: variable.name.clone(),
            });
        }
    }
    Ok(())
}

/// Validate a full create payload
pub fn validate_new_prompt(payload: &CreatePrompt) -> Result<(), ValidationError> {
    validate_title(&payload.title)?;
    validate_description(payload.description.as_deref())?;
    validate_content(&payload.content)?;
    validate_tags(&payload.tags)?;
    validate_variables(&payload.variables)?;
    Ok(())
}

/// Validate the present fields of an update payload
pub fn validate_update(payload: &UpdatePrompt) -> Result<(), ValidationError> {
    if let Some(title) = &payload.title {
        validate_title(title)?;
    }
    if let Some(description) = &payload.description {
        validate_description(Some(description))?;
    }
    if let Some(content) = &payload.content {
        validate_content(content)?;
    }
    if let Some(tags) = &payload.tags {
        validate_tags(tags)?;
    }
    if let Some(variables) = &payload.variables {
        validate_variables(variables)?;
    }
    Ok(())
}
