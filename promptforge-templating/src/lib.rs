//! # PromptForge Templating
//!
//! Variable extraction and template rendering for PromptForge prompts.
//!
//! Prompts reference variables as `{{name}}` placeholders. This crate scans
//! content for those references and renders previews by substituting values
//! with default fallback. Everything here is a pure function over strings:
//! no caching, no I/O, no logging.
//!
//! ## Modules
//!
//! - [`extractor`] - Scan content for distinct variable names
//! - [`renderer`] - Substitute placeholders with supplied values or defaults
//! - [`limits`] - Content size and variable count guards
//! - [`error`] - Templating error types

pub mod error;
pub mod extractor;
pub mod limits;
pub mod renderer;

// Re-export the templating surface for convenience
pub use error::{Result, TemplatingError};
pub use extractor::{
    extract_variables, extract_variables_relaxed, is_valid_variable_name, NamePolicy,
};
pub use limits::{
    check_content_len, check_variable_count, count_placeholders, MAX_CONTENT_LEN,
    MAX_TEMPLATE_VARIABLES,
};
pub use renderer::{render, TemplateVariable};
