//! Prompt export rendering
//!
//! Renders a prompt with its variables and optional version history into
//! one of three formats: JSON for machine exchange, Markdown for
//! documentation, and TOON (token-oriented object notation) for compact
//! LLM-context embedding.

use promptforge_common::{PromptForgeError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::{Prompt, PromptVersion, Variable};

/// An export format name that is not json, markdown, or toon
#[derive(Debug, Error, PartialEq, Eq)]
#[error("Unknown export format '{input}', expected json, markdown, or toon")]
pub struct UnknownExportFormat {
    /// The rejected format name
    pub input: String,
}

impl From<UnknownExportFormat> for PromptForgeError {
    fn from(error: UnknownExportFormat) -> Self {
        PromptForgeError::validation("format", error.to_string())
    }
}

/// Supported export formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Pretty-printed JSON of the full bundle
    Json,
    /// Human-readable Markdown document
    Markdown,
    /// Token-oriented object notation, compact for LLM context
    Toon,
}

impl ExportFormat {
    /// Lowercase format name, also the conventional file extension
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Toon => "toon",
        }
    }

    /// File extension for exports in this format
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
            ExportFormat::Toon => "toon",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = UnknownExportFormat;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "markdown" | "md" => Ok(ExportFormat::Markdown),
            "toon" => Ok(ExportFormat::Toon),
            other => Err(UnknownExportFormat {
                input: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything an export draws from
///
/// `versions` is `None` when history was not requested, and `Some` (possibly
/// empty) when it was.
#[derive(Debug, Clone, Serialize)]
pub struct ExportBundle {
    /// The prompt being exported
    pub prompt: Prompt,
    /// Its variable set in display order
    pub variables: Vec<Variable>,
    /// Version history, newest first, if requested
    #[serde(skip_serializing_if = "Option::is_none")]
    pub versions: Option<Vec<PromptVersion>>,
}

/// Render a bundle in the requested format
pub fn render(bundle: &ExportBundle, format: ExportFormat) -> Result<String> {
    match format {
        ExportFormat::Json => Ok(serde_json::to_string_pretty(bundle)?),
        ExportFormat::Markdown => Ok(render_markdown(bundle)),
        ExportFormat::Toon => Ok(render_toon(bundle)),
    }
}

fn render_markdown(bundle: &ExportBundle) -> String {
    let prompt = &bundle.prompt;
    let mut output = String::new();

    output.push_str(&format!("# {}\n\n", prompt.title));
    output.push_str(&format!("{}\n\n", prompt.description_or_default()));

    output.push_str("| Field | Value |\n|-------|-------|\n");
    output.push_str(&format!("| Version | {} |\n", prompt.version));
    output.push_str(&format!("| Visibility | {} |\n", prompt.visibility));
    let tags = if prompt.tags.is_empty() {
        "none".to_string()
    } else {
        prompt.tags.join(", ")
    };
    output.push_str(&format!("| Tags | {tags} |\n"));
    output.push_str(&format!(
        "| Created | {} |\n",
        prompt.created_at.format("%Y-%m-%d %H:%M UTC")
    ));
    output.push_str(&format!(
        "| Updated | {} |\n\n",
        prompt.updated_at.format("%Y-%m-%d %H:%M UTC")
    ));

    output.push_str("## Variables\n\n");
    if bundle.variables.is_empty() {
        output.push_str("None.\n\n");
    } else {
        for variable in &bundle.variables {
            let requirement = if variable.required {
                "required"
            } else {
                "optional"
            };
            output.push_str(&format!(
                "- `{}` ({}, {})",
                variable.name, variable.kind, requirement
            ));
            if let Some(default) = &variable.default_value {
                output.push_str(&format!(", default `{default}`"));
            }
            if let Some(help) = &variable.help_text {
                output.push_str(&format!(": {help}"));
            }
            output.push('\n');
        }
        output.push('\n');
    }

    output.push_str("## Content\n\n");
    output.push_str("```\n");
    output.push_str(&prompt.content);
    if !prompt.content.ends_with('\n') {
        output.push('\n');
    }
    output.push_str("```\n");

    if let Some(versions) = &bundle.versions {
        output.push_str("\n## Version History\n\n");
        if versions.is_empty() {
            output.push_str("No versions recorded.\n");
        }
        for version in versions {
            output.push_str(&format!(
                "### {} ({})\n\n",
                version.version,
                version.created_at.format("%Y-%m-%d %H:%M UTC")
            ));
            if let Some(message) = &version.message {
                output.push_str(&format!("{message}\n\n"));
            }
            output.push_str("```\n");
            output.push_str(&version.content);
            if !version.content.ends_with('\n') {
                output.push('\n');
            }
            output.push_str("```\n\n");
        }
    }

    output
}

// TOON scalars are bare unless they would collide with the format's own
// delimiters, in which case they are double-quoted with backslash escapes.
fn toon_scalar(value: &str) -> String {
    let needs_quotes = value.is_empty()
        || value.contains(',')
        || value.contains(':')
        || value.contains('\n')
        || value.contains('"')
        || value.starts_with(' ')
        || value.ends_with(' ');
    if needs_quotes {
        let escaped = value
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n");
        format!("\"{escaped}\"")
    } else {
        value.to_string()
    }
}

fn toon_opt(value: Option<&str>) -> String {
    match value {
        Some(value) => toon_scalar(value),
        None => "null".to_string(),
    }
}

fn render_toon(bundle: &ExportBundle) -> String {
    let prompt = &bundle.prompt;
    let mut output = String::new();

    output.push_str("prompt:\n");
    output.push_str(&format!("  id: {}\n", prompt.id));
    output.push_str(&format!("  title: {}\n", toon_scalar(&prompt.title)));
    output.push_str(&format!(
        "  description: {}\n",
        toon_opt(prompt.description.as_deref())
    ));
    output.push_str(&format!("  version: {}\n", prompt.version));
    output.push_str(&format!("  visibility: {}\n", prompt.visibility));
    output.push_str(&format!("  favorite: {}\n", prompt.is_favorite));
    let tags: Vec<String> = prompt.tags.iter().map(|t| toon_scalar(t)).collect();
    output.push_str(&format!("  tags[{}]: {}\n", tags.len(), tags.join(",")));
    output.push_str(&format!("  created_at: {}\n", prompt.created_at.to_rfc3339()));
    output.push_str(&format!("  updated_at: {}\n", prompt.updated_at.to_rfc3339()));
    output.push_str(&format!("  content: {}\n", toon_scalar(&prompt.content)));

    output.push_str(&format!(
        "variables[{}]{{name,kind,required,default,help}}:\n",
        bundle.variables.len()
    ));
    for variable in &bundle.variables {
        output.push_str(&format!(
            "  {},{},{},{},{}\n",
            toon_scalar(&variable.name),
            variable.kind,
            variable.required,
            toon_opt(variable.default_value.as_deref()),
            toon_opt(variable.help_text.as_deref()),
        ));
    }

    if let Some(versions) = &bundle.versions {
        output.push_str(&format!(
            "versions[{}]{{version,message,created_at}}:\n",
            versions.len()
        ));
        for version in versions {
            output.push_str(&format!(
                "  {},{},{}\n",
                version.version,
                toon_opt(version.message.as_deref()),
                version.created_at.to_rfc3339(),
            ));
        }
    }

    output
}
