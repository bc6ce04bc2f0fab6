//! Analysis response types
//!
//! The analysis service decomposes raw prompt text into titled sections,
//! suggested variables, and metadata. The wire contract uses camelCase keys;
//! parsing is tolerant of omitted optional fields so older service versions
//! keep working.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One titled section of the decomposed prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSection {
    /// Section heading
    pub heading: String,
    /// Section body text
    pub body: String,
    /// Display ordering, lowest first
    #[serde(default)]
    pub order_index: u32,
}

impl AnalysisSection {
    /// Create a section
    pub fn new(heading: impl Into<String>, body: impl Into<String>, order_index: u32) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
            order_index,
        }
    }
}

/// A variable the analysis suggests extracting from the prompt
///
/// The kind is a free-form string on the wire; consumers map unknown kinds
/// to their own default rather than refusing the whole analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedVariable {
    /// Placeholder name
    pub name: String,
    /// Suggested kind, e.g. "string" or "number"
    #[serde(default)]
    pub kind: Option<String>,
    /// Whether a value should be required at render time
    #[serde(default)]
    pub required: bool,
    /// Suggested default value
    #[serde(default)]
    pub default_value: Option<String>,
    /// Suggested help text
    #[serde(default)]
    pub help_text: Option<String>,
}

/// Structured decomposition of a prompt returned by the analysis service
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptAnalysis {
    /// Suggested prompt title
    pub title: String,
    /// Suggested prompt description
    #[serde(default)]
    pub description: Option<String>,
    /// Decomposed sections
    #[serde(default)]
    pub sections: Vec<AnalysisSection>,
    /// Variables the service suggests extracting
    #[serde(default)]
    pub suggested_variables: Vec<SuggestedVariable>,
    /// Suggested tags
    #[serde(default)]
    pub tags: Vec<String>,
    /// Model that produced the analysis
    #[serde(default)]
    pub model: Option<String>,
    /// When the analysis was produced
    #[serde(default)]
    pub analyzed_at: Option<DateTime<Utc>>,
}

impl PromptAnalysis {
    /// Create an analysis with only a title
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Sections sorted for display, lowest order index first
    pub fn ordered_sections(&self) -> Vec<&AnalysisSection> {
        let mut sections: Vec<&AnalysisSection> = self.sections.iter().collect();
        sections.sort_by(|a, b| {
            a.order_index
                .cmp(&b.order_index)
                .then_with(|| a.heading.cmp(&b.heading))
        });
        sections
    }

    /// Render the analysis as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Render the analysis as a Markdown document
    pub fn to_markdown(&self) -> String {
        let mut out = String::new();

        out.push_str(&format!("# {}\n\n", self.title));
        if let Some(description) = &self.description {
            if !description.trim().is_empty() {
                out.push_str(&format!("{}\n\n", description.trim()));
            }
        }

        for section in self.ordered_sections() {
            out.push_str(&format!("## {}\n\n{}\n\n", section.heading, section.body));
        }

        if !self.suggested_variables.is_empty() {
            out.push_str("## Suggested Variables\n\n");
            for variable in &self.suggested_variables {
                let kind = variable.kind.as_deref().unwrap_or("string");
                let requirement = if variable.required {
                    "required"
                } else {
                    "optional"
                };
                out.push_str(&format!("- `{}` ({kind}, {requirement})", variable.name));
                if let Some(default) = &variable.default_value {
                    out.push_str(&format!(", default `{default}`"));
                }
                if let Some(help) = &variable.help_text {
                    out.push_str(&format!(": {help}"));
                }
                out.push('\n');
            }
            out.push('\n');
        }

        if !self.tags.is_empty() {
            out.push_str(&format!("Tags: {}\n\n", self.tags.join(", ")));
        }

        if let Some(model) = &self.model {
            match self.analyzed_at {
                Some(at) => out.push_str(&format!(
                    "_Analyzed by {model} at {}_\n",
                    at.format("%Y-%m-%d %H:%M UTC")
                )),
                None => out.push_str(&format!("_Analyzed by {model}_\n")),
            }
        }

        out
    }
}
