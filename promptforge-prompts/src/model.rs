//! Prompt domain models and change payloads
//!
//! Entities for prompts, their variables, immutable version snapshots, and
//! share grants, plus the create/update payloads the service workflows
//! accept. Entities carry no behavior beyond small presentation helpers;
//! validation lives in [`crate::validation`] and all mutation goes through
//! the service.

use chrono::{DateTime, Utc};
use promptforge_common::{PromptId, ShareId, UserId, VersionId};
use promptforge_templating::TemplateVariable;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::version::SemanticVersion;

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// Who can discover a prompt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to the owner and explicit grantees only
    #[default]
    Private,
    /// Marked shareable; access still requires ownership or a grant
    Shared,
}

impl Visibility {
    /// Lowercase name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            Visibility::Private => "private",
            Visibility::Shared => "shared",
        }
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value shape a variable expects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableKind {
    /// Free text
    #[default]
    String,
    /// Numeric values (integers and floats)
    Number,
    /// True/false
    Boolean,
    /// One of a fixed option list
    Enum,
    /// Calendar date
    Date,
    /// Multiple lines or entries of text
    MultiString,
}

impl VariableKind {
    /// Get the string representation of this variable kind
    pub fn as_str(&self) -> &'static str {
        match self {
            VariableKind::String => "string",
            VariableKind::Number => "number",
            VariableKind::Boolean => "boolean",
            VariableKind::Enum => "enum",
            VariableKind::Date => "date",
            VariableKind::MultiString => "multistring",
        }
    }
}

impl FromStr for VariableKind {
    type Err = (); // We don't want to error on unknown kinds, just default to String

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let kind = match s.to_lowercase().as_str() {
            "string" | "text" => VariableKind::String,
            "number" | "numeric" | "int" | "integer" | "float" => VariableKind::Number,
            "boolean" | "bool" => VariableKind::Boolean,
            "enum" | "choice" | "select" => VariableKind::Enum,
            "date" => VariableKind::Date,
            "multistring" | "multi_string" | "multiline" => VariableKind::MultiString,
            _ => VariableKind::String, // Default to string for unknown kinds
        };
        Ok(kind)
    }
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A variable definition belonging to one prompt
///
/// Variables give placeholders their defaults, input affordances, and
/// display order. A placeholder in content with no matching variable here
/// is simply unresolved at render time, never an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variable {
    /// Placeholder name as it appears between braces
    pub name: String,
    /// The value shape this variable expects
    #[serde(default)]
    pub kind: VariableKind,
    /// Whether a value must be supplied before final use
    #[serde(default)]
    pub required: bool,
    /// Fallback value used at render time
    #[serde(default)]
    pub default_value: Option<String>,
    /// Guidance shown next to the input
    #[serde(default)]
    pub help_text: Option<String>,
    /// Validation regex applied to supplied values
    #[serde(default)]
    pub pattern: Option<String>,
    /// Ordered option list for enum variables
    #[serde(default)]
    pub options: Option<Vec<String>>,
    /// Stable display position
    #[serde(default)]
    pub order_index: u32,
}

impl Variable {
    /// A string variable with the given name and no constraints
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: VariableKind::String,
            required: false,
            default_value: None,
            help_text: None,
            pattern: None,
            options: None,
            order_index: 0,
        }
    }

    /// Set the value kind
    pub fn with_kind(mut self, kind: VariableKind) -> Self {
        self.kind = kind;
        self
    }

    /// Mark the variable required
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach a default value
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default_value = Some(default.into());
        self
    }

    /// Attach help text
    pub fn with_help_text(mut self, help: impl Into<String>) -> Self {
        self.help_text = Some(help.into());
        self
    }

    /// Attach a validation pattern
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Attach an option list
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.options = Some(options);
        self
    }

    /// Set the display position
    pub fn with_order_index(mut self, index: u32) -> Self {
        self.order_index = index;
        self
    }

    /// The renderer's view of this variable
    pub fn to_template_variable(&self) -> TemplateVariable {
        TemplateVariable {
            name: self.name.clone(),
            default_value: self.default_value.clone(),
        }
    }
}

/// A prompt template with metadata and its current version marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    /// Unique identifier
    pub id: PromptId,
    /// The owning user
    pub owner: UserId,
    /// Display title
    pub title: String,
    /// Optional free-text description
    pub description: Option<String>,
    /// Template text containing `{{variable}}` placeholders
    pub content: String,
    /// Ordered tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Discovery setting
    #[serde(default)]
    pub visibility: Visibility,
    /// Current version; always equals the newest version snapshot's string
    pub version: SemanticVersion,
    /// Owner's favorite flag
    #[serde(default)]
    pub is_favorite: bool,
    /// When the prompt was created
    pub created_at: DateTime<Utc>,
    /// Last content-affecting mutation; the conflict-detection baseline
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    /// The description, normalized for display
    ///
    /// Empty or missing descriptions read as "no description".
    pub fn description_or_default(&self) -> &str {
        match &self.description {
            Some(description) if !description.trim().is_empty() => description,
            _ => "no description",
        }
    }
}

/// An immutable snapshot of a prompt at one version
///
/// The variable set is embedded by value: editing the live prompt's
/// variables later never changes what this snapshot restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptVersion {
    /// Unique identifier
    pub id: VersionId,
    /// The prompt this snapshot belongs to
    pub prompt_id: PromptId,
    /// Version string, unique within the prompt
    pub version: SemanticVersion,
    /// Full content at this version
    pub content: String,
    /// Optional free-text message recorded at creation
    pub message: Option<String>,
    /// The variable set at this version
    #[serde(default)]
    pub variables: Vec<Variable>,
    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

/// Access level granted by a share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SharePermission {
    /// View and render only
    Read,
    /// View, render, and save changes
    Write,
}

impl SharePermission {
    /// Lowercase name as stored and serialized
    pub fn as_str(&self) -> &'static str {
        match self {
            SharePermission::Read => "read",
            SharePermission::Write => "write",
        }
    }

    /// True if this permission allows saving changes
    pub fn allows_write(&self) -> bool {
        matches!(self, SharePermission::Write)
    }
}

impl fmt::Display for SharePermission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A grant giving one user access to another user's prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptShare {
    /// Unique identifier
    pub id: ShareId,
    /// The shared prompt
    pub prompt_id: PromptId,
    /// The user receiving access
    pub shared_with: UserId,
    /// Granted access level
    pub permission: SharePermission,
    /// The user who created the grant
    pub shared_by: UserId,
    /// When the grant was created
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Change payloads
// ---------------------------------------------------------------------------

/// Input for creating a new prompt
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePrompt {
    /// Display title
    pub title: String,
    /// Optional free-text description
    #[serde(default)]
    pub description: Option<String>,
    /// Template text
    pub content: String,
    /// Ordered tag set
    #[serde(default)]
    pub tags: Vec<String>,
    /// Discovery setting
    #[serde(default)]
    pub visibility: Visibility,
    /// Initial variable definitions
    #[serde(default)]
    pub variables: Vec<Variable>,
}

impl CreatePrompt {
    /// A minimal payload with the given title and content
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            content: content.into(),
            tags: Vec::new(),
            visibility: Visibility::Private,
            variables: Vec::new(),
        }
    }
}

/// Field-wise prompt update; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePrompt {
    /// Replacement title
    #[serde(default)]
    pub title: Option<String>,
    /// Replacement description
    #[serde(default)]
    pub description: Option<String>,
    /// Replacement content
    #[serde(default)]
    pub content: Option<String>,
    /// Replacement tag set
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    /// Replacement visibility
    #[serde(default)]
    pub visibility: Option<Visibility>,
    /// Replacement favorite flag
    #[serde(default)]
    pub is_favorite: Option<bool>,
    /// Replacement variable set
    #[serde(default)]
    pub variables: Option<Vec<Variable>>,
}

impl UpdatePrompt {
    /// True if any field beyond the favorite flag changes
    ///
    /// Favoriting is per-owner bookkeeping; it does not advance
    /// `updated_at` and never triggers conflict warnings for collaborators.
    pub fn is_content_affecting(&self) -> bool {
        self.title.is_some()
            || self.description.is_some()
            || self.content.is_some()
            || self.tags.is_some()
            || self.visibility.is_some()
            || self.variables.is_some()
    }
}

/// Input for creating a share grant
#[derive(Debug, Clone, Deserialize)]
pub struct CreateShare {
    /// The prompt to share
    pub prompt_id: PromptId,
    /// The user receiving access
    pub shared_with: UserId,
    /// Granted access level
    pub permission: SharePermission,
}

/// Input for changing a share grant's access level
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateShare {
    /// The new access level
    pub permission: SharePermission,
}
