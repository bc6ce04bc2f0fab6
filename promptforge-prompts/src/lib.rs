//! # PromptForge Prompts Domain Crate
//!
//! This crate provides prompt library management for PromptForge: prompt
//! and variable models, explicit semantic versioning with immutable
//! snapshots, version diffing and restore, concurrent-edit detection,
//! sharing with per-grant permissions, and export rendering.
//!
//! ## Features
//!
//! - **Prompt Management**: Create, edit, list, and delete prompts with
//!   validated metadata and variable sets
//! - **Versioning**: Explicit major/minor/patch bumps recording immutable
//!   snapshots; restore never rewrites history
//! - **Conflict Detection**: Editing sessions track the stored prompt's
//!   freshness and block saves that would clobber concurrent edits
//! - **Sharing**: Read or write grants between users with a fixed
//!   authorization chain
//! - **Export**: JSON, Markdown, and TOON renderings of a prompt bundle
//!
//! All workflows run through [`PromptService`] over a [`PromptStore`]
//! backend; [`MemoryStore`] is the in-memory reference backend.

#![warn(missing_docs)]

pub mod authorization;
pub mod conflict;
pub mod diff;
pub mod export;
pub mod model;
pub mod service;
pub mod storage;
pub mod validation;
pub mod version;

// Re-export model types
pub use model::{
    CreatePrompt, CreateShare, Prompt, PromptShare, PromptVersion, SharePermission, UpdatePrompt,
    UpdateShare, Variable, VariableKind, Visibility,
};

// Re-export versioning types
pub use version::{BumpKind, SemanticVersion, VersionError};

// Re-export service and storage types
pub use service::PromptService;
pub use storage::{MemoryStore, PromptStore};

// Re-export conflict detection types
pub use conflict::{ConflictDetector, ConflictError, ConflictState};

// Re-export diff types
pub use diff::{diff_contents, unified_diff, DiffLine, DiffLineKind, VersionDiff};

// Re-export authorization types
pub use authorization::{ShareAction, ShareAuthorizationError};

// Re-export export types
pub use export::{ExportBundle, ExportFormat, UnknownExportFormat};

// Re-export validation types
pub use validation::ValidationError;
