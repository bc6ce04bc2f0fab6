//! # PromptForge Common
//!
//! This crate provides foundational types, traits, and utilities shared
//! across the PromptForge ecosystem. It serves as the base dependency for
//! the other PromptForge crates, establishing common patterns and
//! abstractions.
//!
//! ## Modules
//!
//! - [`clock`] - Injectable time source so timestamp logic is testable
//! - [`error`] - Shared error taxonomy with severity classification
//! - [`quota`] - Per-user analysis quota tracking over fixed windows
//! - [`types`] - Strongly-typed identifiers for domain safety
//!
//! ## Design Principles
//!
//! - Type safety through newtypes and strong typing
//! - Structured error handling; distinct failures stay distinct
//! - Serialization support for all public types
//! - Dependencies on time and counters injected at construction

pub mod clock;
pub mod error;
pub mod quota;
pub mod types;

// Re-export error types for convenience
pub use error::{
    ErrorChain, ErrorChainExt, ErrorContext, ErrorSeverity, PromptForgeError, Result, Severity,
};

// Re-export clock types for convenience
pub use clock::{Clock, FixedClock, SystemClock};

// Re-export quota functionality for convenience
pub use quota::{
    QuotaChecker, QuotaConfig, QuotaExceeded, QuotaSnapshot, QuotaTracker, QuotaWindow,
    DEFAULT_DAILY_LIMIT, DEFAULT_MINUTE_LIMIT,
};

// Re-export identifier types for convenience
pub use types::{PromptId, ShareId, UserId, VersionId};
