//! # PromptForge Analysis
//!
//! External LLM analysis collaborator for PromptForge. Prompt content goes
//! in; a structured decomposition (sections, suggested variables, metadata)
//! comes back, with JSON and Markdown renderings.
//!
//! ## Features
//!
//! - `AnalysisClient` trait so workflows never depend on transport details
//! - reqwest-backed `HttpAnalysisClient` with an explicit client-side
//!   timeout shorter than the server's
//! - Per-user quota gating via `GatedAnalysisClient` and the shared
//!   `QuotaChecker` trait
//! - Error taxonomy that keeps timeouts and rate limits distinct from
//!   generic failures
//! - Fail-open quota display degradation via `snapshot_or_full`

pub mod client;
pub mod error;
pub mod http;
pub mod types;

// Re-export client types
pub use client::{AnalysisClient, StaticAnalysisClient};

// Re-export error types
pub use error::{AnalysisError, Result};

// Re-export HTTP client and gating
pub use http::{
    check_analysis_content, snapshot_or_full, AnalysisConfig, GatedAnalysisClient,
    HttpAnalysisClient, DEFAULT_SERVER_TIMEOUT, MAX_ANALYSIS_CONTENT_LEN, TIMEOUT_SAFETY_MARGIN,
};

// Re-export response types
pub use types::{AnalysisSection, PromptAnalysis, SuggestedVariable};
