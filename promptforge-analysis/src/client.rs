//! Analysis client trait
//!
//! The trait is the seam between prompt workflows and the external analysis
//! service: callers hold a `dyn AnalysisClient` (or a generic) and never see
//! transport details. `StaticAnalysisClient` is the in-process double for
//! tests and offline use.

use crate::error::{AnalysisError, Result};
use crate::types::PromptAnalysis;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A collaborator that decomposes raw prompt text into a structured analysis
#[async_trait::async_trait]
pub trait AnalysisClient: Send + Sync {
    /// Analyze prompt content
    async fn analyze(&self, content: &str) -> Result<PromptAnalysis>;
}

/// Client that replays a canned response or failure
///
/// Counts calls so tests can assert whether the client was reached at all,
/// which matters for quota gating.
pub struct StaticAnalysisClient {
    response: std::result::Result<PromptAnalysis, AnalysisError>,
    calls: AtomicUsize,
}

impl StaticAnalysisClient {
    /// Client that always answers with the given analysis
    pub fn new(analysis: PromptAnalysis) -> Self {
        Self {
            response: Ok(analysis),
            calls: AtomicUsize::new(0),
        }
    }

    /// Client that always fails with the given error
    pub fn failing(error: AnalysisError) -> Self {
        Self {
            response: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times analyze was called
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl AnalysisClient for StaticAnalysisClient {
    async fn analyze(&self, _content: &str) -> Result<PromptAnalysis> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}
