//! Concurrent-edit detection for editing sessions
//!
//! Each editing session captures the prompt's `updated_at` as its baseline
//! when it loads. A save elsewhere moves the stored timestamp past the
//! baseline; once this session also has local edits, it is in conflict and
//! saves are refused until the user forces the save or reloads.

use chrono::{DateTime, Utc};
use promptforge_common::{ErrorSeverity, PromptForgeError, Severity};
use thiserror::Error;

/// Whether an editing session may save without losing someone's work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConflictState {
    /// No interleaved save observed, or no local edits at risk
    #[default]
    Clean,
    /// The stored prompt changed under this session's local edits
    Conflicted,
}

/// A refused save due to a concurrent edit
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConflictError {
    /// The stored prompt was updated after this session loaded it
    #[error(
        "Prompt was updated elsewhere at {observed} (this session loaded it at {baseline}); \
         reload to pick up the changes or force the save to overwrite them"
    )]
    ConcurrentEdit {
        /// The `updated_at` this session loaded
        baseline: DateTime<Utc>,
        /// The newer `updated_at` observed in storage
        observed: DateTime<Utc>,
    },
}

impl Severity for ConflictError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Warning
    }
}

impl From<ConflictError> for PromptForgeError {
    fn from(error: ConflictError) -> Self {
        PromptForgeError::Conflict {
            message: error.to_string(),
        }
    }
}

/// Tracks one editing session's view of a prompt's freshness
#[derive(Debug, Clone)]
pub struct ConflictDetector {
    baseline: DateTime<Utc>,
    observed: Option<DateTime<Utc>>,
    state: ConflictState,
}

impl ConflictDetector {
    /// Start a session with the prompt's `updated_at` at load time
    pub fn capture(baseline: DateTime<Utc>) -> Self {
        Self {
            baseline,
            observed: None,
            state: ConflictState::Clean,
        }
    }

    /// The session's current state
    pub fn state(&self) -> ConflictState {
        self.state
    }

    /// The `updated_at` this session loaded
    pub fn baseline(&self) -> DateTime<Utc> {
        self.baseline
    }

    /// Feed the stored prompt's live `updated_at` into the session
    ///
    /// The session becomes conflicted only when the stored timestamp is
    /// newer than the baseline AND this session has unsaved local edits.
    /// A remote save with nothing local at risk stays clean. Once
    /// conflicted the state is sticky; newer observations never clear it.
    pub fn observe(&mut self, live_updated_at: DateTime<Utc>, has_local_edits: bool) {
        if live_updated_at > self.baseline {
            self.observed = Some(live_updated_at);
            if has_local_edits {
                self.state = ConflictState::Conflicted;
            }
        }
    }

    /// Gate a save attempt
    ///
    /// A conflicted session saves only with `force`. Forcing does not
    /// clean the session; only [`reload`](Self::reload) does.
    pub fn check_save(&self, force: bool) -> Result<(), ConflictError> {
        match self.state {
            ConflictState::Clean => Ok(()),
            ConflictState::Conflicted if force => Ok(()),
            ConflictState::Conflicted => Err(ConflictError::ConcurrentEdit {
                baseline: self.baseline,
                observed: self.observed.unwrap_or(self.baseline),
            }),
        }
    }

    /// Reload the session against a fresh copy of the prompt
    ///
    /// This is the only way back to [`ConflictState::Clean`].
    pub fn reload(&mut self, fresh_updated_at: DateTime<Utc>) {
        self.baseline = fresh_updated_at;
        self.observed = None;
        self.state = ConflictState::Clean;
    }
}
