//! Analysis quota tracking
//!
//! This module provides per-user usage quotas for the prompt analysis
//! feature, tracked over two fixed windows (per-minute and daily). It favors
//! exact bookkeeping over token buckets: the snapshot contract requires the
//! remaining count and reset instant for each window, which a bucket cannot
//! report.

use crate::clock::{Clock, SystemClock};
use crate::types::UserId;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error as ThisError;

/// Default analysis calls allowed per user per minute
pub const DEFAULT_MINUTE_LIMIT: u32 = 5;
/// Default analysis calls allowed per user per day
pub const DEFAULT_DAILY_LIMIT: u32 = 50;

/// Trait for quota checking functionality
///
/// This trait allows for dependency injection of quota behavior, enabling
/// easier testing with mock implementations and alternative backends.
pub trait QuotaChecker: Send + Sync {
    /// Consume one analysis call from the user's allowance
    ///
    /// Consumption is all-or-nothing across both windows: a refused call
    /// consumes nothing.
    fn check_and_consume(&self, user: &UserId) -> std::result::Result<(), QuotaExceeded>;

    /// Report the user's current allowance without consuming anything
    fn snapshot(&self, user: &UserId) -> QuotaSnapshot;
}

/// The quota window that refused a call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuotaWindow {
    /// Rolling per-minute window
    Minute,
    /// Rolling daily window
    Day,
}

impl QuotaWindow {
    /// Length of this window
    pub fn duration(&self) -> Duration {
        match self {
            QuotaWindow::Minute => Duration::minutes(1),
            QuotaWindow::Day => Duration::days(1),
        }
    }

    /// Lowercase name for messages and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaWindow::Minute => "minute",
            QuotaWindow::Day => "daily",
        }
    }
}

impl std::fmt::Display for QuotaWindow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Configuration for the quota tracker
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct QuotaConfig {
    /// Analysis calls allowed per minute
    pub minute_limit: u32,
    /// Analysis calls allowed per day
    pub daily_limit: u32,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            minute_limit: DEFAULT_MINUTE_LIMIT,
            daily_limit: DEFAULT_DAILY_LIMIT,
        }
    }
}

/// A refused analysis call, carrying which window ran out
#[derive(Debug, Clone, ThisError)]
#[error("Analysis quota exceeded: {window} limit reached, resets at {resets_at}")]
pub struct QuotaExceeded {
    /// The window whose allowance ran out
    pub window: QuotaWindow,
    /// When that window resets
    pub resets_at: DateTime<Utc>,
    /// Time until the window resets, measured at refusal
    pub retry_after: std::time::Duration,
}

impl QuotaExceeded {
    fn at(window: QuotaWindow, resets_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            window,
            resets_at,
            retry_after: (resets_at - now).to_std().unwrap_or_default(),
        }
    }
}

/// A user's current allowance across both windows
///
/// Serialized form matches the client quota contract (camelCase keys).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotaSnapshot {
    /// Calls remaining in the current minute window
    pub minute_remaining: u32,
    /// Calls remaining in the current daily window
    pub daily_remaining: u32,
    /// Configured per-minute limit
    pub minute_limit: u32,
    /// Configured daily limit
    pub daily_limit: u32,
    /// When the minute window resets
    pub minute_resets_at: DateTime<Utc>,
    /// When the daily window resets
    pub daily_resets_at: DateTime<Utc>,
}

impl QuotaSnapshot {
    /// A full, untouched allowance starting now
    ///
    /// Also used as the degraded answer when a quota backend cannot be
    /// reached and callers choose to fail open.
    pub fn full(config: &QuotaConfig, now: DateTime<Utc>) -> Self {
        Self {
            minute_remaining: config.minute_limit,
            daily_remaining: config.daily_limit,
            minute_limit: config.minute_limit,
            daily_limit: config.daily_limit,
            minute_resets_at: now + QuotaWindow::Minute.duration(),
            daily_resets_at: now + QuotaWindow::Day.duration(),
        }
    }

    /// True if at least one call remains in both windows
    pub fn has_remaining(&self) -> bool {
        self.minute_remaining > 0 && self.daily_remaining > 0
    }
}

/// One fixed window's bookkeeping: when it started and how much was used
#[derive(Debug, Clone, Copy)]
struct WindowState {
    started_at: DateTime<Utc>,
    used: u32,
}

impl WindowState {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            started_at: now,
            used: 0,
        }
    }

    /// Reset if the window has elapsed
    fn roll(&mut self, window: QuotaWindow, now: DateTime<Utc>) {
        if now >= self.started_at + window.duration() {
            self.started_at = now;
            self.used = 0;
        }
    }

    fn resets_at(&self, window: QuotaWindow) -> DateTime<Utc> {
        self.started_at + window.duration()
    }
}

#[derive(Debug, Clone, Copy)]
struct UserWindows {
    minute: WindowState,
    day: WindowState,
}

impl UserWindows {
    fn fresh(now: DateTime<Utc>) -> Self {
        Self {
            minute: WindowState::fresh(now),
            day: WindowState::fresh(now),
        }
    }
}

/// Fixed-window quota tracker keyed per user
///
/// Each user's minute and day windows live in one map entry, so a consume
/// updates both windows under the same exclusive reference and can never be
/// observed half-applied.
pub struct QuotaTracker {
    config: QuotaConfig,
    clock: Arc<dyn Clock>,
    windows: DashMap<UserId, UserWindows>,
}

impl QuotaTracker {
    /// Create a tracker with default limits on the system clock
    pub fn new() -> Self {
        Self::with_config(QuotaConfig::default())
    }

    /// Create a tracker with custom limits on the system clock
    pub fn with_config(config: QuotaConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a tracker with custom limits and an injected clock
    pub fn with_clock(config: QuotaConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            windows: DashMap::new(),
        }
    }

    /// The configured limits
    pub fn config(&self) -> QuotaConfig {
        self.config
    }

    /// Consume one analysis call, or report which window ran out
    pub fn check_and_consume(&self, user: &UserId) -> std::result::Result<(), QuotaExceeded> {
        let now = self.clock.now();
        let mut entry = self
            .windows
            .entry(*user)
            .or_insert_with(|| UserWindows::fresh(now));

        entry.minute.roll(QuotaWindow::Minute, now);
        entry.day.roll(QuotaWindow::Day, now);

        if entry.minute.used >= self.config.minute_limit {
            let resets_at = entry.minute.resets_at(QuotaWindow::Minute);
            tracing::debug!(user = %user, "analysis refused: minute quota exhausted");
            return Err(QuotaExceeded::at(QuotaWindow::Minute, resets_at, now));
        }
        if entry.day.used >= self.config.daily_limit {
            let resets_at = entry.day.resets_at(QuotaWindow::Day);
            tracing::debug!(user = %user, "analysis refused: daily quota exhausted");
            return Err(QuotaExceeded::at(QuotaWindow::Day, resets_at, now));
        }

        entry.minute.used += 1;
        entry.day.used += 1;
        Ok(())
    }

    /// Report the user's current allowance without consuming anything
    pub fn snapshot(&self, user: &UserId) -> QuotaSnapshot {
        let now = self.clock.now();
        match self.windows.get(user) {
            Some(entry) => {
                // Roll copies, never the stored state: snapshots must not mutate
                let mut minute = entry.minute;
                let mut day = entry.day;
                minute.roll(QuotaWindow::Minute, now);
                day.roll(QuotaWindow::Day, now);

                QuotaSnapshot {
                    minute_remaining: self.config.minute_limit.saturating_sub(minute.used),
                    daily_remaining: self.config.daily_limit.saturating_sub(day.used),
                    minute_limit: self.config.minute_limit,
                    daily_limit: self.config.daily_limit,
                    minute_resets_at: minute.resets_at(QuotaWindow::Minute),
                    daily_resets_at: day.resets_at(QuotaWindow::Day),
                }
            }
            None => QuotaSnapshot::full(&self.config, now),
        }
    }
}

impl Default for QuotaTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl QuotaChecker for QuotaTracker {
    fn check_and_consume(&self, user: &UserId) -> std::result::Result<(), QuotaExceeded> {
        self.check_and_consume(user)
    }

    fn snapshot(&self, user: &UserId) -> QuotaSnapshot {
        self.snapshot(user)
    }
}
