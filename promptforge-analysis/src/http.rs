//! HTTP analysis client, content gating, and quota wrapping
//!
//! This module provides the reqwest-backed implementation of
//! [`AnalysisClient`] with explicit timeout handling and proper error
//! mapping, plus the quota-gated wrapper that guards any client with a
//! per-user allowance.
//!
//! The client-side timeout is deliberately shorter than the server-side
//! function timeout: the caller learns about a stuck analysis before the
//! server gives up, and the outcome is a distinct timeout rather than a
//! generic failure.

use crate::client::AnalysisClient;
use crate::error::{AnalysisError, Result};
use crate::types::PromptAnalysis;
use chrono::{DateTime, Utc};
use promptforge_common::{QuotaChecker, QuotaConfig, QuotaSnapshot, QuotaWindow, UserId};
use reqwest::header::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

// HTTP status code constants
const HTTP_TOO_MANY_REQUESTS: u16 = 429;

/// Server-side timeout of the analysis function
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(60);

/// Margin by which the client gives up before the server does
pub const TIMEOUT_SAFETY_MARGIN: Duration = Duration::from_secs(5);

/// Longest prompt content accepted for analysis, in characters
pub const MAX_ANALYSIS_CONTENT_LEN: usize = 50_000;

/// Retry-after assumed when a 429 response carries no usable header
const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Longest response body carried into an error message, in characters
const MAX_ERROR_BODY_LEN: usize = 300;

const USER_AGENT: &str = concat!("promptforge-analysis/", env!("CARGO_PKG_VERSION"));

/// Configuration for the HTTP analysis client
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Analysis endpoint URL
    pub endpoint: String,
    /// Model requested from the analysis service
    pub model: String,
    /// Bearer token sent with each request, if any
    pub api_key: Option<String>,
    /// Client-side request timeout
    pub client_timeout: Duration,
    /// Read-only quota endpoint URL, if the service exposes one
    pub quota_endpoint: Option<String>,
}

impl AnalysisConfig {
    /// Configuration with the default timeout and no authentication
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            api_key: None,
            client_timeout: DEFAULT_SERVER_TIMEOUT - TIMEOUT_SAFETY_MARGIN,
            quota_endpoint: None,
        }
    }

    /// Set the bearer token
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Override the client-side timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client_timeout = timeout;
        self
    }

    /// Set the quota endpoint
    pub fn with_quota_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.quota_endpoint = Some(endpoint.into());
        self
    }
}

/// Refuse content too large for the analysis service
///
/// Checked before any quota is consumed so an oversize prompt never burns
/// allowance. Lengths are in characters to match the validation rules
/// applied elsewhere.
pub fn check_analysis_content(content: &str) -> Result<()> {
    let len = content.chars().count();
    if len > MAX_ANALYSIS_CONTENT_LEN {
        return Err(AnalysisError::ContentTooLarge {
            len,
            max: MAX_ANALYSIS_CONTENT_LEN,
        });
    }
    Ok(())
}

#[derive(Serialize)]
struct AnalysisRequest<'a> {
    model: &'a str,
    content: &'a str,
}

/// Build a rate-limit error from 429 response headers
///
/// `Retry-After` is read as whole seconds; the refusing window comes from
/// `X-Quota-Window` (`minute` or `daily`). Both are best-effort with
/// defaults, since the service contract only promises the status code.
fn rate_limit_from_headers(headers: &HeaderMap) -> AnalysisError {
    let retry_after = headers
        .get("retry-after")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER);

    let window = headers
        .get("x-quota-window")
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .map(|value| {
            if value.eq_ignore_ascii_case("daily") || value.eq_ignore_ascii_case("day") {
                QuotaWindow::Day
            } else {
                QuotaWindow::Minute
            }
        })
        .unwrap_or(QuotaWindow::Minute);

    AnalysisError::RateLimited {
        window,
        retry_after,
    }
}

fn truncate_body(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_LEN {
        trimmed.to_string()
    } else {
        let cut: String = trimmed.chars().take(MAX_ERROR_BODY_LEN).collect();
        format!("{cut}...")
    }
}

/// reqwest-backed analysis client
///
/// One request per call, no retries: the caller owns retry policy, and the
/// quota gate would make blind retries counterproductive anyway.
#[derive(Debug, Clone)]
pub struct HttpAnalysisClient {
    client: reqwest::Client,
    config: AnalysisConfig,
}

impl HttpAnalysisClient {
    /// Create a client from the given configuration
    pub fn new(config: AnalysisConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(config.client_timeout)
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, config }
    }

    /// The configuration this client was built with
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Maps reqwest errors to analysis error kinds
    ///
    /// Timeouts are detected first so they surface distinctly; everything
    /// else keeps the underlying message.
    fn map_transport(&self, error: reqwest::Error) -> AnalysisError {
        if error.is_timeout() {
            return AnalysisError::Timeout {
                after: self.config.client_timeout,
            };
        }
        if error.is_connect() {
            return AnalysisError::Transport(format!("connection failed: {error}"));
        }
        AnalysisError::Transport(error.to_string())
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.api_key {
            Some(key) => request.header("Authorization", format!("Bearer {key}")),
            None => request,
        }
    }

    /// Fetch the caller's current quota allowance from the service
    ///
    /// # Errors
    ///
    /// Fails when no quota endpoint is configured, on transport errors, and
    /// when the response is not a valid snapshot. Callers that prefer
    /// availability over accuracy pass the result through
    /// [`snapshot_or_full`].
    pub async fn fetch_quota(&self) -> Result<QuotaSnapshot> {
        let endpoint = self.config.quota_endpoint.as_deref().ok_or_else(|| {
            AnalysisError::Transport("no quota endpoint configured".to_string())
        })?;

        debug!("Fetching quota snapshot from {endpoint}");
        let request = self.authorize(self.client.get(endpoint));
        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Http {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        serde_json::from_str(&body).map_err(|e| AnalysisError::InvalidResponse {
            message: format!("quota snapshot: {e}"),
        })
    }
}

#[async_trait::async_trait]
impl AnalysisClient for HttpAnalysisClient {
    async fn analyze(&self, content: &str) -> Result<PromptAnalysis> {
        check_analysis_content(content)?;

        debug!(
            "Requesting analysis of {} characters from {}",
            content.chars().count(),
            self.config.endpoint
        );
        let request = self.authorize(self.client.post(&self.config.endpoint)).json(
            &AnalysisRequest {
                model: &self.config.model,
                content,
            },
        );

        let response = request.send().await.map_err(|e| self.map_transport(e))?;
        let status = response.status();

        if status.as_u16() == HTTP_TOO_MANY_REQUESTS {
            return Err(rate_limit_from_headers(response.headers()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Http {
                status: status.as_u16(),
                message: truncate_body(&body),
            });
        }

        // Body reads hit the same client timeout as the send
        let body = response.text().await.map_err(|e| self.map_transport(e))?;
        let mut analysis: PromptAnalysis =
            serde_json::from_str(&body).map_err(|e| AnalysisError::InvalidResponse {
                message: e.to_string(),
            })?;

        // Stamp what the service omitted
        if analysis.model.is_none() {
            analysis.model = Some(self.config.model.clone());
        }
        if analysis.analyzed_at.is_none() {
            analysis.analyzed_at = Some(Utc::now());
        }

        info!(
            "Analysis produced {} sections and {} suggested variables",
            analysis.sections.len(),
            analysis.suggested_variables.len()
        );
        Ok(analysis)
    }
}

/// Wraps any analysis client with a per-user quota gate
///
/// The content size gate runs before quota consumption, and a refused quota
/// check never reaches the inner client.
pub struct GatedAnalysisClient<C, Q> {
    inner: C,
    quota: Arc<Q>,
    user: UserId,
}

impl<C, Q> GatedAnalysisClient<C, Q>
where
    C: AnalysisClient,
    Q: QuotaChecker,
{
    /// Gate the given client behind the given quota for one user
    pub fn new(inner: C, quota: Arc<Q>, user: UserId) -> Self {
        Self { inner, quota, user }
    }

    /// The user's current allowance, without consuming anything
    pub fn snapshot(&self) -> QuotaSnapshot {
        self.quota.snapshot(&self.user)
    }
}

#[async_trait::async_trait]
impl<C, Q> AnalysisClient for GatedAnalysisClient<C, Q>
where
    C: AnalysisClient,
    Q: QuotaChecker,
{
    async fn analyze(&self, content: &str) -> Result<PromptAnalysis> {
        check_analysis_content(content)?;
        self.quota.check_and_consume(&self.user)?;
        self.inner.analyze(content).await
    }
}

/// Degrade a failed quota fetch to a full allowance
///
/// The quota display is advisory; when the backend cannot answer, callers
/// show a full allowance rather than blocking the user. The real gate on
/// the analysis call still applies server-side.
pub fn snapshot_or_full(
    result: Result<QuotaSnapshot>,
    config: &QuotaConfig,
    now: DateTime<Utc>,
) -> QuotaSnapshot {
    match result {
        Ok(snapshot) => snapshot,
        Err(error) => {
            warn!("Quota fetch failed, granting full allowance: {error}");
            QuotaSnapshot::full(config, now)
        }
    }
}
