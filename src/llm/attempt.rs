//! Attempt records and per-request generation metadata.
//!
//! Every backend invocation leaves exactly one [`AttemptRecord`] in the
//! request's [`GenerationMetadata`], whether it succeeded, failed, or never
//! ran because the backend id could not be resolved. External consumers
//! (telemetry dashboards) key off the serialized field names, in particular
//! `error_code == "contract_violation"` and `fallback_used`, so the serde
//! representation here is a stable interface.

use crate::llm::types::TokenUsage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Outcome of one attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttemptStatus {
    Success,
    Failed,
}

/// The four failure categories, each with a fixed retry verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Backend did not answer in time. Retryable.
    Timeout,
    /// Infrastructure fault (rate limit, 5xx, network, auth, quota), including
    /// the `contract_violation` sub-code. Retryable.
    ProviderError,
    /// The request content was rejected. Never retryable.
    TerminalError,
    /// Unanticipated adapter fault (panic). Treated as infrastructure. Retryable.
    Exception,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorCategory::Timeout => "timeout",
            ErrorCategory::ProviderError => "provider_error",
            ErrorCategory::TerminalError => "terminal_error",
            ErrorCategory::Exception => "exception",
        };
        f.write_str(s)
    }
}

/// Immutable record of one backend invocation.
///
/// Constructed through [`AttemptRecord::success`] /
/// [`AttemptRecord::failure`], which keep `status` and `error_category`
/// consistent: the category is present if and only if the attempt failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// Identifier of the backend that was tried.
    pub backend_id: String,
    /// Resolved model identifier; unknown until the call returns, and absent
    /// for attempts that never reached a backend.
    pub model_name: Option<String>,
    pub status: AttemptStatus,
    pub error_category: Option<ErrorCategory>,
    /// Finer-grained diagnosis, e.g. `"429"`, `"contract_violation"`,
    /// `"provider_not_found"`.
    pub error_code: Option<String>,
    /// Wall-clock duration of this single attempt.
    pub latency_ms: u64,
    /// Attempt start time.
    pub timestamp: DateTime<Utc>,
    /// Populated only on success, when the backend reports usage.
    pub token_usage: Option<TokenUsage>,
}

impl AttemptRecord {
    pub fn success(
        backend_id: impl Into<String>,
        model_name: impl Into<String>,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
        token_usage: Option<TokenUsage>,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            model_name: Some(model_name.into()),
            status: AttemptStatus::Success,
            error_category: None,
            error_code: None,
            latency_ms,
            timestamp,
            token_usage,
        }
    }

    pub fn failure(
        backend_id: impl Into<String>,
        category: ErrorCategory,
        error_code: Option<String>,
        latency_ms: u64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            backend_id: backend_id.into(),
            model_name: None,
            status: AttemptStatus::Failed,
            error_category: Some(category),
            error_code,
            latency_ms,
            timestamp,
            token_usage: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == AttemptStatus::Success
    }
}

/// Accumulating audit trail for one logical generation request.
///
/// Created once by the caller, passed by unique reference into the executor,
/// populated in place, then read (never further mutated) for logging and
/// telemetry. It has no persistence of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationMetadata {
    pub request_id: Uuid,
    /// Ordered, append-only attempt history.
    pub attempts: Vec<AttemptRecord>,
    /// Always equal to `attempts.len() > 1`; maintained on every append.
    pub fallback_used: bool,
    /// Backend of the successful attempt. Set only on overall success.
    pub winning_backend: Option<String>,
    pub winning_model: Option<String>,
    /// Why the earlier attempt(s) failed. Set only when fallback occurred.
    pub fallback_reason: Option<String>,
    /// Set only on overall failure.
    pub final_error: Option<String>,
    pub final_error_category: Option<ErrorCategory>,
}

impl GenerationMetadata {
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            attempts: Vec::new(),
            fallback_used: false,
            winning_backend: None,
            winning_model: None,
            fallback_reason: None,
            final_error: None,
            final_error_category: None,
        }
    }

    /// Append an attempt and keep the derived fallback flag in sync.
    pub fn record_attempt(&mut self, attempt: AttemptRecord) {
        self.attempts.push(attempt);
        self.fallback_used = self.attempts.len() > 1;
    }

    /// Mark overall success on the given backend.
    ///
    /// When earlier attempts failed, `fallback_reason` summarizes them.
    pub fn mark_success(&mut self, backend_id: &str, model_name: &str) {
        self.winning_backend = Some(backend_id.to_string());
        self.winning_model = Some(model_name.to_string());
        self.final_error = None;
        self.final_error_category = None;
        if self.fallback_used {
            self.fallback_reason = Some(self.summarize_failed_attempts());
        }
    }

    /// Mark overall failure with the final (last relevant) error.
    pub fn mark_failure(&mut self, error: impl Into<String>, category: ErrorCategory) {
        self.final_error = Some(error.into());
        self.final_error_category = Some(category);
        if self.fallback_used && self.fallback_reason.is_none() {
            self.fallback_reason = Some(self.summarize_failed_attempts());
        }
    }

    pub fn last_attempt(&self) -> Option<&AttemptRecord> {
        self.attempts.last()
    }

    /// One-line summary of every failed attempt so far, e.g.
    /// `"claude-haiku: timeout; gpt-mini: provider_error (429)"`.
    fn summarize_failed_attempts(&self) -> String {
        let parts: Vec<String> = self
            .attempts
            .iter()
            .filter(|a| !a.is_success())
            .map(|a| {
                let category = a
                    .error_category
                    .map(|c| c.to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                match &a.error_code {
                    Some(code) => format!("{}: {} ({})", a.backend_id, category, code),
                    None => format!("{}: {}", a.backend_id, category),
                }
            })
            .collect();
        parts.join("; ")
    }
}

impl Default for GenerationMetadata {
    fn default() -> Self {
        Self::new()
    }
}
