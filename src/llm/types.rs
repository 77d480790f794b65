use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Successful result of a single backend invocation.
///
/// Adapters must only construct this for genuinely successful generations;
/// error conditions are expressed through [`GenerateError`]. A response that
/// merely *looks* like an error text is caught later by the classifier's
/// contract-violation check, not here.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateOutput {
    /// The generated response text.
    pub text: String,
    /// Model identifier the backend actually resolved to for this call.
    pub model_name: String,
    /// Token/cost accounting, when the backend reports it.
    pub token_usage: Option<TokenUsage>,
}

/// Token usage statistics reported by a backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
    pub total_tokens: u64,
    pub estimated_cost: f64,
}

/// Closed set of failures an adapter is allowed to raise.
///
/// This is the entire adapter failure surface: a timeout, an infrastructure
/// fault with a machine-readable code, or a terminal rejection of the request
/// content itself. Anything an adapter cannot express here (a panic, an
/// error disguised as response text) is handled by the executor and
/// classifier, never by widening this enum.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GenerateError {
    /// The backend did not answer within the allotted time.
    #[error("backend timed out after {0:?}")]
    Timeout(Duration),

    /// Infrastructure fault: rate limit, 5xx, network, auth, quota.
    ///
    /// `code` is machine-readable (e.g. `"429"`, `"503"`, `"quota_exceeded"`)
    /// and drives rate-limit backoff in the executor.
    #[error("provider failure ({code}): {message}")]
    Provider { code: String, message: String },

    /// The *content* of the request was rejected (safety/policy block).
    ///
    /// Never retried against another backend.
    #[error("request rejected by backend: {0}")]
    Terminal(String),
}

impl GenerateError {
    /// Convenience constructor for provider failures.
    pub fn provider(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            code: code.into(),
            message: message.into(),
        }
    }
}
