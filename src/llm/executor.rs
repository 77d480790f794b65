//! The fallback executor: runs one logical generation request down an ordered
//! backend chain until a backend succeeds, a terminal failure stops the chain,
//! or the chain is exhausted.
//!
//! Execution is sequential and synchronous from the caller's point of view;
//! there is no fan-out across backends. The only blocking the executor owns
//! is the small bounded backoff applied after a rate-limited failure. The
//! caller's timeout applies per attempt, never across the whole chain.

use crate::llm::adapter::{AdapterRegistry, BackendAdapter};
use crate::llm::attempt::{AttemptRecord, ErrorCategory, GenerationMetadata};
use crate::llm::chain::{ChainConfig, ExecutionMode, InvalidChainConfig};
use crate::llm::classifier::{
    Classification, classify_failure, classify_panic, inspect_response_text,
};
use crate::llm::types::{GenerateError, GenerateOutput};
use chrono::Utc;
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Executor tuning knobs.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Bounded delay applied before the next backend after a rate-limited
    /// failure. Long enough not to hammer a rate-limited fleet in immediate
    /// succession, short enough not to inflate end-to-end latency.
    pub rate_limit_backoff: Duration,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            rate_limit_backoff: Duration::from_millis(250),
        }
    }
}

/// Error returned by [`FallbackExecutor::generate_with_fallback`].
///
/// The category tells the caller whether to change the request (terminal) or
/// merely retry later (everything else).
#[derive(Debug, thiserror::Error)]
pub enum FallbackError {
    /// The request content was rejected. Re-raised verbatim, never wrapped as
    /// an aggregate failure: the cause was the request, not the infrastructure.
    #[error(transparent)]
    Terminal(GenerateError),

    /// Every backend in the chain failed with a retryable error. Carries the
    /// last failure plus the complete attempt history for diagnosis.
    #[error("all {attempted} backend(s) failed for {mode:?}; last error: {last_error}")]
    Exhausted {
        mode: ExecutionMode,
        attempted: usize,
        last_error: String,
        last_category: ErrorCategory,
        attempts: Vec<AttemptRecord>,
    },

    /// No backend id in the chain resolved to a live adapter.
    #[error("no live backend could be resolved for {mode:?}")]
    NoLiveBackend {
        mode: ExecutionMode,
        attempts: Vec<AttemptRecord>,
    },
}

/// Outcome of classifying one attempt, before deciding how to proceed.
enum AttemptOutcome {
    Success(GenerateOutput),
    Failure {
        classification: Classification,
        message: String,
        /// Present when the adapter raised a typed failure; terminal errors
        /// are re-raised from this, verbatim.
        source: Option<GenerateError>,
    },
}

/// Dispatches one logical request across an ordered chain of backends.
///
/// Construction validates the chain configuration; after that the executor is
/// immutable and safe to share across concurrent requests (each request owns
/// its own [`GenerationMetadata`]).
pub struct FallbackExecutor {
    registry: AdapterRegistry,
    chains: ChainConfig,
    config: ExecutorConfig,
}

impl FallbackExecutor {
    pub fn new(registry: AdapterRegistry, chains: ChainConfig) -> Result<Self, InvalidChainConfig> {
        Self::with_config(registry, chains, ExecutorConfig::default())
    }

    pub fn with_config(
        registry: AdapterRegistry,
        chains: ChainConfig,
        config: ExecutorConfig,
    ) -> Result<Self, InvalidChainConfig> {
        chains.validate()?;
        Ok(Self {
            registry,
            chains,
            config,
        })
    }

    /// Run `prompt` down the chain for `mode`.
    ///
    /// Every backend receives the unmodified original prompt and the caller's
    /// per-attempt `timeout`. `metadata` is populated in place on every exit
    /// path: first success returns immediately, a terminal failure stops the
    /// chain and propagates verbatim, and exhaustion returns the last
    /// retryable failure wrapped with the full attempt history.
    pub async fn generate_with_fallback(
        &self,
        prompt: &str,
        mode: ExecutionMode,
        metadata: &mut GenerationMetadata,
        timeout: Duration,
    ) -> Result<GenerateOutput, FallbackError> {
        let chain = self.chains.chain_for(mode);
        let live = self.resolve_chain(chain, metadata);

        if live.is_empty() {
            error!(?mode, chain = ?chain, "no backend in chain resolved to a live adapter");
            metadata.mark_failure(
                format!("no live backend in chain {:?}", chain),
                ErrorCategory::ProviderError,
            );
            return Err(FallbackError::NoLiveBackend {
                mode,
                attempts: metadata.attempts.clone(),
            });
        }

        let total = live.len();
        let mut last_failure: Option<(String, ErrorCategory)> = None;

        for (index, adapter) in live.iter().enumerate() {
            let backend_id = adapter.backend_id().to_string();
            let started_at = Utc::now();
            let clock = Instant::now();

            let outcome = self.invoke_backend(adapter.as_ref(), prompt, timeout).await;
            let latency_ms = clock.elapsed().as_millis() as u64;

            match outcome {
                AttemptOutcome::Success(output) => {
                    metadata.record_attempt(AttemptRecord::success(
                        &backend_id,
                        &output.model_name,
                        latency_ms,
                        started_at,
                        output.token_usage.clone(),
                    ));
                    metadata.mark_success(&backend_id, &output.model_name);
                    info!(
                        backend = %backend_id,
                        model = %output.model_name,
                        latency_ms,
                        fallback = metadata.fallback_used,
                        "generation succeeded"
                    );
                    return Ok(output);
                }
                AttemptOutcome::Failure {
                    classification,
                    message,
                    source,
                } => {
                    let category = classification.category;
                    metadata.record_attempt(AttemptRecord::failure(
                        &backend_id,
                        category,
                        classification.error_code.clone(),
                        latency_ms,
                        started_at,
                    ));

                    if !classification.should_retry {
                        error!(
                            backend = %backend_id,
                            %category,
                            latency_ms,
                            "terminal failure, stopping chain"
                        );
                        metadata.mark_failure(&message, category);
                        let verbatim =
                            source.unwrap_or_else(|| GenerateError::Terminal(message));
                        return Err(FallbackError::Terminal(verbatim));
                    }

                    warn!(
                        backend = %backend_id,
                        %category,
                        code = classification.error_code.as_deref().unwrap_or(""),
                        latency_ms,
                        remaining = total - index - 1,
                        "retryable failure"
                    );
                    last_failure = Some((message, category));

                    if classification.rate_limited && index + 1 < total {
                        tokio::time::sleep(self.config.rate_limit_backoff).await;
                    }
                }
            }
        }

        // Chain exhausted: every backend failed with a retryable error.
        let (last_error, last_category) = last_failure
            .unwrap_or_else(|| ("chain exhausted".to_string(), ErrorCategory::ProviderError));
        metadata.mark_failure(&last_error, last_category);
        error!(?mode, attempted = total, %last_error, "all backends exhausted");
        Err(FallbackError::Exhausted {
            mode,
            attempted: total,
            last_error,
            last_category,
            attempts: metadata.attempts.clone(),
        })
    }

    /// Resolve chain ids to live adapters, recording a `provider_not_found`
    /// attempt for each id with no registered adapter so the chain's intended
    /// shape stays observable even when misconfigured.
    fn resolve_chain(
        &self,
        chain: &[String],
        metadata: &mut GenerationMetadata,
    ) -> Vec<Arc<dyn BackendAdapter>> {
        let mut live = Vec::with_capacity(chain.len());
        for backend_id in chain {
            match self.registry.resolve(backend_id) {
                Some(adapter) => live.push(adapter),
                None => {
                    warn!(backend = %backend_id, "backend id has no registered adapter");
                    metadata.record_attempt(AttemptRecord::failure(
                        backend_id,
                        ErrorCategory::ProviderError,
                        Some("provider_not_found".to_string()),
                        0,
                        Utc::now(),
                    ));
                }
            }
        }
        live
    }

    /// Invoke one adapter and classify whatever comes back.
    ///
    /// The adapter call is fenced two ways: `tokio::time::timeout` enforces
    /// the caller's deadline even against an adapter that never resolves
    /// (dropping the future so no background work continues), and
    /// `catch_unwind` turns an adapter panic into an `exception`-category
    /// failure instead of tearing down the request.
    async fn invoke_backend(
        &self,
        adapter: &dyn BackendAdapter,
        prompt: &str,
        timeout: Duration,
    ) -> AttemptOutcome {
        let call = AssertUnwindSafe(adapter.generate(prompt, timeout)).catch_unwind();
        let result = match tokio::time::timeout(timeout, call).await {
            Err(_) => Err(GenerateError::Timeout(timeout)),
            Ok(Err(payload)) => {
                return AttemptOutcome::Failure {
                    classification: classify_panic(),
                    message: format!("adapter panicked: {}", panic_message(&*payload)),
                    source: None,
                };
            }
            Ok(Ok(result)) => result,
        };

        match result {
            Ok(output) => match inspect_response_text(&output.text) {
                None => AttemptOutcome::Success(output),
                Some(classification) => {
                    warn!(
                        backend = adapter.backend_id(),
                        preview = %preview(&output.text),
                        "adapter returned error boilerplate as response text"
                    );
                    AttemptOutcome::Failure {
                        classification,
                        message: format!("contract violation: {}", preview(&output.text)),
                        source: None,
                    }
                }
            },
            Err(err) => AttemptOutcome::Failure {
                classification: classify_failure(&err),
                message: err.to_string(),
                source: Some(err),
            },
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

fn preview(text: &str) -> String {
    const MAX: usize = 120;
    if text.chars().count() > MAX {
        let head: String = text.chars().take(MAX).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
