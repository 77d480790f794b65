//! # Understudy
//!
//! Provider fallback core for console-style AI assistants that dispatch user
//! requests to one of several interchangeable LLM backends. For a single
//! logical generation request it decides which backend to try, in what order,
//! how to classify each failure, when to retry against a different backend,
//! and when to give up, while producing a complete audit trail of every
//! attempt.
//!
//! ## Architecture Overview
//!
//! Everything lives under the [`llm`] module:
//!
//! - **[`llm::adapter`]**: the [`BackendAdapter`] boundary every vendor
//!   integration implements, plus the [`AdapterRegistry`] resolving backend
//!   ids to live adapters
//! - **[`llm::chain`]**: execution modes and the pure chain selector mapping
//!   each mode to an ordered backend chain
//! - **[`llm::classifier`]**: failure categorization, retry verdicts, and the
//!   contract-violation heuristic for errors disguised as response text
//! - **[`llm::attempt`]**: the attempt audit trail — [`AttemptRecord`] and the
//!   per-request [`GenerationMetadata`] accumulator
//! - **[`llm::executor`]**: the [`FallbackExecutor`] state machine tying it
//!   all together
//!
//! ## Failure Semantics
//!
//! - **Terminal** failures (content/policy rejections) stop the chain
//!   immediately and propagate verbatim; a blocked request is never shopped
//!   across backends
//! - **Retryable** failures (timeout, rate limit, server error, adapter
//!   crash) fall through to the next backend; rate-limited failures insert a
//!   small bounded delay first
//! - On exhaustion the last retryable failure is re-raised wrapped with the
//!   complete attempt history
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use understudy::{
//!     AdapterRegistry, ChainConfig, ExecutionMode, FallbackExecutor, GenerationMetadata,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let registry = AdapterRegistry::new();
//!     // ... register vendor adapters ...
//!     let executor = FallbackExecutor::new(registry, ChainConfig::default())?;
//!
//!     let mut metadata = GenerationMetadata::new();
//!     let output = executor
//!         .generate_with_fallback(
//!             "Summarize the borrow checker in one paragraph",
//!             ExecutionMode::DirectAnswer,
//!             &mut metadata,
//!             Duration::from_secs(30),
//!         )
//!         .await?;
//!
//!     println!("{} (via {:?})", output.text, metadata.winning_backend);
//!     Ok(())
//! }
//! ```

/// Provider fallback core: adapter boundary, chain selection, error
/// classification, attempt audit trail, and the fallback executor.
pub mod llm;

// Re-export the crate surface at the top level.
pub use llm::{
    AdapterRegistry, AttemptRecord, AttemptStatus, BackendAdapter, ChainConfig, ErrorCategory,
    ExecutionMode, ExecutorConfig, FallbackError, FallbackExecutor, GenerateError, GenerateOutput,
    GenerationMetadata, InvalidChainConfig, TokenUsage,
};
