pub mod adapter;
pub mod attempt;
pub mod chain;
pub mod classifier;
pub mod executor;
pub mod types;

pub use adapter::{AdapterRegistry, BackendAdapter};
pub use attempt::{AttemptRecord, AttemptStatus, ErrorCategory, GenerationMetadata};
pub use chain::{ChainConfig, ExecutionMode, InvalidChainConfig};
pub use executor::{ExecutorConfig, FallbackError, FallbackExecutor};
pub use types::*;
