//! Execution modes and the chain selector.
//!
//! A chain is the ordered list of backend ids to try for a given execution
//! mode. Selection is pure and total: every mode resolves to a non-empty
//! chain, with unmapped (or empty-mapped) modes falling back to the default
//! chain. Ordering encodes mode priorities: direct answers go cheapest-first,
//! research goes quality-first, code generation goes reliability-first.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// What kind of work the caller is asking for. Drives chain ordering only;
/// the executor treats every mode identically once the chain is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Short factual replies; cheapest/fastest backend first.
    DirectAnswer,
    /// Output quality matters more than latency; strongest backend first.
    Research,
    /// Correctness-sensitive generation; most reliable backend first.
    CodeGeneration,
}

/// Mapping from execution modes to ordered backend chains.
///
/// Supplied at executor construction. Derives serde so the owning process can
/// load it from TOML (or any other config source); this crate defines no file
/// format of its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Per-mode chains. A missing or empty entry falls back to `default_chain`.
    #[serde(default)]
    pub chains: HashMap<ExecutionMode, Vec<String>>,
    /// Chain used for modes without a (non-empty) mapping. Must be non-empty.
    pub default_chain: Vec<String>,
}

impl ChainConfig {
    /// Ordered backend ids to try for `mode`. Pure and total: never empty as
    /// long as the config passed [`ChainConfig::validate`].
    pub fn chain_for(&self, mode: ExecutionMode) -> &[String] {
        match self.chains.get(&mode) {
            Some(chain) if !chain.is_empty() => chain,
            _ => &self.default_chain,
        }
    }

    /// Reject configurations that could produce an empty chain.
    pub fn validate(&self) -> Result<(), InvalidChainConfig> {
        if self.default_chain.is_empty() {
            return Err(InvalidChainConfig::EmptyDefaultChain);
        }
        Ok(())
    }
}

impl Default for ChainConfig {
    fn default() -> Self {
        let mut chains = HashMap::new();
        chains.insert(
            ExecutionMode::DirectAnswer,
            vec![
                "claude-haiku".to_string(),
                "gpt-mini".to_string(),
                "claude-sonnet".to_string(),
            ],
        );
        chains.insert(
            ExecutionMode::Research,
            vec![
                "claude-opus".to_string(),
                "gpt".to_string(),
                "claude-sonnet".to_string(),
            ],
        );
        chains.insert(
            ExecutionMode::CodeGeneration,
            vec![
                "claude-sonnet".to_string(),
                "gpt".to_string(),
                "claude-haiku".to_string(),
            ],
        );
        Self {
            chains,
            default_chain: vec!["claude-sonnet".to_string(), "gpt".to_string()],
        }
    }
}

/// Configuration errors caught at executor construction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvalidChainConfig {
    #[error("default chain must contain at least one backend id")]
    EmptyDefaultChain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_mode_resolves_to_a_non_empty_chain() {
        let config = ChainConfig::default();
        config.validate().unwrap();
        for mode in [
            ExecutionMode::DirectAnswer,
            ExecutionMode::Research,
            ExecutionMode::CodeGeneration,
        ] {
            assert!(!config.chain_for(mode).is_empty());
        }
    }

    #[test]
    fn unmapped_mode_falls_back_to_default_chain() {
        let config = ChainConfig {
            chains: HashMap::new(),
            default_chain: vec!["fallback-backend".to_string()],
        };
        assert_eq!(
            config.chain_for(ExecutionMode::Research),
            ["fallback-backend".to_string()]
        );
    }

    #[test]
    fn empty_mapped_chain_falls_back_to_default_chain() {
        let mut chains = HashMap::new();
        chains.insert(ExecutionMode::DirectAnswer, Vec::new());
        let config = ChainConfig {
            chains,
            default_chain: vec!["fallback-backend".to_string()],
        };
        assert_eq!(
            config.chain_for(ExecutionMode::DirectAnswer),
            ["fallback-backend".to_string()]
        );
    }

    #[test]
    fn empty_default_chain_is_rejected() {
        let config = ChainConfig {
            chains: HashMap::new(),
            default_chain: Vec::new(),
        };
        assert_eq!(
            config.validate(),
            Err(InvalidChainConfig::EmptyDefaultChain)
        );
    }

    #[test]
    fn chain_config_loads_from_toml() {
        let config: ChainConfig = toml::from_str(
            r#"
            default_chain = ["primary", "backup"]

            [chains]
            research = ["strong", "primary"]
            code_generation = ["steady"]
        "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(
            config.chain_for(ExecutionMode::Research),
            ["strong".to_string(), "primary".to_string()]
        );
        assert_eq!(
            config.chain_for(ExecutionMode::CodeGeneration),
            ["steady".to_string()]
        );
        // direct_answer unmapped: default chain applies.
        assert_eq!(
            config.chain_for(ExecutionMode::DirectAnswer),
            ["primary".to_string(), "backup".to_string()]
        );
    }
}
