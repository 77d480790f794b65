//! Backend adapter boundary and the registry that resolves backend ids.
//!
//! The executor never talks to a vendor API directly; it only depends on the
//! [`BackendAdapter`] trait. Concrete adapters (HTTP clients for specific
//! vendors, CLI bridges, local models) live in the owning application and are
//! registered here under their backend id.

use crate::llm::types::{GenerateError, GenerateOutput};
use futures::future::BoxFuture;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Uniform contract every LLM backend adapter implements.
///
/// `generate` must either return response text or raise one of the
/// [`GenerateError`] variants. The call must honor `timeout` and must not
/// leave background work running against the backend once the future is
/// dropped; the executor additionally enforces the deadline from the outside.
pub trait BackendAdapter: Send + Sync {
    /// Execute a single generation request against this backend.
    fn generate<'a>(
        &'a self,
        prompt: &'a str,
        timeout: Duration,
    ) -> BoxFuture<'a, Result<GenerateOutput, GenerateError>>;

    /// Stable identifier this adapter is addressed by in chain configuration.
    fn backend_id(&self) -> &str;
}

/// Registry mapping backend ids to live adapters.
///
/// Built once by the owning application at startup and shared read-only with
/// the executor. Ids present in a chain but absent here are reported by the
/// executor as `provider_not_found` attempts rather than silently skipped.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, Arc<dyn BackendAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own `backend_id`.
    ///
    /// Re-registering an id replaces the previous adapter.
    pub fn register(&mut self, adapter: Arc<dyn BackendAdapter>) {
        self.adapters
            .insert(adapter.backend_id().to_string(), adapter);
    }

    /// Resolve a backend id to a live adapter, if one is registered.
    pub fn resolve(&self, backend_id: &str) -> Option<Arc<dyn BackendAdapter>> {
        self.adapters.get(backend_id).cloned()
    }

    pub fn contains(&self, backend_id: &str) -> bool {
        self.adapters.contains_key(backend_id)
    }

    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut ids: Vec<&str> = self.adapters.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("AdapterRegistry").field("ids", &ids).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct EchoAdapter {
        id: &'static str,
    }

    impl BackendAdapter for EchoAdapter {
        fn generate<'a>(
            &'a self,
            prompt: &'a str,
            _timeout: Duration,
        ) -> BoxFuture<'a, Result<GenerateOutput, GenerateError>> {
            Box::pin(async move {
                Ok(GenerateOutput {
                    text: prompt.to_string(),
                    model_name: "echo-1".to_string(),
                    token_usage: None,
                })
            })
        }

        fn backend_id(&self) -> &str {
            self.id
        }
    }

    #[test]
    fn resolves_registered_adapters_by_id() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(EchoAdapter { id: "echo" }));

        assert!(registry.contains("echo"));
        assert!(registry.resolve("echo").is_some());
        assert!(registry.resolve("missing").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn reregistering_an_id_replaces_the_adapter() {
        let mut registry = AdapterRegistry::new();
        registry.register(Arc::new(EchoAdapter { id: "echo" }));
        registry.register(Arc::new(EchoAdapter { id: "echo" }));
        assert_eq!(registry.len(), 1);
    }
}
