//! Namespaced flag clients.
//!
//! Keeps several clients side by side, addressed by label. Unlike
//! [`MergedFlagClient`](crate::MergedFlagClient) there is no fallthrough: the
//! caller names the project that owns each flag.

use crate::client::{FlagClient, LabeledClient, noop_observer};
use crate::error::{InitError, ResolverError, ResolverResult};
use crate::flag::{EvaluationContext, Variation};
use std::sync::Arc;
use tracing::{debug, warn};

/// Flag clients addressed by namespace label.
#[derive(Debug, Default)]
pub struct NamespacedFlagClient {
    clients: Vec<LabeledClient>,
}

impl NamespacedFlagClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client. A repeated label replaces the earlier client.
    pub fn with_client(mut self, label: impl Into<String>, client: Arc<dyn FlagClient>) -> Self {
        let entry = LabeledClient::new(label, client);
        match self.clients.iter_mut().find(|c| c.label == entry.label) {
            Some(existing) => *existing = entry,
            None => self.clients.push(entry),
        }
        self
    }

    pub fn namespaces(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.label.as_str()).collect()
    }

    /// The client registered under `label`
    pub fn client(&self, label: &str) -> Option<&Arc<dyn FlagClient>> {
        self.clients
            .iter()
            .find(|c| c.label == label)
            .map(|c| &c.client)
    }

    /// Wait for every client in registration order.
    pub async fn initialize(&self) -> Result<(), InitError> {
        if self.clients.is_empty() {
            return Err(InitError::NoClients);
        }

        for entry in &self.clients {
            if !entry.client.has_error_observer() {
                entry.client.on_error(noop_observer());
            }

            if let Err(source) = entry.client.wait_for_initialization().await {
                warn!(namespace = %entry.label, error = %source, "flag client failed to initialize");
                return Err(InitError::Client {
                    label: entry.label.clone(),
                    source,
                });
            }
            debug!(namespace = %entry.label, "flag client ready");
        }

        Ok(())
    }

    /// Evaluate `key` in the client registered under `namespace`.
    pub async fn variation(
        &self,
        namespace: &str,
        key: &str,
        context: &EvaluationContext,
        fallback: impl Into<Variation>,
    ) -> ResolverResult<Variation> {
        let client = self
            .client(namespace)
            .ok_or_else(|| ResolverError::UnknownNamespace(namespace.to_string()))?;

        let fallback = fallback.into();
        Ok(client.evaluate(key, context, &fallback).await.into_result()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::flag::FeatureFlag;
    use crate::memory::InMemoryFlagClient;

    fn namespaced() -> NamespacedFlagClient {
        NamespacedFlagClient::new()
            .with_client(
                "project-a",
                Arc::new(InMemoryFlagClient::new().with_flag(FeatureFlag::boolean("flag-a", true))),
            )
            .with_client(
                "project-b",
                Arc::new(InMemoryFlagClient::new().with_flag(FeatureFlag::boolean("flag-b", true))),
            )
    }

    #[tokio::test]
    async fn test_lookup_by_namespace() {
        let flags = namespaced();
        flags.initialize().await.unwrap();

        let ctx = EvaluationContext::new("123");
        let a = flags.variation("project-a", "flag-a", &ctx, false).await.unwrap();
        assert_eq!(a, Variation::boolean(true));

        // No fallthrough to the other project.
        let err = flags
            .variation("project-a", "flag-b", &ctx, false)
            .await
            .unwrap_err();
        assert_eq!(
            err.client_error(),
            Some(&ClientError::FlagNotFound("flag-b".to_string()))
        );
    }

    #[tokio::test]
    async fn test_unknown_namespace() {
        let flags = namespaced();
        flags.initialize().await.unwrap();

        let ctx = EvaluationContext::new("123");
        let err = flags
            .variation("project-c", "flag-a", &ctx, false)
            .await
            .unwrap_err();
        assert!(matches!(err, ResolverError::UnknownNamespace(ns) if ns == "project-c"));
    }

    #[tokio::test]
    async fn test_initialize_stops_at_first_failure() {
        let healthy = Arc::new(InMemoryFlagClient::new());
        let flags = NamespacedFlagClient::new()
            .with_client(
                "broken",
                Arc::new(InMemoryFlagClient::new().with_startup_error("unreachable")),
            )
            .with_client("healthy", healthy.clone());

        let err = flags.initialize().await.unwrap_err();
        assert!(matches!(err, InitError::Client { ref label, .. } if label == "broken"));
        assert!(!healthy.is_initialized());
    }

    #[test]
    fn test_replacing_a_namespace() {
        let flags = namespaced().with_client("project-a", Arc::new(InMemoryFlagClient::new()));
        assert_eq!(flags.namespaces(), vec!["project-a", "project-b"]);
    }
}
