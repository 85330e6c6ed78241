//! Ordered multi-source flag resolution.
//!
//! [`MergedFlagClient`] wraps several flag clients, each bound to its own
//! project or environment, behind one evaluation interface. Callers do not
//! need to know which project owns a flag, but they *do* need to know how
//! duplicate keys are resolved:
//!
//! - Clients are consulted in registration order, one at a time.
//! - The first client that finds the flag wins. Later clients are never
//!   consulted for that key, even if they define it too.
//! - If no client finds the flag, the **last client's error** is returned.
//!   The caller's fallback is *not* returned in that case.
//!
//! # Examples
//!
//! ```
//! use flagmesh_features::*;
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let project_a = Arc::new(InMemoryFlagClient::new()
//!     .with_flag(FeatureFlag::string("flag-a", "A-VALUE")));
//! let project_b = Arc::new(InMemoryFlagClient::new()
//!     .with_flag(FeatureFlag::string("flag-b", "B-VALUE")));
//!
//! let flags = MergedFlagClient::builder()
//!     .client("Project A", project_a)
//!     .client("Project B", project_b)
//!     .build();
//! flags.initialize().await.unwrap();
//!
//! let ctx = EvaluationContext::new("123");
//! let b = flags.string_variation("flag-b", &ctx, "DEFAULT").await.unwrap();
//! assert_eq!(b, "B-VALUE");
//!
//! // Present in no project: an error, not "DEFAULT".
//! assert!(flags.string_variation("missing", &ctx, "DEFAULT").await.is_err());
//! # });
//! ```

use crate::client::{FlagClient, LabeledClient, noop_observer};
use crate::error::{ClientError, ClientResult, InitError, ResolverError, ResolverResult};
use crate::flag::{EvaluationContext, FromVariation, Variation};
use futures::future::try_join_all;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// A resolved value and the client that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedVariation<T = Variation> {
    pub value: T,

    /// Label of the client that found the flag
    pub label: String,

    /// Position of that client in priority order
    pub index: usize,
}

/// Flag client that resolves lookups across an ordered list of clients.
pub struct MergedFlagClient {
    clients: Vec<LabeledClient>,
    started: AtomicBool,
    ready: AtomicBool,
}

impl MergedFlagClient {
    /// Create from clients in priority order
    pub fn new(clients: Vec<LabeledClient>) -> Self {
        Self {
            clients,
            started: AtomicBool::new(false),
            ready: AtomicBool::new(false),
        }
    }

    pub fn builder() -> MergedFlagClientBuilder {
        MergedFlagClientBuilder::new()
    }

    /// Client labels in priority order
    pub fn labels(&self) -> Vec<&str> {
        self.clients.iter().map(|c| c.label.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::Acquire)
    }

    /// Bring every client to a ready state.
    ///
    /// Registers a no-op error observer on each client that has none, then
    /// waits on all clients concurrently. The first client failure aborts
    /// initialization and leaves the resolver unusable. May only be called
    /// once.
    pub async fn initialize(&self) -> Result<(), InitError> {
        if self.clients.is_empty() {
            return Err(InitError::NoClients);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(InitError::AlreadyInitialized);
        }

        for entry in &self.clients {
            if !entry.client.has_error_observer() {
                entry.client.on_error(noop_observer());
            }
        }

        let waits = self.clients.iter().map(|entry| async move {
            entry.client.wait_for_initialization().await.map_err(|source| {
                warn!(client = %entry.label, error = %source, "flag client failed to initialize");
                InitError::Client {
                    label: entry.label.clone(),
                    source,
                }
            })
        });
        try_join_all(waits).await?;

        self.ready.store(true, Ordering::Release);
        info!(clients = self.clients.len(), "merged flag client ready");
        Ok(())
    }

    /// [`initialize`](Self::initialize), bounded by `timeout`.
    pub async fn initialize_with_timeout(&self, timeout: Duration) -> Result<(), InitError> {
        match tokio::time::timeout(timeout, self.initialize()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(?timeout, "flag clients did not become ready in time");
                Err(InitError::Timeout(timeout))
            }
        }
    }

    /// Evaluate a flag across all clients in priority order.
    ///
    /// Each client uses `fallback` as its own default. The first client that
    /// finds the flag wins, even if the value it serves equals `fallback`.
    ///
    /// # Errors
    ///
    /// When no client finds the flag this returns the error produced by the
    /// **last** client, as [`ResolverError::Source`]. It never returns
    /// `fallback` in that case, so callers that want a default must apply it
    /// themselves:
    ///
    /// ```ignore
    /// let value = flags.variation("my-feature", &ctx, false).await
    ///     .unwrap_or(Variation::boolean(false));
    /// ```
    ///
    /// Also fails with [`ResolverError::NotReady`] before a successful
    /// [`initialize`](Self::initialize), and with
    /// [`ResolverError::ObserverMissing`] if a client lost its observer.
    pub async fn variation(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: impl Into<Variation>,
    ) -> ResolverResult<Variation> {
        self.variation_detail(key, context, fallback)
            .await
            .map(|resolved| resolved.value)
    }

    /// Like [`variation`](Self::variation), also naming the client that
    /// answered.
    pub async fn variation_detail(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: impl Into<Variation>,
    ) -> ResolverResult<ResolvedVariation> {
        self.resolve(key, context, &fallback.into()).await
    }

    /// Typed evaluation. The first client that finds the flag decides; if its
    /// value has another type the result is [`ClientError::WrongType`] and
    /// later clients are not consulted.
    pub async fn typed_variation<T>(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: T,
    ) -> ResolverResult<T>
    where
        T: FromVariation + Into<Variation>,
    {
        let resolved = self.resolve(key, context, &fallback.into()).await?;
        convert(key, resolved.value).map_err(ResolverError::Source)
    }

    pub async fn bool_variation(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: bool,
    ) -> ResolverResult<bool> {
        self.typed_variation(key, context, fallback).await
    }

    pub async fn string_variation(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: impl Into<String>,
    ) -> ResolverResult<String> {
        self.typed_variation(key, context, fallback.into()).await
    }

    pub async fn number_variation(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: f64,
    ) -> ResolverResult<f64> {
        self.typed_variation(key, context, fallback).await
    }

    pub async fn json_variation(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: serde_json::Value,
    ) -> ResolverResult<serde_json::Value> {
        self.typed_variation(key, context, fallback).await
    }

    async fn resolve(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: &Variation,
    ) -> ResolverResult<ResolvedVariation> {
        if self.clients.is_empty() {
            return Err(ResolverError::NoClients);
        }
        if !self.is_ready() {
            return Err(ResolverError::NotReady);
        }

        let mut last_error = None;

        for (index, entry) in self.clients.iter().enumerate() {
            if !entry.client.has_error_observer() {
                return Err(ResolverError::ObserverMissing {
                    label: entry.label.clone(),
                });
            }

            debug!(flag = key, client = %entry.label, "checking client");

            let outcome = entry
                .client
                .evaluate(key, context, fallback)
                .await
                .into_result();

            match outcome {
                Ok(value) => {
                    return Ok(ResolvedVariation {
                        value,
                        label: entry.label.clone(),
                        index,
                    });
                }
                Err(err) => {
                    debug!(flag = key, client = %entry.label, error = %err, "client did not resolve flag");
                    last_error = Some(err);
                }
            }
        }

        Err(last_error.map_or(ResolverError::NoClients, ResolverError::Source))
    }
}

fn convert<T: FromVariation>(key: &str, value: Variation) -> ClientResult<T> {
    let actual = value.kind();
    T::from_variation(value).ok_or_else(|| ClientError::WrongType {
        key: key.to_string(),
        expected: T::KIND,
        actual,
    })
}

impl fmt::Debug for MergedFlagClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MergedFlagClient")
            .field("clients", &self.labels())
            .field("ready", &self.is_ready())
            .finish()
    }
}

/// Builder for [`MergedFlagClient`]. Registration order is priority order.
#[derive(Default)]
pub struct MergedFlagClientBuilder {
    clients: Vec<LabeledClient>,
}

impl MergedFlagClientBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a client with the lowest priority so far
    pub fn client(mut self, label: impl Into<String>, client: Arc<dyn FlagClient>) -> Self {
        self.clients.push(LabeledClient::new(label, client));
        self
    }

    pub fn clients(mut self, clients: impl IntoIterator<Item = LabeledClient>) -> Self {
        self.clients.extend(clients);
        self
    }

    pub fn build(self) -> MergedFlagClient {
        MergedFlagClient::new(self.clients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flag::FeatureFlag;
    use crate::memory::InMemoryFlagClient;

    fn project(flags: Vec<FeatureFlag>) -> Arc<InMemoryFlagClient> {
        Arc::new(InMemoryFlagClient::new().with_flags(flags))
    }

    #[tokio::test]
    async fn test_first_client_wins() {
        let merged = MergedFlagClient::builder()
            .client("Project A", project(vec![FeatureFlag::boolean("my-feature", true)]))
            .client("Project B", project(vec![FeatureFlag::boolean("my-feature", false)]))
            .build();
        merged.initialize().await.unwrap();

        let ctx = EvaluationContext::new("123");
        let detail = merged.variation_detail("my-feature", &ctx, false).await.unwrap();

        assert_eq!(detail.value, Variation::boolean(true));
        assert_eq!(detail.label, "Project A");
        assert_eq!(detail.index, 0);
    }

    #[tokio::test]
    async fn test_registers_observers() {
        let a = project(vec![]);
        let merged = MergedFlagClient::builder().client("A", a.clone()).build();

        assert!(!a.has_error_observer());
        merged.initialize().await.unwrap();
        assert!(a.has_error_observer());
    }

    #[tokio::test]
    async fn test_initialize_twice() {
        let merged = MergedFlagClient::builder().client("A", project(vec![])).build();

        merged.initialize().await.unwrap();
        assert!(matches!(
            merged.initialize().await,
            Err(InitError::AlreadyInitialized)
        ));
    }

    #[tokio::test]
    async fn test_no_clients() {
        let merged = MergedFlagClient::builder().build();
        let ctx = EvaluationContext::new("123");

        assert!(matches!(merged.initialize().await, Err(InitError::NoClients)));
        assert!(matches!(
            merged.variation("flag", &ctx, false).await,
            Err(ResolverError::NoClients)
        ));
    }

    #[tokio::test]
    async fn test_wrong_type_stops_at_first_found() {
        let a = project(vec![FeatureFlag::string("my-feature", "on")]);
        let b = project(vec![FeatureFlag::boolean("my-feature", true)]);
        let merged = MergedFlagClient::builder()
            .client("A", a.clone())
            .client("B", b.clone())
            .build();
        merged.initialize().await.unwrap();

        let ctx = EvaluationContext::new("123");
        let detail = merged.variation_detail("my-feature", &ctx, false).await.unwrap();
        assert_eq!(detail.label, "A");

        let err = merged.bool_variation("my-feature", &ctx, false).await.unwrap_err();
        assert_eq!(
            err.client_error(),
            Some(&ClientError::WrongType {
                key: "my-feature".to_string(),
                expected: "boolean",
                actual: "string",
            })
        );
        assert_eq!(a.evaluation_count(), 2);
        assert_eq!(b.evaluation_count(), 0);
    }

    #[tokio::test]
    async fn test_wrong_type_in_last_client() {
        let merged = MergedFlagClient::builder()
            .client("A", project(vec![FeatureFlag::string("beta", "yes")]))
            .build();
        merged.initialize().await.unwrap();

        let ctx = EvaluationContext::new("123");
        let err = merged.bool_variation("beta", &ctx, false).await.unwrap_err();

        assert_eq!(
            err.client_error(),
            Some(&ClientError::WrongType {
                key: "beta".to_string(),
                expected: "boolean",
                actual: "string",
            })
        );
    }

    #[test]
    fn test_debug_lists_labels() {
        let merged = MergedFlagClient::builder()
            .client("A", project(vec![]))
            .client("B", project(vec![]))
            .build();

        assert_eq!(merged.labels(), vec!["A", "B"]);
        assert!(format!("{:?}", merged).contains("\"B\""));
    }
}
