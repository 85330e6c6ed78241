//! In-memory flag client.
//!
//! Serves flag definitions held in memory or loaded from a JSON file. Useful
//! for local development, tests, and as an offline source alongside real
//! flag services.

use crate::client::{ErrorObserver, Evaluation, FlagClient};
use crate::error::{ClientError, ClientResult};
use crate::flag::{EvaluationContext, FeatureFlag, Variation};
use async_trait::async_trait;
use parking_lot::RwLock as SyncRwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error};

/// Flag client backed by an in-memory flag table.
///
/// # Examples
///
/// ```
/// use flagmesh_features::*;
///
/// # tokio_test::block_on(async {
/// let client = InMemoryFlagClient::new()
///     .with_flag(FeatureFlag::string("flag-a", "A-VALUE"));
/// client.on_error(noop_observer());
/// client.wait_for_initialization().await.unwrap();
///
/// let ctx = EvaluationContext::new("123");
/// let outcome = client.evaluate("flag-a", &ctx, &Variation::string("DEFAULT")).await;
/// assert_eq!(outcome, Evaluation::Found(Variation::string("A-VALUE")));
/// # });
/// ```
pub struct InMemoryFlagClient {
    flags: RwLock<HashMap<String, FeatureFlag>>,
    observer: SyncRwLock<Option<ErrorObserver>>,
    initialized: AtomicBool,
    startup_error: Option<String>,
    init_delay: Option<Duration>,
    evaluations: AtomicUsize,
}

impl InMemoryFlagClient {
    /// Create an empty client
    pub fn new() -> Self {
        Self {
            flags: RwLock::new(HashMap::new()),
            observer: SyncRwLock::new(None),
            initialized: AtomicBool::new(false),
            startup_error: None,
            init_delay: None,
            evaluations: AtomicUsize::new(0),
        }
    }

    /// Parse a JSON array of flag definitions.
    pub fn from_json_str(json: &str) -> ClientResult<Self> {
        let flags: Vec<FeatureFlag> = serde_json::from_str(json)
            .map_err(|e| ClientError::InvalidFlagData(e.to_string()))?;

        Ok(Self::new().with_flags(flags))
    }

    /// Load a JSON array of flag definitions from disk.
    pub fn from_file(path: impl AsRef<Path>) -> ClientResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ClientError::InvalidFlagData(format!("failed to read {}: {}", path.display(), e))
        })?;

        Self::from_json_str(&content)
    }

    pub fn with_flag(mut self, flag: FeatureFlag) -> Self {
        self.flags.get_mut().insert(flag.key.clone(), flag);
        self
    }

    pub fn with_flags(mut self, flags: impl IntoIterator<Item = FeatureFlag>) -> Self {
        let table = self.flags.get_mut();
        for flag in flags {
            table.insert(flag.key.clone(), flag);
        }
        self
    }

    /// Make `wait_for_initialization` fail with a startup error.
    pub fn with_startup_error(mut self, message: impl Into<String>) -> Self {
        self.startup_error = Some(message.into());
        self
    }

    /// Delay readiness, simulating a slow backend.
    pub fn with_init_delay(mut self, delay: Duration) -> Self {
        self.init_delay = Some(delay);
        self
    }

    /// Add or replace a flag at runtime
    pub async fn set_flag(&self, flag: FeatureFlag) {
        self.flags.write().await.insert(flag.key.clone(), flag);
    }

    /// Remove a flag at runtime, returning whether it existed
    pub async fn remove_flag(&self, key: &str) -> bool {
        self.flags.write().await.remove(key).is_some()
    }

    /// Keys of all known flags, sorted
    pub async fn flag_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.flags.read().await.keys().cloned().collect();
        keys.sort();
        keys
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Number of `evaluate` calls received
    pub fn evaluation_count(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    /// Deliver a failure to the observer, or log it and serve the fallback
    /// when no observer is registered.
    fn report(&self, err: ClientError, outcome: Evaluation, fallback: &Variation) -> Evaluation {
        let observer = self.observer.read().clone();
        match observer {
            Some(observer) => {
                observer(&err);
                outcome
            }
            None => {
                error!(error = %err, "flag evaluation failed, serving fallback");
                Evaluation::Found(fallback.clone())
            }
        }
    }
}

impl Default for InMemoryFlagClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl FlagClient for InMemoryFlagClient {
    async fn wait_for_initialization(&self) -> ClientResult<()> {
        if let Some(delay) = self.init_delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(ref message) = self.startup_error {
            let err = ClientError::Startup(message.clone());
            let observer = self.observer.read().clone();
            if let Some(observer) = observer {
                observer(&err);
            }
            return Err(err);
        }

        self.initialized.store(true, Ordering::Release);
        let count = self.flags.read().await.len();
        debug!(flags = count, "in-memory flag client ready");
        Ok(())
    }

    fn on_error(&self, observer: ErrorObserver) {
        *self.observer.write() = Some(observer);
    }

    fn has_error_observer(&self) -> bool {
        self.observer.read().is_some()
    }

    async fn evaluate(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: &Variation,
    ) -> Evaluation {
        self.evaluations.fetch_add(1, Ordering::Relaxed);

        if !self.is_initialized() {
            let err = ClientError::NotInitialized;
            return self.report(err.clone(), Evaluation::Failed(err), fallback);
        }

        let flags = self.flags.read().await;
        match flags.get(key) {
            Some(flag) => Evaluation::Found(flag.evaluate(context)),
            None => self.report(
                ClientError::FlagNotFound(key.to_string()),
                Evaluation::NotFound {
                    key: key.to_string(),
                },
                fallback,
            ),
        }
    }
}
