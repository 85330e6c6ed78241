//! Flag client trait definition.

use crate::error::{ClientError, ClientResult};
use crate::flag::{EvaluationContext, Variation};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Callback invoked when a client hits an internal error.
pub type ErrorObserver = Arc<dyn Fn(&ClientError) + Send + Sync>;

/// Observer that discards every error.
///
/// Registering it is enough to make a client report failures through
/// [`Evaluation`] instead of its logger.
pub fn noop_observer() -> ErrorObserver {
    Arc::new(|_| {})
}

/// Outcome of evaluating one flag against one client.
#[derive(Debug, Clone, PartialEq)]
pub enum Evaluation {
    /// The client resolved the flag. The value may equal the fallback.
    Found(Variation),

    /// The key is absent from this client's project
    NotFound { key: String },

    /// The client failed to evaluate the flag
    Failed(ClientError),
}

impl Evaluation {
    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found(_))
    }

    /// Convert into a result, mapping absence to [`ClientError::FlagNotFound`].
    pub fn into_result(self) -> ClientResult<Variation> {
        match self {
            Self::Found(value) => Ok(value),
            Self::NotFound { key } => Err(ClientError::FlagNotFound(key)),
            Self::Failed(err) => Err(err),
        }
    }
}

/// A flag source bound to one project or environment.
///
/// Implementations must be safe for concurrent use.
#[async_trait]
pub trait FlagClient: Send + Sync {
    /// Wait until the client is ready to evaluate flags.
    ///
    /// Returns an error if the client cannot start.
    async fn wait_for_initialization(&self) -> ClientResult<()>;

    /// Register a failure observer.
    ///
    /// Clients without an observer may route evaluation failures to their
    /// logger and report [`Evaluation::Found`] with the fallback instead.
    fn on_error(&self, observer: ErrorObserver);

    /// Whether a failure observer has been registered.
    fn has_error_observer(&self) -> bool;

    /// Evaluate `key` for `context`, using `fallback` as this client's own
    /// default.
    async fn evaluate(
        &self,
        key: &str,
        context: &EvaluationContext,
        fallback: &Variation,
    ) -> Evaluation;
}

/// A flag client paired with a display label.
#[derive(Clone)]
pub struct LabeledClient {
    pub label: String,
    pub client: Arc<dyn FlagClient>,
}

impl LabeledClient {
    pub fn new(label: impl Into<String>, client: Arc<dyn FlagClient>) -> Self {
        Self {
            label: label.into(),
            client,
        }
    }
}

impl fmt::Debug for LabeledClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LabeledClient")
            .field("label", &self.label)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_flag_not_found() {
        let outcome = Evaluation::NotFound {
            key: "flag-a".to_string(),
        };

        assert!(!outcome.is_found());
        assert_eq!(
            outcome.into_result(),
            Err(ClientError::FlagNotFound("flag-a".to_string()))
        );
    }

    #[test]
    fn test_found_passes_value_through() {
        let outcome = Evaluation::Found(Variation::boolean(false));
        assert_eq!(outcome.into_result(), Ok(Variation::boolean(false)));
    }

    #[test]
    fn test_noop_observer_accepts_errors() {
        let observer = noop_observer();
        observer(&ClientError::NotInitialized);
    }
}
