//! Error types for flag clients and resolvers.

use std::time::Duration;
use thiserror::Error;

/// Result type for flag client operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Result type for resolver evaluations.
pub type ResolverResult<T> = Result<T, ResolverError>;

/// Errors reported by a single flag client.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// The flag key does not exist in this client's project
    #[error("Flag not found: {0}")]
    FlagNotFound(String),

    /// The flag exists but holds a value of another type
    #[error("Flag {key} has type {actual}, expected {expected}")]
    WrongType {
        key: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// Evaluation attempted before the client finished initializing
    #[error("Client not initialized")]
    NotInitialized,

    /// The client could not start (bad configuration, unreachable backend)
    #[error("Startup failed: {0}")]
    Startup(String),

    /// The client failed while evaluating a flag
    #[error("Evaluation failed: {0}")]
    Evaluation(String),

    /// Flag definitions could not be parsed
    #[error("Invalid flag data: {0}")]
    InvalidFlagData(String),
}

/// Errors raised while bringing a resolver's clients to a ready state.
#[derive(Debug, Error)]
pub enum InitError {
    /// No client was registered
    #[error("No flag clients registered")]
    NoClients,

    /// `initialize` was already called
    #[error("Resolver already initialized")]
    AlreadyInitialized,

    /// A client failed its readiness wait
    #[error("Client '{label}' failed to initialize: {source}")]
    Client {
        label: String,
        #[source]
        source: ClientError,
    },

    /// Not every client became ready in time
    #[error("Initialization timed out after {0:?}")]
    Timeout(Duration),
}

/// Errors returned from a resolver evaluation.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// `variation` called before a successful `initialize`
    #[error("Resolver not ready: call initialize first")]
    NotReady,

    /// No client was registered
    #[error("No flag clients registered")]
    NoClients,

    /// A client has no failure observer, so its failures would be
    /// indistinguishable from found values
    #[error("Client '{label}' has no error observer registered")]
    ObserverMissing { label: String },

    /// No client is registered under this namespace
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// The error reported by the last client consulted
    #[error(transparent)]
    Source(#[from] ClientError),
}

impl ResolverError {
    /// The client error carried by this failure, if any.
    pub fn client_error(&self) -> Option<&ClientError> {
        match self {
            Self::Source(err) => Some(err),
            _ => None,
        }
    }
}
