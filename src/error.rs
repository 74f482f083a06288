//! Error handling for actorgraph-rs
//!
//! Module-level errors (`TreeError`, `GraphError`, `ParamError`) convert into
//! [`ActorGraphError`], the error returned by the actor system facade.

use crate::capability::TreeError;
use crate::graph::{ActorId, GraphError};
use crate::params::ParamError;
use thiserror::Error;

/// Main error type for actor system operations
#[derive(Error, Debug)]
pub enum ActorGraphError {
    /// Capability text could not be parsed
    #[error("Capability syntax error: {0}")]
    Capability(#[from] TreeError),

    /// A graph mutation was rejected
    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    /// A parameter write was rejected
    #[error("Parameter error: {0}")]
    Parameter(#[from] ParamError),

    /// No constructor registered for an actor kind
    #[error("Unknown actor kind '{0}'")]
    UnknownActorKind(String),

    /// The actor does not exist (never created or already destroyed)
    #[error("Unknown actor {0}")]
    UnknownActor(ActorId),

    /// Every valid actor id has been handed out
    #[error("Actor ids exhausted")]
    IdsExhausted,

    /// The actor's thread could not be started
    #[error("Failed to spawn actor thread: {0}")]
    Spawn(String),

    /// Shared state lock was poisoned by a panicking thread
    #[error("Lock poisoned: {0}")]
    Lock(String),

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<ActorGraphError>,
    },
}

impl ActorGraphError {
    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        ActorGraphError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// The innermost error, with all context layers stripped.
    pub fn root(&self) -> &ActorGraphError {
        match self {
            ActorGraphError::WithContext { source, .. } => source.root(),
            other => other,
        }
    }
}

impl From<serde_json::Error> for ActorGraphError {
    fn from(err: serde_json::Error) -> Self {
        ActorGraphError::Serialization(err.to_string())
    }
}

/// Result type alias for actor system operations
pub type Result<T> = std::result::Result<T, ActorGraphError>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error result
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context lazily to an error result
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: Into<ActorGraphError>,
{
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.into().with_context(context))
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| e.into().with_context(f()))
    }
}
