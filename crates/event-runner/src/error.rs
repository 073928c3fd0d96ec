//! Error types for event dispatch and commits.

use thiserror::Error;

use crate::Phase;

/// Error returned by an event handler.
///
/// Any error type converts into it with `?`, and strings convert with
/// `.into()`.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors that stop a dispatch phase.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No handler is registered for the event type in this phase.
    #[error("Could not find a {phase} event handler for the event {event_type}.")]
    HandlerNotFound {
        phase: Phase,
        event_type: &'static str,
    },

    /// A handler returned an error while processing an event.
    ///
    /// Displays the handler's own message unchanged.
    #[error("{source}")]
    Handler {
        phase: Phase,
        handler: &'static str,
        #[source]
        source: HandlerError,
    },

    /// Handlers kept raising events past the configured number of generations.
    #[error(
        "The {phase} event loop exceeded the configured limit of {limit} generations. This implies a circular set of events."
    )]
    CascadeLimitExceeded { phase: Phase, limit: usize },

    /// An AfterSave handler raised an event that can only run before a save.
    #[error(
        "An AfterSave event handler raised the BeforeSave event {event_type}, which cannot run once the changes are persisted."
    )]
    UnexpectedPhaseEvent { event_type: &'static str },
}

impl DispatchError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DispatchError::HandlerNotFound { .. } => "handler_not_found",
            DispatchError::Handler { .. } => "handler",
            DispatchError::CascadeLimitExceeded { .. } => "cascade_limit",
            DispatchError::UnexpectedPhaseEvent { .. } => "unexpected_phase",
        }
    }
}

/// Errors that can occur while committing a unit of work.
///
/// The display form is the inner error's, unchanged.
#[derive(Debug, Error)]
pub enum CommitError<S>
where
    S: std::error::Error + 'static,
{
    /// BeforeSave dispatch failed; nothing was persisted.
    #[error(transparent)]
    BeforeCommit(DispatchError),

    /// The store failed to persist; no AfterSave handler ran.
    #[error(transparent)]
    Persist(S),

    /// AfterSave dispatch failed; the changes are already persisted.
    #[error(transparent)]
    AfterCommit(DispatchError),
}

impl<S> CommitError<S>
where
    S: std::error::Error + 'static,
{
    /// Returns true if the store persisted the changes before the failure.
    pub fn is_persisted(&self) -> bool {
        matches!(self, CommitError::AfterCommit(_))
    }

    /// Returns the dispatch error, if the failure came from a handler phase.
    pub fn dispatch_error(&self) -> Option<&DispatchError> {
        match self {
            CommitError::BeforeCommit(e) | CommitError::AfterCommit(e) => Some(e),
            CommitError::Persist(_) => None,
        }
    }

    /// Short label for the stage that failed, used for metrics.
    pub fn stage(&self) -> &'static str {
        match self {
            CommitError::BeforeCommit(_) => "before_commit",
            CommitError::Persist(_) => "persist",
            CommitError::AfterCommit(_) => "after_commit",
        }
    }
}

/// Errors raised while building a handler registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Two handlers were registered for the same event type and phase.
    #[error(
        "Event type {event_type} already has a {phase} event handler {existing}; cannot also register {rejected}."
    )]
    DuplicateHandler {
        phase: Phase,
        event_type: &'static str,
        existing: &'static str,
        rejected: &'static str,
    },
}
