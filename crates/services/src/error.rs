//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::games::GameError;
use lesson_core::model::{ActivityKind, TopicId, TransitionError};
use storage::repository::StorageError;

/// Errors emitted by `WordBank`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum WordBankError {
    #[error("content unavailable: `{path}` does not exist")]
    MissingContent { path: String },
    #[error("malformed content at `{path}`: {reason}")]
    MalformedContent { path: String, reason: String },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressGraph`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),
    #[error("topic `{topic}` is not part of this chapter")]
    UnknownTopic { topic: TopicId },
    #[error("stored progress at `{path}` is corrupt: {reason}")]
    CorruptProgress { path: String, reason: String },
    #[error("progress could not be persisted: {0}")]
    PersistenceFailure(#[from] StorageError),
}

/// Errors emitted by `SessionOrchestrator`.
///
/// None of these is fatal: restarting the activity recovers from all of them.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("invalid transition: {0}")]
    InvalidTransition(#[from] TransitionError),
    #[error("content unavailable: {0}")]
    InsufficientData(String),
    #[error("topic `{topic}` is not part of this chapter")]
    UnknownTopic { topic: TopicId },
    #[error("stored progress at `{path}` is corrupt: {reason}")]
    CorruptProgress { path: String, reason: String },
    #[error("persistence failure: {0}")]
    PersistenceFailure(#[from] StorageError),
    #[error("no activity is running")]
    NoActiveActivity,
    #[error("input `{input}` does not apply to the running `{active}` activity")]
    InputMismatch {
        active: ActivityKind,
        input: &'static str,
    },
}

impl From<GameError> for SessionError {
    fn from(err: GameError) -> Self {
        Self::InsufficientData(err.to_string())
    }
}

impl From<WordBankError> for SessionError {
    fn from(err: WordBankError) -> Self {
        match err {
            WordBankError::Storage(e) => Self::PersistenceFailure(e),
            other => Self::InsufficientData(other.to_string()),
        }
    }
}

impl From<ProgressError> for SessionError {
    fn from(err: ProgressError) -> Self {
        match err {
            ProgressError::InvalidTransition(e) => Self::InvalidTransition(e),
            ProgressError::UnknownTopic { topic } => Self::UnknownTopic { topic },
            ProgressError::CorruptProgress { path, reason } => {
                Self::CorruptProgress { path, reason }
            }
            ProgressError::PersistenceFailure(e) => Self::PersistenceFailure(e),
        }
    }
}
