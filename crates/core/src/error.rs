use thiserror::Error;

use crate::games::GameError;
use crate::model::{ParseIdError, ProgressDocumentError, TransitionError, WordError};
use crate::settings::SettingsError;

/// Any domain error raised by this crate.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error(transparent)]
    ProgressDocument(#[from] ProgressDocumentError),
    #[error(transparent)]
    Game(#[from] GameError),
    #[error(transparent)]
    Word(#[from] WordError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Id(#[from] ParseIdError),
}
