#![forbid(unsafe_code)]
//! Lesson services: content loading, progress gating and activity sessions.

mod documents;
pub mod error;
pub mod progress_graph;
pub mod session;
pub mod speech;
pub mod word_bank;

pub use lesson_core::{Clock, LessonSettings};

pub use error::{ProgressError, SessionError, WordBankError};
pub use progress_graph::ProgressGraph;
pub use session::{ActivityInput, ActivityUpdate, LessonOutcome, PuzzleView, SessionOrchestrator};
pub use speech::{LoggedSpeech, RecordedSpeech, SilentSpeech, SpeechOutput};
pub use word_bank::{VOCABULARY_COLLECTION, WordBank};
