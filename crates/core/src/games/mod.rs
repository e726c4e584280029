//! Self-contained activity engines.
//!
//! Every engine is a plain state machine: inputs go in, a result value comes
//! out, and no engine touches storage, speech or the system clock. Shuffling
//! goes through a caller-provided RNG so runs can be replayed from a seed.

use rand::Rng;
use rand::seq::SliceRandom;
use thiserror::Error;

pub mod flashcard;
pub mod matching;
pub mod quiz;
pub mod scramble;
pub mod speak;

pub use flashcard::{FlashcardDeck, FlashcardStep};
pub use matching::{Lang, MatchPuzzleItem, PairMatchingEngine, SelectionResult};
pub use quiz::{QuizAnswer, QuizEngine, QuizQuestion, QuizRound, QuizStatus, QuizStep};
pub use scramble::{Letter, ScrambleCheck, ScrambleProgress, ScrambleRound, ScrambleState};
pub use speak::{SpeakAttempt, SpeakRound};

/// Errors raised while building an activity.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum GameError {
    #[error("not enough vocabulary: need {needed}, have {available}")]
    InsufficientData { needed: usize, available: usize },
}

/// Fisher–Yates shuffle into a new vector.
pub(crate) fn shuffled<T, R: Rng + ?Sized>(mut items: Vec<T>, rng: &mut R) -> Vec<T> {
    items.shuffle(rng);
    items
}

/// Converts a count to `u32`, saturating on absurd sizes.
pub(crate) fn count_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
