use super::{GameError, count_u32};
use crate::model::{ActivityOutcome, WordItem};

/// What a navigation step did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlashcardStep {
    Moved { index: usize },
    /// Already at the first card.
    Stayed,
    /// Moved past the last card.
    Finished(ActivityOutcome),
}

/// Ordered walk through a topic's words, one card at a time.
#[derive(Debug, Clone)]
pub struct FlashcardDeck {
    cards: Vec<WordItem>,
    current: usize,
    flipped: bool,
    finished: bool,
}

impl FlashcardDeck {
    /// # Errors
    ///
    /// Returns `GameError::InsufficientData` if `words` is empty.
    pub fn new(words: Vec<WordItem>) -> Result<Self, GameError> {
        if words.is_empty() {
            return Err(GameError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        Ok(Self {
            cards: words,
            current: 0,
            flipped: false,
            finished: false,
        })
    }

    #[must_use]
    pub fn current(&self) -> Option<&WordItem> {
        if self.finished {
            return None;
        }
        self.cards.get(self.current)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    #[must_use]
    pub fn is_flipped(&self) -> bool {
        self.flipped
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Toggle between the headword side and the translation side.
    pub fn flip(&mut self) -> bool {
        if !self.finished {
            self.flipped = !self.flipped;
        }
        self.flipped
    }

    pub fn next(&mut self) -> FlashcardStep {
        if self.finished {
            return FlashcardStep::Stayed;
        }
        self.flipped = false;
        if self.current + 1 < self.cards.len() {
            self.current += 1;
            FlashcardStep::Moved {
                index: self.current,
            }
        } else {
            self.finished = true;
            FlashcardStep::Finished(ActivityOutcome::full(count_u32(self.cards.len())))
        }
    }

    pub fn previous(&mut self) -> FlashcardStep {
        if self.finished || self.current == 0 {
            return FlashcardStep::Stayed;
        }
        self.flipped = false;
        self.current -= 1;
        FlashcardStep::Moved {
            index: self.current,
        }
    }
}
