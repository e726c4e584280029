use super::{GameError, count_u32};
use crate::model::{ActivityOutcome, WordItem};

/// Result of a speaking attempt or a navigation step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeakAttempt {
    Correct,
    /// Transcript did not contain the word; try again or skip.
    Retry { heard: String },
    /// `next` was called before a correct attempt.
    NotYet,
    Moved { index: usize },
    Finished(ActivityOutcome),
    /// The round is already over.
    Ignored,
}

/// Speak-it activity: the learner says each headword aloud and the host
/// feeds the recognized transcript back in.
#[derive(Debug, Clone)]
pub struct SpeakRound {
    words: Vec<WordItem>,
    current: usize,
    current_correct: bool,
    correct: u32,
    finished: bool,
}

impl SpeakRound {
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
            words,
            current: 0,
            current_correct: false,
            correct: 0,
            finished: false,
        })
    }

    #[must_use]
    pub fn current(&self) -> Option<&WordItem> {
        if self.finished {
            return None;
        }
        self.words.get(self.current)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    #[must_use]
    pub fn is_current_correct(&self) -> bool {
        self.current_correct
    }

    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    /// Judge a recognized transcript against the current headword.
    pub fn submit_transcript(&mut self, transcript: &str) -> SpeakAttempt {
        let Some(word) = self.current() else {
            return SpeakAttempt::Ignored;
        };
        if self.current_correct {
            return SpeakAttempt::Correct;
        }
        let heard = transcript.trim().to_lowercase();
        if heard.contains(&word.headword.to_lowercase()) {
            self.current_correct = true;
            self.correct = self.correct.saturating_add(1);
            SpeakAttempt::Correct
        } else {
            SpeakAttempt::Retry { heard }
        }
    }

    /// Advance after a correct attempt.
    pub fn next(&mut self) -> SpeakAttempt {
        if self.finished {
            return SpeakAttempt::Ignored;
        }
        if !self.current_correct {
            return SpeakAttempt::NotYet;
        }
        self.advance()
    }

    /// Advance without credit for the current word.
    pub fn skip(&mut self) -> SpeakAttempt {
        if self.finished {
            return SpeakAttempt::Ignored;
        }
        self.advance()
    }

    fn advance(&mut self) -> SpeakAttempt {
        self.current_correct = false;
        if self.current + 1 < self.words.len() {
            self.current += 1;
            SpeakAttempt::Moved {
                index: self.current,
            }
        } else {
            self.finished = true;
            SpeakAttempt::Finished(ActivityOutcome::new(
                self.correct,
                count_u32(self.words.len()),
            ))
        }
    }
}
