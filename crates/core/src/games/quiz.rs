use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameError, count_u32, shuffled};
use crate::model::{ActivityOutcome, WordId, WordItem};

const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizQuestion {
    pub word_id: WordId,
    pub prompt: String,
    pub correct_answer: String,
    /// Four distinct strings, one of which is `correct_answer`.
    pub options: Vec<String>,
    pub image_ref: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuizAnswer {
    pub correct: bool,
}

/// Question generation and adjudication. Holds no state.
pub struct QuizEngine;

impl QuizEngine {
    /// One question per distinct word: the headword is the prompt, its
    /// translation the answer, plus three distractors taken from the other
    /// words of the batch.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InsufficientData` if the batch has fewer than four
    /// words with distinct translations.
    pub fn generate<R: Rng + ?Sized>(
        words: &[WordItem],
        rng: &mut R,
    ) -> Result<Vec<QuizQuestion>, GameError> {
        let mut seen = HashSet::new();
        let words: Vec<&WordItem> = words.iter().filter(|w| seen.insert(w.id.clone())).collect();

        let mut translations: Vec<&str> = Vec::new();
        for w in &words {
            if !translations.contains(&w.translation.as_str()) {
                translations.push(&w.translation);
            }
        }
        if words.len() < OPTION_COUNT || translations.len() < OPTION_COUNT {
            return Err(GameError::InsufficientData {
                needed: OPTION_COUNT,
                available: translations.len().min(words.len()),
            });
        }

        let questions = words
            .iter()
            .map(|word| {
                let distractors: Vec<String> = translations
                    .iter()
                    .filter(|t| **t != word.translation)
                    .map(|t| (*t).to_owned())
                    .collect();
                let mut options: Vec<String> = shuffled(distractors, rng)
                    .into_iter()
                    .take(OPTION_COUNT - 1)
                    .collect();
                options.push(word.translation.clone());
                QuizQuestion {
                    word_id: word.id.clone(),
                    prompt: word.headword.clone(),
                    correct_answer: word.translation.clone(),
                    options: shuffled(options, rng),
                    image_ref: word.image_ref.clone(),
                }
            })
            .collect();
        Ok(questions)
    }

    /// Pure comparison of `choice` against the question's answer.
    #[must_use]
    pub fn answer(question: &QuizQuestion, choice: &str) -> QuizAnswer {
        QuizAnswer {
            correct: choice == question.correct_answer,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStatus {
    InProgress,
    Passed,
    Failed,
}

/// What answering did to the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizStep {
    /// Right answer, next question is current.
    Correct,
    /// Wrong answer, one life spent, next question is current.
    Wrong { lives: u32 },
    /// Last question answered with lives to spare.
    Passed(ActivityOutcome),
    /// Lives ran out.
    Failed { score: u32, total: u32 },
    /// The run is already over.
    Ignored,
}

/// A quiz run with a score and a finite number of lives.
///
/// A wrong answer costs a life and still moves on to the next question.
#[derive(Debug, Clone)]
pub struct QuizRound {
    questions: Vec<QuizQuestion>,
    current: usize,
    score: u32,
    lives: u32,
    status: QuizStatus,
}

impl QuizRound {
    #[must_use]
    pub fn new(questions: Vec<QuizQuestion>, lives: u32) -> Self {
        let status = if questions.is_empty() || lives == 0 {
            QuizStatus::Failed
        } else {
            QuizStatus::InProgress
        };
        Self {
            questions,
            current: 0,
            score: 0,
            lives,
            status,
        }
    }

    #[must_use]
    pub fn current(&self) -> Option<&QuizQuestion> {
        match self.status {
            QuizStatus::InProgress => self.questions.get(self.current),
            QuizStatus::Passed | QuizStatus::Failed => None,
        }
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn lives(&self) -> u32 {
        self.lives
    }

    #[must_use]
    pub fn status(&self) -> QuizStatus {
        self.status
    }

    fn total(&self) -> u32 {
        count_u32(self.questions.len())
    }

    /// Answer the current question with `choice`.
    pub fn answer(&mut self, choice: &str) -> QuizStep {
        let Some(question) = self.current() else {
            return QuizStep::Ignored;
        };
        let verdict = QuizEngine::answer(question, choice);

        if verdict.correct {
            self.score = self.score.saturating_add(1);
        } else {
            self.lives = self.lives.saturating_sub(1);
            if self.lives == 0 {
                self.status = QuizStatus::Failed;
                return QuizStep::Failed {
                    score: self.score,
                    total: self.total(),
                };
            }
        }

        self.current += 1;
        if self.current >= self.questions.len() {
            self.status = QuizStatus::Passed;
            return QuizStep::Passed(ActivityOutcome::new(self.score, self.total()));
        }

        if verdict.correct {
            QuizStep::Correct
        } else {
            QuizStep::Wrong { lives: self.lives }
        }
    }
}
