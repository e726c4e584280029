use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::SliceRandom;

use lesson_core::LessonSettings;
use lesson_core::games::{
    FlashcardDeck, FlashcardStep, Lang, PairMatchingEngine, QuizEngine, QuizRound, QuizStep,
    ScrambleProgress, ScrambleRound, SelectionResult, SpeakAttempt, SpeakRound,
};
use lesson_core::model::{ActivityKind, ActivityOutcome, WordItem};

use super::input::ActivityInput;
use super::view::PuzzleView;
use crate::error::SessionError;
use crate::speech::SpeechOutput;

/// Where a single input left the activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Step {
    Continue,
    Finished(ActivityOutcome),
    Failed { score: u32, total: u32 },
}

pub(crate) struct Voice<'a> {
    pub(crate) output: &'a dyn SpeechOutput,
    pub(crate) locale: &'a str,
}

impl Voice<'_> {
    fn say(&self, text: &str) {
        self.output.speak(text, self.locale);
    }
}

/// Engine of the running activity.
#[derive(Debug, Clone)]
pub(crate) enum ActiveActivity {
    Flashcard(FlashcardDeck),
    Matching(PairMatchingEngine),
    Quiz(QuizRound),
    Scrambled {
        round: ScrambleRound,
        wrong: bool,
    },
    SpeakIt {
        round: SpeakRound,
        heard: Option<String>,
    },
}

impl ActiveActivity {
    /// Build the engine for `kind` from the topic's words.
    pub(crate) fn build<R: Rng + ?Sized>(
        kind: ActivityKind,
        mut words: Vec<WordItem>,
        settings: &LessonSettings,
        rng: &mut R,
    ) -> Result<Self, SessionError> {
        let activity = match kind {
            ActivityKind::Flashcard => Self::Flashcard(FlashcardDeck::new(words)?),
            ActivityKind::Matching => {
                words.shuffle(rng);
                words.truncate(settings.matching_pairs());
                Self::Matching(PairMatchingEngine::build(
                    &words,
                    settings.wrong_flash_ms(),
                    rng,
                )?)
            }
            ActivityKind::Quiz => {
                words.shuffle(rng);
                words.truncate(settings.quiz_word_limit());
                let questions = QuizEngine::generate(&words, rng)?;
                Self::Quiz(QuizRound::new(questions, settings.quiz_lives()))
            }
            ActivityKind::Scrambled => Self::Scrambled {
                round: ScrambleRound::build(&words, rng)?,
                wrong: false,
            },
            ActivityKind::SpeakIt => Self::SpeakIt {
                round: SpeakRound::new(words)?,
                heard: None,
            },
        };
        Ok(activity)
    }

    pub(crate) fn kind(&self) -> ActivityKind {
        match self {
            Self::Flashcard(_) => ActivityKind::Flashcard,
            Self::Matching(_) => ActivityKind::Matching,
            Self::Quiz(_) => ActivityKind::Quiz,
            Self::Scrambled { .. } => ActivityKind::Scrambled,
            Self::SpeakIt { .. } => ActivityKind::SpeakIt,
        }
    }

    /// Speak whatever the freshly started activity shows first.
    pub(crate) fn announce(&self, voice: &Voice<'_>) {
        match self {
            Self::Flashcard(deck) => {
                if let Some(card) = deck.current() {
                    voice.say(&card.headword);
                }
            }
            Self::Quiz(round) => {
                if let Some(question) = round.current() {
                    voice.say(&question.prompt);
                }
            }
            Self::Matching(_) | Self::Scrambled { .. } | Self::SpeakIt { .. } => {}
        }
    }

    /// Clear an expired wrong-pair flash. Returns true if the view changed.
    pub(crate) fn tick(&mut self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Matching(engine) => engine.tick(now),
            _ => false,
        }
    }

    /// Feed one input to the engine.
    pub(crate) fn apply(
        &mut self,
        input: ActivityInput,
        now: DateTime<Utc>,
        voice: &Voice<'_>,
    ) -> Result<Step, SessionError> {
        let active = self.kind();
        let mismatch = |input: &ActivityInput| SessionError::InputMismatch {
            active,
            input: input.name(),
        };
        if input.kind() != active {
            return Err(mismatch(&input));
        }

        let step = match (self, input) {
            (Self::Flashcard(deck), ActivityInput::FlipCard) => {
                deck.flip();
                Step::Continue
            }
            (Self::Flashcard(deck), ActivityInput::NextCard) => match deck.next() {
                FlashcardStep::Finished(outcome) => Step::Finished(outcome),
                FlashcardStep::Moved { .. } => {
                    if let Some(card) = deck.current() {
                        voice.say(&card.headword);
                    }
                    Step::Continue
                }
                FlashcardStep::Stayed => Step::Continue,
            },
            (Self::Flashcard(deck), ActivityInput::PreviousCard) => {
                if let FlashcardStep::Moved { .. } = deck.previous() {
                    if let Some(card) = deck.current() {
                        voice.say(&card.headword);
                    }
                }
                Step::Continue
            }
            (Self::Matching(engine), ActivityInput::Select { item_id }) => {
                match engine.select(&item_id, now) {
                    SelectionResult::Completed(outcome) => Step::Finished(outcome),
                    SelectionResult::Selected | SelectionResult::Replaced => {
                        if let Some(item) = engine.selected() {
                            if item.lang == Lang::Source {
                                voice.say(&item.text);
                            }
                        }
                        Step::Continue
                    }
                    SelectionResult::Rejected
                    | SelectionResult::Deselected
                    | SelectionResult::Matched { .. }
                    | SelectionResult::Mismatched { .. } => Step::Continue,
                }
            }
            (Self::Quiz(round), ActivityInput::Answer { choice }) => match round.answer(&choice) {
                QuizStep::Passed(outcome) => Step::Finished(outcome),
                QuizStep::Failed { score, total } => Step::Failed { score, total },
                QuizStep::Correct | QuizStep::Wrong { .. } => {
                    if let Some(question) = round.current() {
                        voice.say(&question.prompt);
                    }
                    Step::Continue
                }
                QuizStep::Ignored => Step::Continue,
            },
            (Self::Scrambled { round, wrong }, ActivityInput::PlaceLetter { letter_id }) => {
                *wrong = false;
                round.place_letter(letter_id);
                Step::Continue
            }
            (Self::Scrambled { round, wrong }, ActivityInput::RemoveLetter { slot }) => {
                *wrong = false;
                round.remove_letter(slot);
                Step::Continue
            }
            (Self::Scrambled { round, wrong }, ActivityInput::CheckWord) => match round.check() {
                ScrambleProgress::Wrong => {
                    *wrong = true;
                    Step::Continue
                }
                ScrambleProgress::Solved { word } => {
                    *wrong = false;
                    voice.say(&word);
                    Step::Continue
                }
                ScrambleProgress::Completed { word, outcome } => {
                    voice.say(&word);
                    Step::Finished(outcome)
                }
            },
            (Self::SpeakIt { round, heard }, ActivityInput::Transcript { text }) => {
                *heard = match round.submit_transcript(&text) {
                    SpeakAttempt::Retry { heard } => Some(heard),
                    _ => None,
                };
                Step::Continue
            }
            (Self::SpeakIt { round, heard }, ActivityInput::NextWord) => {
                let attempt = round.next();
                if !matches!(attempt, SpeakAttempt::NotYet) {
                    *heard = None;
                }
                speak_step(attempt)
            }
            (Self::SpeakIt { round, heard }, ActivityInput::SkipWord) => {
                *heard = None;
                speak_step(round.skip())
            }
            (_, input) => return Err(mismatch(&input)),
        };
        Ok(step)
    }

    pub(crate) fn view(&self) -> PuzzleView {
        let finished = PuzzleView::Finished { kind: self.kind() };
        match self {
            Self::Flashcard(deck) => match deck.current() {
                Some(word) => PuzzleView::Flashcard {
                    position: deck.position(),
                    len: deck.len(),
                    word: word.clone(),
                    flipped: deck.is_flipped(),
                },
                None => finished,
            },
            Self::Matching(engine) => {
                if engine.is_complete() {
                    return finished;
                }
                PuzzleView::Matching {
                    source: engine.source_column().to_vec(),
                    target: engine.target_column().to_vec(),
                    selected: engine.selected().map(|item| item.id.clone()),
                    wrong_pair: engine
                        .wrong_pair()
                        .map(|(a, b)| (a.to_owned(), b.to_owned())),
                    score: engine.score(),
                    total: engine.total(),
                }
            }
            Self::Quiz(round) => match round.current() {
                Some(question) => PuzzleView::Quiz {
                    position: round.position(),
                    len: round.len(),
                    question: question.clone(),
                    score: round.score(),
                    lives: round.lives(),
                },
                None => finished,
            },
            Self::Scrambled { round, wrong } => match round.current() {
                Some(puzzle) => PuzzleView::Scramble {
                    position: round.position(),
                    len: round.len(),
                    puzzle: puzzle.clone(),
                    wrong: *wrong,
                },
                None => finished,
            },
            Self::SpeakIt { round, heard } => match round.current() {
                Some(word) => PuzzleView::SpeakIt {
                    position: round.position(),
                    len: round.len(),
                    word: word.clone(),
                    correct: round.is_current_correct(),
                    heard: heard.clone(),
                },
                None => finished,
            },
        }
    }
}

fn speak_step(attempt: SpeakAttempt) -> Step {
    match attempt {
        SpeakAttempt::Finished(outcome) => Step::Finished(outcome),
        _ => Step::Continue,
    }
}
