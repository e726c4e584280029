use lesson_core::games::{MatchPuzzleItem, QuizQuestion, ScrambleState};
use lesson_core::model::{ActivityKind, TopicProgress, WordItem};

/// What the host should render for the running activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PuzzleView {
    Flashcard {
        position: usize,
        len: usize,
        word: WordItem,
        flipped: bool,
    },
    Matching {
        source: Vec<MatchPuzzleItem>,
        target: Vec<MatchPuzzleItem>,
        selected: Option<String>,
        /// Item ids flagged wrong until the flash expires.
        wrong_pair: Option<(String, String)>,
        score: u32,
        total: u32,
    },
    Quiz {
        position: usize,
        len: usize,
        question: QuizQuestion,
        score: u32,
        lives: u32,
    },
    Scramble {
        position: usize,
        len: usize,
        puzzle: ScrambleState,
        /// Set right after a failed check, cleared by the next edit.
        wrong: bool,
    },
    SpeakIt {
        position: usize,
        len: usize,
        word: WordItem,
        correct: bool,
        /// Last transcript that did not match.
        heard: Option<String>,
    },
    /// The activity ended; see the accompanying outcome.
    Finished { kind: ActivityKind },
}

/// How an activity ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LessonOutcome {
    /// Completion was recorded (or had already been recorded for a replay).
    Completed {
        kind: ActivityKind,
        score: u32,
        total: u32,
        progress: TopicProgress,
        /// Activity unlocked in this topic by the completion.
        unlocked: Option<ActivityKind>,
        topic_completed: bool,
        /// True when the activity had been completed before; nothing changed.
        replay: bool,
    },
    /// The run ended early; progress is untouched.
    Failed {
        kind: ActivityKind,
        score: u32,
        total: u32,
    },
}

/// Result of one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityUpdate {
    pub view: PuzzleView,
    pub outcome: Option<LessonOutcome>,
}
