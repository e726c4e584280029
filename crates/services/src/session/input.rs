use lesson_core::model::ActivityKind;

/// Everything a learner can do inside a running activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActivityInput {
    FlipCard,
    NextCard,
    PreviousCard,
    /// Click on a matching item by its id.
    Select { item_id: String },
    /// Pick one of the quiz options.
    Answer { choice: String },
    PlaceLetter { letter_id: usize },
    RemoveLetter { slot: usize },
    CheckWord,
    /// Recognized speech for the current speak-it word.
    Transcript { text: String },
    NextWord,
    SkipWord,
}

impl ActivityInput {
    /// Activity this input belongs to.
    #[must_use]
    pub fn kind(&self) -> ActivityKind {
        match self {
            Self::FlipCard | Self::NextCard | Self::PreviousCard => ActivityKind::Flashcard,
            Self::Select { .. } => ActivityKind::Matching,
            Self::Answer { .. } => ActivityKind::Quiz,
            Self::PlaceLetter { .. } | Self::RemoveLetter { .. } | Self::CheckWord => {
                ActivityKind::Scrambled
            }
            Self::Transcript { .. } | Self::NextWord | Self::SkipWord => ActivityKind::SpeakIt,
        }
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::FlipCard => "flip_card",
            Self::NextCard => "next_card",
            Self::PreviousCard => "previous_card",
            Self::Select { .. } => "select",
            Self::Answer { .. } => "answer",
            Self::PlaceLetter { .. } => "place_letter",
            Self::RemoveLetter { .. } => "remove_letter",
            Self::CheckWord => "check_word",
            Self::Transcript { .. } => "transcript",
            Self::NextWord => "next_word",
            Self::SkipWord => "skip_word",
        }
    }
}
