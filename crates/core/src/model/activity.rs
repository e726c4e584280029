use serde::{Deserialize, Serialize};
use std::fmt;

// --- Activity Kind ---

/// The practice activities of a topic, in unlock order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActivityKind {
    Flashcard,
    Matching,
    Quiz,
    Scrambled,
    SpeakIt,
}

impl ActivityKind {
    /// Key used in persisted progress documents.
    #[must_use]
    pub fn to_key(self) -> &'static str {
        match self {
            ActivityKind::Flashcard => "flashcard",
            ActivityKind::Matching => "matching",
            ActivityKind::Quiz => "quiz",
            ActivityKind::Scrambled => "scramble",
            ActivityKind::SpeakIt => "sayit",
        }
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "flashcard" => Some(ActivityKind::Flashcard),
            "matching" => Some(ActivityKind::Matching),
            "quiz" => Some(ActivityKind::Quiz),
            "scramble" => Some(ActivityKind::Scrambled),
            "sayit" => Some(ActivityKind::SpeakIt),
            _ => None,
        }
    }

    /// All activities in their fixed order.
    #[must_use]
    pub fn all() -> &'static [ActivityKind] {
        &[
            ActivityKind::Flashcard,
            ActivityKind::Matching,
            ActivityKind::Quiz,
            ActivityKind::Scrambled,
            ActivityKind::SpeakIt,
        ]
    }

    /// Position in the fixed order.
    #[must_use]
    pub fn index(self) -> usize {
        match self {
            ActivityKind::Flashcard => 0,
            ActivityKind::Matching => 1,
            ActivityKind::Quiz => 2,
            ActivityKind::Scrambled => 3,
            ActivityKind::SpeakIt => 4,
        }
    }

    /// The activity unlocked by completing this one, `None` for the last.
    #[must_use]
    pub fn successor(self) -> Option<Self> {
        Self::all().get(self.index() + 1).copied()
    }

    #[must_use]
    pub fn predecessor(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::all()[i])
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.successor().is_none()
    }
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_key())
    }
}

impl Serialize for ActivityKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.to_key())
    }
}

impl<'de> Deserialize<'de> for ActivityKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let key = String::deserialize(deserializer)?;
        ActivityKind::from_key(&key)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown activity: {key}")))
    }
}

// --- Activity State ---

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityState {
    pub unlocked: bool,
    pub completed: bool,
}

impl ActivityState {
    pub const LOCKED: Self = Self {
        unlocked: false,
        completed: false,
    };

    pub const OPEN: Self = Self {
        unlocked: true,
        completed: false,
    };
}

// --- Activity Outcome ---

/// Score reported by a finished activity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityOutcome {
    pub score: u32,
    pub total: u32,
}

impl ActivityOutcome {
    #[must_use]
    pub fn new(score: u32, total: u32) -> Self {
        Self { score, total }
    }

    /// Full score over `total` items.
    #[must_use]
    pub fn full(total: u32) -> Self {
        Self {
            score: total,
            total,
        }
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.score <= self.total
    }
}
