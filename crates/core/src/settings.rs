use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("quiz lives must be > 0")]
    InvalidQuizLives,

    #[error("matching pairs must be > 0")]
    InvalidMatchingPairs,

    #[error("quiz word limit must be at least 4")]
    InvalidQuizWordLimit,

    #[error("speech locale cannot be empty")]
    EmptySpeechLocale,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Tunables for a lesson session.
///
/// Defaults follow the product: 3 quiz lives, 5 matching pairs, up to 10
/// quiz words, an 800 ms wrong-pair flash and `en-US` speech.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonSettings {
    quiz_lives: u32,
    matching_pairs: usize,
    quiz_word_limit: usize,
    wrong_flash_ms: u32,
    speech_locale: String,
    shuffle_seed: Option<u64>,
}

impl Default for LessonSettings {
    fn default() -> Self {
        Self {
            quiz_lives: 3,
            matching_pairs: 5,
            quiz_word_limit: 10,
            wrong_flash_ms: 800,
            speech_locale: "en-US".to_owned(),
            shuffle_seed: None,
        }
    }
}

impl LessonSettings {
    /// Creates custom settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if a count is zero, the quiz limit cannot
    /// hold four options, or the locale is blank.
    pub fn new(
        quiz_lives: u32,
        matching_pairs: usize,
        quiz_word_limit: usize,
        wrong_flash_ms: u32,
        speech_locale: impl Into<String>,
    ) -> Result<Self, SettingsError> {
        if quiz_lives == 0 {
            return Err(SettingsError::InvalidQuizLives);
        }
        if matching_pairs == 0 {
            return Err(SettingsError::InvalidMatchingPairs);
        }
        if quiz_word_limit < 4 {
            return Err(SettingsError::InvalidQuizWordLimit);
        }
        let speech_locale = speech_locale.into().trim().to_owned();
        if speech_locale.is_empty() {
            return Err(SettingsError::EmptySpeechLocale);
        }

        Ok(Self {
            quiz_lives,
            matching_pairs,
            quiz_word_limit,
            wrong_flash_ms,
            speech_locale,
            shuffle_seed: None,
        })
    }

    /// Fix the shuffle seed so every session is reproducible.
    #[must_use]
    pub fn with_shuffle_seed(mut self, seed: Option<u64>) -> Self {
        self.shuffle_seed = seed;
        self
    }

    #[must_use]
    pub fn quiz_lives(&self) -> u32 {
        self.quiz_lives
    }

    #[must_use]
    pub fn matching_pairs(&self) -> usize {
        self.matching_pairs
    }

    #[must_use]
    pub fn quiz_word_limit(&self) -> usize {
        self.quiz_word_limit
    }

    #[must_use]
    pub fn wrong_flash_ms(&self) -> u32 {
        self.wrong_flash_ms
    }

    #[must_use]
    pub fn speech_locale(&self) -> &str {
        &self.speech_locale
    }

    #[must_use]
    pub fn shuffle_seed(&self) -> Option<u64> {
        self.shuffle_seed
    }
}
