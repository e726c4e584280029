use std::sync::{Mutex, PoisonError};

use tracing::info;

/// Audio rendering of words and prompts.
///
/// Fire-and-forget: implementations must return promptly, and nothing in the
/// lesson flow waits for or depends on the audio.
pub trait SpeechOutput: Send + Sync {
    fn speak(&self, text: &str, locale: &str);
}

/// Discards everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSpeech;

impl SpeechOutput for SilentSpeech {
    fn speak(&self, _text: &str, _locale: &str) {}
}

/// Emits each utterance as a tracing event. Used by the command-line player.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggedSpeech;

impl SpeechOutput for LoggedSpeech {
    fn speak(&self, text: &str, locale: &str) {
        info!(target: "speech", locale, text, "speak");
    }
}

/// Keeps utterances in memory so callers can inspect them.
#[derive(Debug, Default)]
pub struct RecordedSpeech {
    spoken: Mutex<Vec<String>>,
}

impl RecordedSpeech {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts spoken so far, oldest first.
    #[must_use]
    pub fn spoken(&self) -> Vec<String> {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SpeechOutput for RecordedSpeech {
    fn speak(&self, text: &str, _locale: &str) {
        self.spoken
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(text.to_owned());
    }
}
