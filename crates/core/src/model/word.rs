use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::WordId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum WordError {
    #[error("vocabulary record {id} is missing `{field}`")]
    MissingField { id: WordId, field: &'static str },
}

//
// ─── RAW RECORD ────────────────────────────────────────────────────────────────
//

/// Vocabulary record as it is stored in the `vocabularies` collection.
///
/// Every field is optional here; `WordItem::normalize` decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RawWordRecord {
    pub word: Option<String>,
    pub indonesian: Option<String>,
    pub translation: Option<String>,
    pub phonetic: Option<String>,
    pub example: Option<String>,
    pub example_translate: Option<String>,
    pub image_url: Option<String>,
}

//
// ─── WORD ITEM ─────────────────────────────────────────────────────────────────
//

/// Canonical vocabulary item used by every activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WordItem {
    pub id: WordId,
    pub headword: String,
    pub translation: String,
    pub phonetic: Option<String>,
    pub example_sentence: Option<String>,
    pub example_translation: Option<String>,
    pub image_ref: Option<String>,
}

impl WordItem {
    /// Normalize a raw record into a `WordItem`.
    ///
    /// Strings are trimmed and blank optionals collapse to `None`. The
    /// translation is taken from `indonesian`, falling back to `translation`.
    ///
    /// # Errors
    ///
    /// Returns `WordError::MissingField` if the headword or translation is blank.
    pub fn normalize(id: WordId, raw: RawWordRecord) -> Result<Self, WordError> {
        let Some(headword) = non_blank(raw.word) else {
            return Err(WordError::MissingField {
                id,
                field: "word",
            });
        };
        let Some(translation) = non_blank(raw.indonesian).or_else(|| non_blank(raw.translation))
        else {
            return Err(WordError::MissingField {
                id,
                field: "translation",
            });
        };

        Ok(Self {
            id,
            headword,
            translation,
            phonetic: non_blank(raw.phonetic),
            example_sentence: non_blank(raw.example),
            example_translation: non_blank(raw.example_translate),
            image_ref: non_blank(raw.image_url),
        })
    }

    /// Shorthand for tests and fixtures that only care about the pair.
    ///
    /// # Errors
    ///
    /// Returns `WordError::MissingField` if either side is blank.
    pub fn pair(
        id: WordId,
        headword: impl Into<String>,
        translation: impl Into<String>,
    ) -> Result<Self, WordError> {
        Self::normalize(
            id,
            RawWordRecord {
                word: Some(headword.into()),
                translation: Some(translation.into()),
                ..RawWordRecord::default()
            },
        )
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
