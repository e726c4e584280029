use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Error type for parsing an ID from a string.
///
/// IDs end up as segments of document paths, so they must be non-empty and
/// must not contain a path separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    kind: &'static str,
    raw: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "failed to parse {} from {:?}", self.kind, self.raw)
    }
}

impl std::error::Error for ParseIdError {}

fn validate_segment(kind: &'static str, raw: &str) -> Result<String, ParseIdError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.contains('/') {
        return Err(ParseIdError {
            kind,
            raw: raw.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new ID after validating it as a path segment.
            ///
            /// # Errors
            ///
            /// Returns `ParseIdError` if the value is empty or contains `/`.
            pub fn new(raw: impl AsRef<str>) -> Result<Self, ParseIdError> {
                validate_segment(stringify!($name), raw.as_ref()).map(Self)
            }

            /// Returns the underlying string value
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_id! {
    /// Identifier of a learner account.
    UserId
}

string_id! {
    /// Identifier of a chapter (a group of topics).
    ChapterId
}

string_id! {
    /// Identifier of a topic (a sub-chapter with its own activity ladder).
    TopicId
}

string_id! {
    /// Identifier of a vocabulary record.
    WordId
}

// ─── Tests ─────────────────────────────────────────────────────────────────────
