#![forbid(unsafe_code)]
//! Pure domain layer of the lesson engine: vocabulary items, the per-topic
//! activity ladder and the mini-game engines. Nothing here performs I/O.

pub mod error;
pub mod games;
pub mod model;
pub mod settings;
pub mod time;

pub use error::Error;
pub use settings::{LessonSettings, SettingsError};
pub use time::Clock;
