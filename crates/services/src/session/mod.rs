//! Activity sessions: one running mini-game per learner and the glue that
//! turns its completion into persisted progress.

mod activity;
mod input;
mod orchestrator;
mod view;

pub use input::ActivityInput;
pub use orchestrator::SessionOrchestrator;
pub use view::{ActivityUpdate, LessonOutcome, PuzzleView};
