mod activity;
mod ids;
mod progress;
mod topic;
mod word;

pub use ids::{ChapterId, ParseIdError, TopicId, UserId, WordId};

pub use activity::{ActivityKind, ActivityOutcome, ActivityState};
pub use progress::{
    ActivityRecord, Completion, ProgressDocument, ProgressDocumentError, TopicProgress,
    TopicStatus, TransitionError,
};
pub use topic::{Topic, TopicCatalog};
pub use word::{RawWordRecord, WordError, WordItem};
