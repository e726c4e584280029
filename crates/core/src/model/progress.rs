use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::activity::{ActivityKind, ActivityOutcome, ActivityState};

const ACTIVITY_COUNT: usize = 5;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A completion request that the state machine refuses.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransitionError {
    #[error("topic is locked")]
    TopicLocked,

    #[error("activity `{kind}` is not unlocked")]
    Locked { kind: ActivityKind },

    #[error("activity `{kind}` is already completed")]
    AlreadyCompleted { kind: ActivityKind },

    #[error("score {score} exceeds total {total}")]
    InvalidOutcome { score: u32, total: u32 },
}

/// A stored progress document that violates the gating invariants.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProgressDocumentError {
    #[error("activity `{kind}` is completed but not unlocked")]
    CompletedWhileLocked { kind: ActivityKind },

    #[error("activity `{kind}` is unlocked before its predecessor was completed")]
    SkippedPredecessor { kind: ActivityKind },

    #[error("topic status `{status:?}` disagrees with its activities")]
    StatusMismatch { status: TopicStatus },

    #[error("activity `{kind}` has a stored score above its total")]
    InvalidOutcome { kind: ActivityKind },
}

//
// ─── STATUS ────────────────────────────────────────────────────────────────────
//

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    Locked,
    Unlocked,
    Completed,
}

//
// ─── TOPIC PROGRESS ────────────────────────────────────────────────────────────
//

/// Per-learner, per-topic activity ladder.
///
/// Values are immutable from the outside: the only way to move forward is
/// [`TopicProgress::complete`], which returns a new value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicProgress {
    activities: [ActivityState; ACTIVITY_COUNT],
    outcomes: [Option<ActivityOutcome>; ACTIVITY_COUNT],
    status: TopicStatus,
    last_activity: Option<ActivityKind>,
    updated_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
}

/// Result of a successful completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completion {
    pub progress: TopicProgress,
    /// Activity that became unlocked inside this topic, if any.
    pub unlocked: Option<ActivityKind>,
    /// True when the terminal activity was completed.
    pub topic_completed: bool,
}

impl TopicProgress {
    /// State of a topic entered for the first time: only `Flashcard` is open.
    #[must_use]
    pub fn initial() -> Self {
        let mut activities = [ActivityState::LOCKED; ACTIVITY_COUNT];
        activities[ActivityKind::Flashcard.index()] = ActivityState::OPEN;
        Self {
            activities,
            outcomes: [None; ACTIVITY_COUNT],
            status: TopicStatus::Unlocked,
            last_activity: None,
            updated_at: None,
            completed_at: None,
        }
    }

    /// State of a topic whose predecessor topic is not finished yet.
    #[must_use]
    pub fn locked() -> Self {
        Self {
            activities: [ActivityState::LOCKED; ACTIVITY_COUNT],
            outcomes: [None; ACTIVITY_COUNT],
            status: TopicStatus::Locked,
            last_activity: None,
            updated_at: None,
            completed_at: None,
        }
    }

    #[must_use]
    pub fn activity(&self, kind: ActivityKind) -> ActivityState {
        self.activities[kind.index()]
    }

    #[must_use]
    pub fn outcome(&self, kind: ActivityKind) -> Option<ActivityOutcome> {
        self.outcomes[kind.index()]
    }

    #[must_use]
    pub fn is_unlocked(&self, kind: ActivityKind) -> bool {
        self.activity(kind).unlocked
    }

    #[must_use]
    pub fn is_completed(&self, kind: ActivityKind) -> bool {
        self.activity(kind).completed
    }

    #[must_use]
    pub fn status(&self) -> TopicStatus {
        self.status
    }

    #[must_use]
    pub fn last_activity(&self) -> Option<ActivityKind> {
        self.last_activity
    }

    #[must_use]
    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// First activity that is unlocked but not yet completed.
    #[must_use]
    pub fn next_available(&self) -> Option<ActivityKind> {
        ActivityKind::all()
            .iter()
            .copied()
            .find(|kind| self.is_unlocked(*kind) && !self.is_completed(*kind))
    }

    /// Apply the completion of `kind`.
    ///
    /// Marks `kind` completed and unlocks its successor; completing the
    /// terminal activity completes the topic instead. `self` is left
    /// untouched so callers can commit the returned value only after it was
    /// persisted.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the topic or activity is locked, the
    /// activity was already completed, or the outcome is inconsistent.
    pub fn complete(
        &self,
        kind: ActivityKind,
        outcome: ActivityOutcome,
        now: DateTime<Utc>,
    ) -> Result<Completion, TransitionError> {
        if self.status == TopicStatus::Locked {
            return Err(TransitionError::TopicLocked);
        }
        let state = self.activity(kind);
        if !state.unlocked {
            return Err(TransitionError::Locked { kind });
        }
        if state.completed {
            return Err(TransitionError::AlreadyCompleted { kind });
        }
        if !outcome.is_valid() {
            return Err(TransitionError::InvalidOutcome {
                score: outcome.score,
                total: outcome.total,
            });
        }

        let mut next = self.clone();
        next.activities[kind.index()].completed = true;
        next.outcomes[kind.index()] = Some(outcome);
        next.last_activity = Some(kind);
        next.updated_at = Some(now);

        let unlocked = kind.successor();
        match unlocked {
            Some(successor) => next.activities[successor.index()].unlocked = true,
            None => {
                next.status = TopicStatus::Completed;
                next.completed_at = Some(now);
            }
        }

        Ok(Completion {
            progress: next,
            unlocked,
            topic_completed: unlocked.is_none(),
        })
    }

    /// Verify the gating invariants.
    ///
    /// # Errors
    ///
    /// Returns the first violated invariant.
    pub fn check_invariants(&self) -> Result<(), ProgressDocumentError> {
        for &kind in ActivityKind::all() {
            let state = self.activity(kind);
            if state.completed && !state.unlocked {
                return Err(ProgressDocumentError::CompletedWhileLocked { kind });
            }
            if let Some(prev) = kind.predecessor() {
                if state.unlocked && !self.is_completed(prev) {
                    return Err(ProgressDocumentError::SkippedPredecessor { kind });
                }
            }
        }

        let any_unlocked = self.activities.iter().any(|a| a.unlocked);
        let consistent = match self.status {
            TopicStatus::Locked => !any_unlocked,
            TopicStatus::Unlocked => {
                self.is_unlocked(ActivityKind::Flashcard)
                    && !self.is_completed(ActivityKind::SpeakIt)
            }
            TopicStatus::Completed => self.is_completed(ActivityKind::SpeakIt),
        };
        if !consistent {
            return Err(ProgressDocumentError::StatusMismatch {
                status: self.status,
            });
        }
        Ok(())
    }

    /// Persisted shape of this progress.
    #[must_use]
    pub fn to_document(&self) -> ProgressDocument {
        let activity = ActivityKind::all()
            .iter()
            .map(|&kind| {
                let state = self.activity(kind);
                let outcome = self.outcome(kind);
                (
                    kind.to_key().to_owned(),
                    ActivityRecord {
                        unlocked: state.unlocked,
                        completed: state.completed,
                        score: outcome.map(|o| o.score),
                        total: outcome.map(|o| o.total),
                    },
                )
            })
            .collect();

        ProgressDocument {
            status: self.status,
            last_activity: self.last_activity,
            activity,
            updated_at: self.updated_at,
            completed_at: self.completed_at,
        }
    }

    /// Rebuild progress from its persisted shape.
    ///
    /// Unknown activity keys are ignored and missing ones are treated as locked.
    ///
    /// # Errors
    ///
    /// Returns `ProgressDocumentError` if the document breaks the gating invariants.
    pub fn from_document(doc: ProgressDocument) -> Result<Self, ProgressDocumentError> {
        let mut activities = [ActivityState::LOCKED; ACTIVITY_COUNT];
        let mut outcomes = [None; ACTIVITY_COUNT];
        for (key, record) in &doc.activity {
            let Some(kind) = ActivityKind::from_key(key) else {
                continue;
            };
            activities[kind.index()] = ActivityState {
                unlocked: record.unlocked,
                completed: record.completed,
            };
            outcomes[kind.index()] = match (record.score, record.total) {
                (Some(score), Some(total)) => {
                    let outcome = ActivityOutcome::new(score, total);
                    if !outcome.is_valid() {
                        return Err(ProgressDocumentError::InvalidOutcome { kind });
                    }
                    Some(outcome)
                }
                _ => None,
            };
        }

        let progress = Self {
            activities,
            outcomes,
            status: doc.status,
            last_activity: doc.last_activity,
            updated_at: doc.updated_at,
            completed_at: doc.completed_at,
        };
        progress.check_invariants()?;
        Ok(progress)
    }
}

//
// ─── PERSISTED SHAPE ───────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityRecord {
    #[serde(default)]
    pub unlocked: bool,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total: Option<u32>,
}

/// Document stored under `users/{user}/progress/{chapter}/sub_chapters/{topic}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressDocument {
    pub status: TopicStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_activity: Option<ActivityKind>,
    #[serde(default)]
    pub activity: BTreeMap<String, ActivityRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn finish(progress: &TopicProgress, kind: ActivityKind) -> TopicProgress {
        progress
            .complete(kind, ActivityOutcome::full(5), fixed_now())
            .unwrap()
            .progress
    }

    #[test]
    fn initial_state_only_opens_flashcard() {
        let p = TopicProgress::initial();
        assert_eq!(p.status(), TopicStatus::Unlocked);
        for &kind in ActivityKind::all() {
            assert_eq!(p.is_unlocked(kind), kind == ActivityKind::Flashcard);
            assert!(!p.is_completed(kind));
        }
        assert_eq!(p.next_available(), Some(ActivityKind::Flashcard));
        p.check_invariants().unwrap();
    }

    #[test]
    fn completing_flashcard_unlocks_matching_only() {
        let p = TopicProgress::initial();
        let done = p
            .complete(ActivityKind::Flashcard, ActivityOutcome::full(5), fixed_now())
            .unwrap();

        assert_eq!(done.unlocked, Some(ActivityKind::Matching));
        assert!(!done.topic_completed);
        let next = done.progress;
        assert!(next.is_completed(ActivityKind::Flashcard));
        assert!(next.is_unlocked(ActivityKind::Matching));
        assert!(!next.is_unlocked(ActivityKind::Quiz));
        assert!(!next.is_unlocked(ActivityKind::Scrambled));
        assert!(!next.is_unlocked(ActivityKind::SpeakIt));
        assert_eq!(next.last_activity(), Some(ActivityKind::Flashcard));
        assert_eq!(next.updated_at(), Some(fixed_now()));
        // original value untouched
        assert!(!p.is_completed(ActivityKind::Flashcard));
    }

    #[test]
    fn double_completion_is_rejected() {
        let p = finish(&TopicProgress::initial(), ActivityKind::Flashcard);
        let err = p
            .complete(ActivityKind::Flashcard, ActivityOutcome::full(5), fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::AlreadyCompleted {
                kind: ActivityKind::Flashcard
            }
        );
    }

    #[test]
    fn skipping_ahead_is_rejected() {
        let err = TopicProgress::initial()
            .complete(ActivityKind::Quiz, ActivityOutcome::full(5), fixed_now())
            .unwrap_err();
        assert_eq!(
            err,
            TransitionError::Locked {
                kind: ActivityKind::Quiz
            }
        );
    }

    #[test]
    fn locked_topic_rejects_everything() {
        let err = TopicProgress::locked()
            .complete(ActivityKind::Flashcard, ActivityOutcome::full(5), fixed_now())
            .unwrap_err();
        assert_eq!(err, TransitionError::TopicLocked);
    }

    #[test]
    fn outcome_above_total_is_rejected() {
        let err = TopicProgress::initial()
            .complete(ActivityKind::Flashcard, ActivityOutcome::new(7, 5), fixed_now())
            .unwrap_err();
        assert_eq!(err, TransitionError::InvalidOutcome { score: 7, total: 5 });
    }

    #[test]
    fn full_ladder_completes_topic() {
        let mut p = TopicProgress::initial();
        for &kind in ActivityKind::all() {
            p.check_invariants().unwrap();
            assert_eq!(p.next_available(), Some(kind));
            p = finish(&p, kind);
        }
        assert_eq!(p.status(), TopicStatus::Completed);
        assert_eq!(p.completed_at(), Some(fixed_now()));
        assert_eq!(p.next_available(), None);
        p.check_invariants().unwrap();
    }

    #[test]
    fn document_round_trip_keeps_state() {
        let p = finish(
            &finish(&TopicProgress::initial(), ActivityKind::Flashcard),
            ActivityKind::Matching,
        );
        let doc = p.to_document();
        assert_eq!(doc.activity.len(), 5);
        assert!(doc.activity["quiz"].unlocked);
        assert_eq!(TopicProgress::from_document(doc).unwrap(), p);
    }

    #[test]
    fn document_with_skipped_step_is_rejected() {
        let mut doc = TopicProgress::initial().to_document();
        if let Some(quiz) = doc.activity.get_mut("quiz") {
            quiz.unlocked = true;
        }
        let err = TopicProgress::from_document(doc).unwrap_err();
        assert_eq!(
            err,
            ProgressDocumentError::SkippedPredecessor {
                kind: ActivityKind::Quiz
            }
        );
    }

    #[test]
    fn document_with_score_above_total_is_rejected() {
        let p = finish(&TopicProgress::initial(), ActivityKind::Flashcard);
        let mut doc = p.to_document();
        if let Some(flashcard) = doc.activity.get_mut("flashcard") {
            flashcard.score = Some(9);
            flashcard.total = Some(5);
        }
        assert_eq!(
            TopicProgress::from_document(doc).unwrap_err(),
            ProgressDocumentError::InvalidOutcome {
                kind: ActivityKind::Flashcard
            }
        );
    }

    #[test]
    fn document_missing_keys_are_locked() {
        let doc = ProgressDocument {
            status: TopicStatus::Unlocked,
            last_activity: None,
            activity: BTreeMap::from([(
                "flashcard".to_owned(),
                ActivityRecord {
                    unlocked: true,
                    completed: false,
                    score: None,
                    total: None,
                },
            )]),
            updated_at: None,
            completed_at: None,
        };
        assert_eq!(
            TopicProgress::from_document(doc).unwrap(),
            TopicProgress::initial()
        );
    }
}
