use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use lesson_core::model::{
    ActivityKind, ActivityOutcome, ChapterId, TopicId, TopicProgress, TopicStatus, TransitionError,
    UserId,
};
use lesson_core::{Clock, LessonSettings};
use storage::repository::DocumentStore;

use super::activity::{ActiveActivity, Step, Voice};
use super::input::ActivityInput;
use super::view::{ActivityUpdate, LessonOutcome, PuzzleView};
use crate::error::{ProgressError, SessionError};
use crate::progress_graph::ProgressGraph;
use crate::speech::{SilentSpeech, SpeechOutput};
use crate::word_bank::WordBank;

struct ActiveSession {
    user: UserId,
    chapter: ChapterId,
    topic: TopicId,
    activity: ActiveActivity,
    /// Outcome whose commit failed and may be retried.
    pending: Option<ActivityOutcome>,
}

/// Runs at most one activity at a time and turns its completion into a
/// progress update.
pub struct SessionOrchestrator {
    clock: Clock,
    documents: Arc<dyn DocumentStore>,
    words: WordBank,
    speech: Arc<dyn SpeechOutput>,
    settings: LessonSettings,
    rng: StdRng,
    graphs: HashMap<ChapterId, Arc<ProgressGraph>>,
    active: Option<ActiveSession>,
}

impl SessionOrchestrator {
    #[must_use]
    pub fn new(clock: Clock, documents: Arc<dyn DocumentStore>) -> Self {
        let settings = LessonSettings::default();
        Self {
            clock,
            words: WordBank::new(Arc::clone(&documents)),
            documents,
            speech: Arc::new(SilentSpeech),
            rng: seeded_rng(settings.shuffle_seed()),
            settings,
            graphs: HashMap::new(),
            active: None,
        }
    }

    /// Replace the settings; reseeds the shuffler from `settings.shuffle_seed()`.
    #[must_use]
    pub fn with_settings(mut self, settings: LessonSettings) -> Self {
        self.rng = seeded_rng(settings.shuffle_seed());
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn with_speech(mut self, speech: Arc<dyn SpeechOutput>) -> Self {
        self.speech = speech;
        self
    }

    #[must_use]
    pub fn settings(&self) -> &LessonSettings {
        &self.settings
    }

    #[must_use]
    pub fn word_bank(&self) -> &WordBank {
        &self.words
    }

    /// Progress graph of `chapter`, loading its topic catalog on first use.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InsufficientData` if the chapter content is
    /// missing and `SessionError::PersistenceFailure` if it cannot be read.
    pub async fn progress_graph(
        &mut self,
        chapter: &ChapterId,
    ) -> Result<Arc<ProgressGraph>, SessionError> {
        if let Some(graph) = self.graphs.get(chapter) {
            return Ok(Arc::clone(graph));
        }
        let catalog = self.words.load_catalog(chapter).await?;
        let graph = Arc::new(ProgressGraph::new(
            self.clock,
            Arc::clone(&self.documents),
            chapter.clone(),
            catalog,
        ));
        self.graphs.insert(chapter.clone(), Arc::clone(&graph));
        Ok(graph)
    }

    /// Start `kind` for `topic`, discarding any running activity.
    ///
    /// Replaying an activity that is already completed is allowed; finishing
    /// it again changes nothing.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidTransition` if `kind` is not unlocked,
    /// `SessionError::InsufficientData` if the topic has too few usable words
    /// and `SessionError::PersistenceFailure` if the store cannot be read.
    pub async fn start_activity(
        &mut self,
        user: &UserId,
        chapter: &ChapterId,
        topic: &TopicId,
        kind: ActivityKind,
    ) -> Result<PuzzleView, SessionError> {
        let graph = self.progress_graph(chapter).await?;
        let progress = graph.open(user, topic).await?;
        if progress.status() == TopicStatus::Locked {
            return Err(TransitionError::TopicLocked.into());
        }
        if !progress.is_unlocked(kind) {
            return Err(TransitionError::Locked { kind }.into());
        }

        let entry = graph
            .catalog()
            .get(topic)
            .ok_or_else(|| SessionError::UnknownTopic {
                topic: topic.clone(),
            })?;
        let words = self.words.words_for(entry).await?;
        let activity = ActiveActivity::build(kind, words, &self.settings, &mut self.rng)?;

        if let Some(previous) = self.active.take() {
            debug!(
                topic = %previous.topic,
                activity = %previous.activity.kind(),
                "discarding unfinished activity"
            );
        }
        info!(%user, %chapter, %topic, activity = %kind, "activity started");

        activity.announce(&Voice {
            output: self.speech.as_ref(),
            locale: self.settings.speech_locale(),
        });
        let view = activity.view();
        self.active = Some(ActiveSession {
            user: user.clone(),
            chapter: chapter.clone(),
            topic: topic.clone(),
            activity,
            pending: None,
        });
        Ok(view)
    }

    /// Feed one learner input to the running activity.
    ///
    /// When the input finishes the activity, its completion is persisted
    /// before this returns; a failed run is reported without touching progress.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveActivity`, `SessionError::InputMismatch`
    /// for inputs of another activity, and `SessionError::PersistenceFailure`
    /// if the completion could not be stored. After a persistence failure the
    /// activity stays finished and [`SessionOrchestrator::retry_completion`]
    /// can try again.
    pub async fn submit(
        &mut self,
        input: ActivityInput,
        now: DateTime<Utc>,
    ) -> Result<ActivityUpdate, SessionError> {
        let voice_output = Arc::clone(&self.speech);
        let session = self.active.as_mut().ok_or(SessionError::NoActiveActivity)?;
        if session.pending.is_some() {
            return Ok(ActivityUpdate {
                view: session.activity.view(),
                outcome: None,
            });
        }

        let voice = Voice {
            output: voice_output.as_ref(),
            locale: self.settings.speech_locale(),
        };
        let step = session.activity.apply(input, now, &voice)?;

        match step {
            Step::Continue => Ok(ActivityUpdate {
                view: session.activity.view(),
                outcome: None,
            }),
            Step::Failed { score, total } => {
                let kind = session.activity.kind();
                info!(
                    user = %session.user,
                    topic = %session.topic,
                    activity = %kind,
                    score,
                    total,
                    "activity failed"
                );
                let view = session.activity.view();
                self.active = None;
                Ok(ActivityUpdate {
                    view,
                    outcome: Some(LessonOutcome::Failed { kind, score, total }),
                })
            }
            Step::Finished(outcome) => {
                session.pending = Some(outcome);
                self.commit().await
            }
        }
    }

    /// Try again to persist a completion whose write failed.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NoActiveActivity` if nothing is waiting to be
    /// committed, otherwise the same errors as [`SessionOrchestrator::submit`].
    pub async fn retry_completion(&mut self) -> Result<ActivityUpdate, SessionError> {
        match &self.active {
            Some(session) if session.pending.is_some() => self.commit().await,
            _ => Err(SessionError::NoActiveActivity),
        }
    }

    async fn commit(&mut self) -> Result<ActivityUpdate, SessionError> {
        let (user, chapter, topic, kind, outcome) = match &self.active {
            Some(ActiveSession {
                user,
                chapter,
                topic,
                activity,
                pending: Some(outcome),
            }) => (
                user.clone(),
                chapter.clone(),
                topic.clone(),
                activity.kind(),
                *outcome,
            ),
            _ => return Err(SessionError::NoActiveActivity),
        };

        let graph = self.progress_graph(&chapter).await?;
        let result = match graph.complete(&user, &topic, kind, outcome).await {
            Ok(done) => LessonOutcome::Completed {
                kind,
                score: outcome.score,
                total: outcome.total,
                progress: done.progress,
                unlocked: done.unlocked,
                topic_completed: done.topic_completed,
                replay: false,
            },
            Err(ProgressError::InvalidTransition(TransitionError::AlreadyCompleted { .. })) => {
                debug!(%user, %topic, activity = %kind, "replayed activity, progress unchanged");
                LessonOutcome::Completed {
                    kind,
                    score: outcome.score,
                    total: outcome.total,
                    progress: graph.snapshot(&user, &topic).await?,
                    unlocked: None,
                    topic_completed: false,
                    replay: true,
                }
            }
            Err(e @ ProgressError::PersistenceFailure(_)) => {
                warn!(%user, %topic, activity = %kind, error = %e, "completion not persisted");
                return Err(e.into());
            }
            Err(e) => {
                self.active = None;
                return Err(e.into());
            }
        };

        self.active = None;
        Ok(ActivityUpdate {
            view: PuzzleView::Finished { kind },
            outcome: Some(result),
        })
    }

    /// View of the running activity, if any.
    #[must_use]
    pub fn current_puzzle_state(&self) -> Option<PuzzleView> {
        self.active.as_ref().map(|s| s.activity.view())
    }

    /// Kind of the running activity, if any.
    #[must_use]
    pub fn active_kind(&self) -> Option<ActivityKind> {
        self.active.as_ref().map(|s| s.activity.kind())
    }

    /// Progress of `topic` as last seen by this session.
    ///
    /// # Errors
    ///
    /// Same as [`SessionOrchestrator::progress_graph`] plus progress read errors.
    pub async fn progress_snapshot(
        &mut self,
        user: &UserId,
        chapter: &ChapterId,
        topic: &TopicId,
    ) -> Result<TopicProgress, SessionError> {
        let graph = self.progress_graph(chapter).await?;
        Ok(graph.snapshot(user, topic).await?)
    }

    /// Drop the running activity without persisting anything.
    pub fn abandon(&mut self) -> Option<ActivityKind> {
        let session = self.active.take()?;
        let kind = session.activity.kind();
        info!(user = %session.user, topic = %session.topic, activity = %kind, "activity abandoned");
        Some(kind)
    }

    /// Advance timers of the running activity. Returns the new view if it changed.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Option<PuzzleView> {
        let session = self.active.as_mut()?;
        session
            .activity
            .tick(now)
            .then(|| session.activity.view())
    }
}

fn seeded_rng(seed: Option<u64>) -> StdRng {
    StdRng::seed_from_u64(seed.unwrap_or_else(rand::random))
}
