use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use lesson_core::Clock;
use lesson_core::model::{
    ActivityKind, ActivityOutcome, ChapterId, Completion, ProgressDocument, TopicCatalog,
    TopicId, TopicProgress, TopicStatus, UserId,
};
use storage::repository::{DocumentPath, DocumentStore, Fields};

use crate::documents::{from_fields, to_fields};
use crate::error::ProgressError;

type CacheKey = (UserId, TopicId);

/// Activity ladder of every topic in one chapter, per learner.
///
/// The only component that writes progress. A completion is reflected in
/// memory only after the store confirmed the write. Writers are serialized,
/// so of two overlapping completions of the same activity only one succeeds.
pub struct ProgressGraph {
    clock: Clock,
    documents: Arc<dyn DocumentStore>,
    chapter: ChapterId,
    catalog: TopicCatalog,
    cache: Mutex<HashMap<CacheKey, TopicProgress>>,
    writes: AsyncMutex<()>,
}

impl ProgressGraph {
    #[must_use]
    pub fn new(
        clock: Clock,
        documents: Arc<dyn DocumentStore>,
        chapter: ChapterId,
        catalog: TopicCatalog,
    ) -> Self {
        Self {
            clock,
            documents,
            chapter,
            catalog,
            cache: Mutex::new(HashMap::new()),
            writes: AsyncMutex::new(()),
        }
    }

    #[must_use]
    pub fn chapter(&self) -> &ChapterId {
        &self.chapter
    }

    #[must_use]
    pub fn catalog(&self) -> &TopicCatalog {
        &self.catalog
    }

    /// Document path `users/{user}/progress/{chapter}/sub_chapters/{topic}`.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::PersistenceFailure` if the ids do not form a valid path.
    pub fn document_path(&self, user: &UserId, topic: &TopicId) -> Result<DocumentPath, ProgressError> {
        Ok(DocumentPath::from_segments([
            "users",
            user.as_str(),
            "progress",
            self.chapter.as_str(),
            "sub_chapters",
            topic.as_str(),
        ])?)
    }

    /// Current progress of `topic`, read from the store.
    ///
    /// Never writes. A topic that is stored as locked, or not stored at
    /// all, is open when it is the first of the chapter or its predecessor
    /// is completed, and locked otherwise.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::UnknownTopic` for topics outside the chapter,
    /// `ProgressError::CorruptProgress` for unreadable documents and
    /// `ProgressError::PersistenceFailure` if the store cannot be read.
    pub async fn open(&self, user: &UserId, topic: &TopicId) -> Result<TopicProgress, ProgressError> {
        self.ensure_known(topic)?;
        let progress = match self.read_stored(user, topic).await? {
            Some(stored) if stored.status() != TopicStatus::Locked => stored,
            _ => self.entry_state(user, topic).await?,
        };
        debug!(%user, chapter = %self.chapter, %topic, status = ?progress.status(), "opened topic");
        self.cache()
            .insert((user.clone(), topic.clone()), progress.clone());
        Ok(progress)
    }

    /// Cached progress, falling back to [`ProgressGraph::open`].
    ///
    /// # Errors
    ///
    /// Same as [`ProgressGraph::open`].
    pub async fn snapshot(&self, user: &UserId, topic: &TopicId) -> Result<TopicProgress, ProgressError> {
        let cached = self.cache().get(&(user.clone(), topic.clone())).cloned();
        match cached {
            Some(progress) => Ok(progress),
            None => self.open(user, topic).await,
        }
    }

    /// Record the completion of `kind` and persist the whole topic document.
    ///
    /// Completing the terminal activity also unlocks the next topic of the
    /// chapter. That second write is best effort: a failure is logged and
    /// [`ProgressGraph::open`] derives the unlock from this topic anyway.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::InvalidTransition` if `kind` is locked or
    /// already completed, and `ProgressError::PersistenceFailure` if the
    /// write fails, in which case nothing changes in memory.
    pub async fn complete(
        &self,
        user: &UserId,
        topic: &TopicId,
        kind: ActivityKind,
        outcome: ActivityOutcome,
    ) -> Result<Completion, ProgressError> {
        let _writing = self.writes.lock().await;
        let current = self.snapshot(user, topic).await?;
        let completion = current.complete(kind, outcome, self.clock.now())?;

        let path = self.document_path(user, topic)?;
        let fields = to_fields(&completion.progress.to_document())?;
        self.documents.set_document(&path, fields, false).await?;

        self.cache()
            .insert((user.clone(), topic.clone()), completion.progress.clone());
        info!(
            %user,
            chapter = %self.chapter,
            %topic,
            activity = %kind,
            score = outcome.score,
            total = outcome.total,
            "activity completed"
        );

        if completion.topic_completed {
            if let Some(next) = self.catalog.next_after(topic) {
                let next = next.id.clone();
                match self.unlock_topic(user, &next).await {
                    Ok(true) => info!(%user, chapter = %self.chapter, topic = %next, "topic unlocked"),
                    Ok(false) => debug!(%user, topic = %next, "topic already open"),
                    Err(e) => warn!(%user, topic = %next, error = %e, "failed to unlock next topic"),
                }
            }
        }

        Ok(completion)
    }

    /// Overwrite the stored progress of `topic` with its entry state.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::PersistenceFailure` if the write fails.
    pub async fn reset(&self, user: &UserId, topic: &TopicId) -> Result<TopicProgress, ProgressError> {
        self.ensure_known(topic)?;
        let _writing = self.writes.lock().await;
        let path = self.document_path(user, topic)?;
        let mut doc = self.entry_state(user, topic).await?.to_document();
        doc.updated_at = Some(self.clock.now());
        let progress = self.decode(&path, doc.clone())?;

        self.documents
            .set_document(&path, to_fields(&doc)?, false)
            .await?;
        self.cache()
            .insert((user.clone(), topic.clone()), progress.clone());
        info!(%user, chapter = %self.chapter, %topic, "progress reset");
        Ok(progress)
    }

    async fn unlock_topic(&self, user: &UserId, topic: &TopicId) -> Result<bool, ProgressError> {
        let path = self.document_path(user, topic)?;
        if let Some(fields) = self.documents.get_document(&path).await? {
            if stored_status(&fields).is_some_and(|s| s != TopicStatus::Locked) {
                return Ok(false);
            }
        }

        let mut doc = TopicProgress::initial().to_document();
        doc.updated_at = Some(self.clock.now());
        self.documents
            .set_document(&path, to_fields(&doc)?, true)
            .await?;
        self.cache().remove(&(user.clone(), topic.clone()));
        Ok(true)
    }

    async fn read_stored(
        &self,
        user: &UserId,
        topic: &TopicId,
    ) -> Result<Option<TopicProgress>, ProgressError> {
        let path = self.document_path(user, topic)?;
        let Some(fields) = self.documents.get_document(&path).await? else {
            return Ok(None);
        };
        let doc: ProgressDocument =
            from_fields(fields).map_err(|e| ProgressError::CorruptProgress {
                path: path.to_string(),
                reason: e.to_string(),
            })?;
        self.decode(&path, doc).map(Some)
    }

    /// State of a topic that has no stored progress yet.
    async fn entry_state(&self, user: &UserId, topic: &TopicId) -> Result<TopicProgress, ProgressError> {
        if self.catalog.is_first(topic) {
            return Ok(TopicProgress::initial());
        }
        let Some(previous) = self.catalog.previous_of(topic) else {
            return Ok(TopicProgress::locked());
        };
        let path = self.document_path(user, &previous.id)?;
        let completed = self
            .documents
            .get_document(&path)
            .await?
            .and_then(|fields| stored_status(&fields))
            == Some(TopicStatus::Completed);
        Ok(if completed {
            TopicProgress::initial()
        } else {
            TopicProgress::locked()
        })
    }

    fn decode(&self, path: &DocumentPath, doc: ProgressDocument) -> Result<TopicProgress, ProgressError> {
        TopicProgress::from_document(doc).map_err(|e| ProgressError::CorruptProgress {
            path: path.to_string(),
            reason: e.to_string(),
        })
    }

    fn ensure_known(&self, topic: &TopicId) -> Result<(), ProgressError> {
        if self.catalog.contains(topic) {
            Ok(())
        } else {
            Err(ProgressError::UnknownTopic {
                topic: topic.clone(),
            })
        }
    }

    fn cache(&self) -> MutexGuard<'_, HashMap<CacheKey, TopicProgress>> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn stored_status(fields: &Fields) -> Option<TopicStatus> {
    let raw = fields.get("status")?;
    match serde_json::from_value(raw.clone()) {
        Ok(status) => Some(status),
        Err(e) => {
            warn!(error = %e, "unreadable topic status");
            None
        }
    }
}
