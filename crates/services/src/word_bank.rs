use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use lesson_core::model::{ChapterId, RawWordRecord, Topic, TopicCatalog, TopicId, WordId, WordItem};
use storage::repository::{Document, DocumentPath, DocumentStore};

use crate::documents::from_fields;
use crate::error::WordBankError;

/// Collection holding one document per vocabulary record.
pub const VOCABULARY_COLLECTION: &str = "vocabularies";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ChapterRecord {
    sub_chapter_ids: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TopicRecord {
    title: Option<String>,
    order: i64,
    vocab_ids: Vec<String>,
}

/// `chapters/{chapter}`
fn chapter_path(chapter: &ChapterId) -> Result<DocumentPath, WordBankError> {
    Ok(DocumentPath::from_segments(["chapters", chapter.as_str()])?)
}

/// `chapters/{chapter}/sub_chapters`
fn topics_collection(chapter: &ChapterId) -> String {
    format!("chapters/{chapter}/sub_chapters")
}

/// Reads chapter content and turns vocabulary records into `WordItem`s.
#[derive(Clone)]
pub struct WordBank {
    documents: Arc<dyn DocumentStore>,
}

impl WordBank {
    #[must_use]
    pub fn new(documents: Arc<dyn DocumentStore>) -> Self {
        Self { documents }
    }

    /// Topics of `chapter` in learning order.
    ///
    /// # Errors
    ///
    /// Returns `WordBankError::MissingContent` if the chapter document does not exist,
    /// `WordBankError::Storage` if the store cannot be read.
    pub async fn load_catalog(&self, chapter: &ChapterId) -> Result<TopicCatalog, WordBankError> {
        let path = chapter_path(chapter)?;
        let fields = self
            .documents
            .get_document(&path)
            .await?
            .ok_or_else(|| WordBankError::MissingContent {
                path: path.to_string(),
            })?;
        let record: ChapterRecord =
            from_fields(fields).map_err(|e| WordBankError::MalformedContent {
                path: path.to_string(),
                reason: e.to_string(),
            })?;

        let collection = topics_collection(chapter);
        let docs = self
            .documents
            .query_by_id_set(&collection, &record.sub_chapter_ids)
            .await?;

        let topics: Vec<Topic> = docs
            .into_iter()
            .filter_map(|doc| topic_from_document(&collection, doc))
            .collect();
        debug!(%chapter, topics = topics.len(), "loaded topic catalog");
        Ok(TopicCatalog::new(topics))
    }

    /// Words of one topic, in the topic's `vocab_ids` order.
    ///
    /// # Errors
    ///
    /// Returns `WordBankError::MissingContent` if the topic document does not exist,
    /// `WordBankError::Storage` if the store cannot be read.
    pub async fn words_for_topic(
        &self,
        chapter: &ChapterId,
        topic: &TopicId,
    ) -> Result<Vec<WordItem>, WordBankError> {
        let collection = topics_collection(chapter);
        let path = DocumentPath::in_collection(&collection, topic.as_str())?;
        let fields = self
            .documents
            .get_document(&path)
            .await?
            .ok_or_else(|| WordBankError::MissingContent {
                path: path.to_string(),
            })?;
        let doc = Document {
            id: topic.as_str().to_owned(),
            fields,
        };
        let topic = topic_from_document(&collection, doc).ok_or_else(|| {
            WordBankError::MalformedContent {
                path: path.to_string(),
                reason: "unreadable topic record".into(),
            }
        })?;
        self.words_for(&topic).await
    }

    /// Words of an already loaded topic.
    ///
    /// Invalid or missing vocabulary records are skipped.
    ///
    /// # Errors
    ///
    /// Returns `WordBankError::Storage` if the store cannot be read.
    pub async fn words_for(&self, topic: &Topic) -> Result<Vec<WordItem>, WordBankError> {
        let mut seen = HashSet::new();
        let ids: Vec<String> = topic
            .word_ids
            .iter()
            .filter(|id| seen.insert((*id).clone()))
            .map(|id| id.as_str().to_owned())
            .collect();
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let docs = self
            .documents
            .query_by_id_set(VOCABULARY_COLLECTION, &ids)
            .await?;
        let mut by_id: HashMap<String, Document> =
            docs.into_iter().map(|d| (d.id.clone(), d)).collect();

        let mut words = Vec::with_capacity(ids.len());
        for id in &ids {
            let Some(doc) = by_id.remove(id) else {
                warn!(topic = %topic.id, word = %id, "vocabulary record missing");
                continue;
            };
            match normalize_document(doc) {
                Ok(word) => words.push(word),
                Err(reason) => warn!(topic = %topic.id, word = %id, %reason, "skipping vocabulary record"),
            }
        }
        debug!(topic = %topic.id, words = words.len(), "loaded topic words");
        Ok(words)
    }
}

fn normalize_document(doc: Document) -> Result<WordItem, String> {
    let id = WordId::new(&doc.id).map_err(|e| e.to_string())?;
    let raw: RawWordRecord = from_fields(doc.fields).map_err(|e| e.to_string())?;
    WordItem::normalize(id, raw).map_err(|e| e.to_string())
}

fn topic_from_document(collection: &str, doc: Document) -> Option<Topic> {
    let id = match TopicId::new(&doc.id) {
        Ok(id) => id,
        Err(e) => {
            warn!(collection, id = %doc.id, error = %e, "skipping topic with invalid id");
            return None;
        }
    };
    let record: TopicRecord = match from_fields(doc.fields) {
        Ok(record) => record,
        Err(e) => {
            warn!(collection, %id, error = %e, "skipping malformed topic");
            return None;
        }
    };
    let word_ids = record
        .vocab_ids
        .iter()
        .filter_map(|raw| match WordId::new(raw) {
            Ok(word) => Some(word),
            Err(e) => {
                warn!(topic = %id, word = %raw, error = %e, "skipping invalid vocabulary id");
                None
            }
        })
        .collect();
    Some(Topic {
        title: record
            .title
            .map(|t| t.trim().to_owned())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| id.to_string()),
        order: record.order,
        word_ids,
        id,
    })
}
