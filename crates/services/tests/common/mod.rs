#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};

use lesson_core::LessonSettings;
use lesson_core::model::{ChapterId, TopicId, UserId};
use lesson_core::time::fixed_clock;
use services::{RecordedSpeech, SessionOrchestrator};
use storage::repository::{
    Document, DocumentPath, DocumentStore, Fields, InMemoryStore, StorageError,
};

pub const WORDS: [(&str, &str, &str); 6] = [
    ("v1", "Hello", "Halo"),
    ("v2", "Apple", "Apel"),
    ("v3", "Water", "Air"),
    ("v4", "Book", "Buku"),
    ("v5", "School", "Sekolah"),
    ("v6", "Friend", "Teman"),
];

pub fn user() -> UserId {
    UserId::new("learner-1").unwrap()
}

pub fn chapter() -> ChapterId {
    ChapterId::new("about-me").unwrap()
}

pub fn topic(id: &str) -> TopicId {
    TopicId::new(id).unwrap()
}

fn fields(value: Value) -> Fields {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

async fn put(store: &dyn DocumentStore, path: &str, value: Value) {
    store
        .set_document(&DocumentPath::parse(path).unwrap(), fields(value), false)
        .await
        .unwrap();
}

/// Chapter `about-me` with topics `greetings` then `family`, both over the six words.
pub async fn seed(store: &dyn DocumentStore) {
    let ids: Vec<&str> = WORDS.iter().map(|(id, _, _)| *id).collect();
    put(store, "chapters/about-me", json!({"sub_chapter_ids": ["family", "greetings"]})).await;
    put(
        store,
        "chapters/about-me/sub_chapters/greetings",
        json!({"title": "Greetings", "order": 1, "vocab_ids": ids}),
    )
    .await;
    put(
        store,
        "chapters/about-me/sub_chapters/family",
        json!({"title": "Family", "order": 2, "vocab_ids": ids}),
    )
    .await;
    for (id, word, translation) in WORDS {
        put(
            store,
            &format!("vocabularies/{id}"),
            json!({"word": word, "indonesian": translation}),
        )
        .await;
    }
}

pub async fn seeded_store() -> InMemoryStore {
    let store = InMemoryStore::new();
    seed(&store).await;
    store
}

pub fn orchestrator(
    store: Arc<dyn DocumentStore>,
    speech: Arc<RecordedSpeech>,
) -> SessionOrchestrator {
    SessionOrchestrator::new(fixed_clock(), store)
        .with_settings(LessonSettings::default().with_shuffle_seed(Some(7)))
        .with_speech(speech)
}

/// Store double that rejects selected writes.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryStore,
    /// Writes whose path contains this fragment fail.
    reject: Arc<Mutex<Option<String>>>,
}

impl FlakyStore {
    pub fn new(inner: InMemoryStore) -> Self {
        Self {
            inner,
            reject: Arc::default(),
        }
    }

    pub fn fail_writes(&self, fail: bool) {
        *self.reject.lock().unwrap() = fail.then(String::new);
    }

    pub fn fail_writes_to(&self, fragment: &str) {
        *self.reject.lock().unwrap() = Some(fragment.to_owned());
    }
}

#[async_trait]
impl DocumentStore for FlakyStore {
    async fn get_document(&self, path: &DocumentPath) -> Result<Option<Fields>, StorageError> {
        self.inner.get_document(path).await
    }

    async fn set_document(
        &self,
        path: &DocumentPath,
        fields: Fields,
        merge: bool,
    ) -> Result<(), StorageError> {
        let rejected = self
            .reject
            .lock()
            .unwrap()
            .as_deref()
            .is_some_and(|fragment| path.to_string().contains(fragment));
        if rejected {
            return Err(StorageError::Connection("write rejected".into()));
        }
        self.inner.set_document(path, fields, merge).await
    }

    async fn query_by_id_set(
        &self,
        collection: &str,
        ids: &[String],
    ) -> Result<Vec<Document>, StorageError> {
        self.inner.query_by_id_set(collection, ids).await
    }
}
