use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::model::ids::{TopicId, WordId};

/// A topic (sub-chapter) and the vocabulary it draws from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    pub id: TopicId,
    pub title: String,
    pub order: i64,
    pub word_ids: Vec<WordId>,
}

/// Topics of one chapter in learning order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopicCatalog {
    topics: Vec<Topic>,
}

impl TopicCatalog {
    /// Build a catalog, sorting by `order` and then by id for stable ties.
    ///
    /// Later duplicates of an id are dropped.
    #[must_use]
    pub fn new(mut topics: Vec<Topic>) -> Self {
        topics.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.id.cmp(&b.id)));
        let mut seen = HashSet::new();
        topics.retain(|t| seen.insert(t.id.clone()));
        Self { topics }
    }

    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&Topic> {
        self.topics.first()
    }

    #[must_use]
    pub fn get(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| &t.id == id)
    }

    #[must_use]
    pub fn contains(&self, id: &TopicId) -> bool {
        self.get(id).is_some()
    }

    #[must_use]
    pub fn is_first(&self, id: &TopicId) -> bool {
        self.first().is_some_and(|t| &t.id == id)
    }

    /// Topic that follows `id`, if any.
    #[must_use]
    pub fn next_after(&self, id: &TopicId) -> Option<&Topic> {
        let pos = self.position(id)?;
        self.topics.get(pos + 1)
    }

    /// Topic that precedes `id`, if any.
    #[must_use]
    pub fn previous_of(&self, id: &TopicId) -> Option<&Topic> {
        let pos = self.position(id)?;
        pos.checked_sub(1).and_then(|p| self.topics.get(p))
    }

    fn position(&self, id: &TopicId) -> Option<usize> {
        self.topics.iter().position(|t| &t.id == id)
    }
}
