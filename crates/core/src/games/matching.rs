use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameError, count_u32, shuffled};
use crate::model::{ActivityOutcome, WordId, WordItem};

/// Column an item belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    /// Headword side.
    Source,
    /// Translation side.
    Target,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchPuzzleItem {
    pub id: String,
    pub text: String,
    pub lang: Lang,
    pub pair_key: WordId,
    pub solved: bool,
}

/// What a click did to the puzzle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionResult {
    /// Ignored: unknown or solved item, or a wrong flash is still showing.
    Rejected,
    Selected,
    Deselected,
    /// A same-column click moved the selection.
    Replaced,
    Matched { pair_key: WordId },
    /// Wrong pair; both stay flagged until `until`.
    Mismatched { until: DateTime<Utc> },
    /// The last pair was matched.
    Completed(ActivityOutcome),
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct WrongFlash {
    first: String,
    second: String,
    until: DateTime<Utc>,
}

/// Two-column matching puzzle.
#[derive(Debug, Clone)]
pub struct PairMatchingEngine {
    source: Vec<MatchPuzzleItem>,
    target: Vec<MatchPuzzleItem>,
    selected: Option<String>,
    wrong: Option<WrongFlash>,
    score: u32,
    total: u32,
    flash: Duration,
}

impl PairMatchingEngine {
    /// Build a puzzle with one source and one target item per distinct word.
    ///
    /// The two columns are shuffled independently.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InsufficientData` if `words` is empty.
    pub fn build<R: Rng + ?Sized>(
        words: &[WordItem],
        wrong_flash_ms: u32,
        rng: &mut R,
    ) -> Result<Self, GameError> {
        let mut seen = HashSet::new();
        let words: Vec<&WordItem> = words.iter().filter(|w| seen.insert(w.id.clone())).collect();
        if words.is_empty() {
            return Err(GameError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }

        let source = words
            .iter()
            .map(|w| MatchPuzzleItem {
                id: format!("{}_src", w.id),
                text: w.headword.clone(),
                lang: Lang::Source,
                pair_key: w.id.clone(),
                solved: false,
            })
            .collect();
        let target = words
            .iter()
            .map(|w| MatchPuzzleItem {
                id: format!("{}_tgt", w.id),
                text: w.translation.clone(),
                lang: Lang::Target,
                pair_key: w.id.clone(),
                solved: false,
            })
            .collect();

        Ok(Self {
            source: shuffled(source, rng),
            target: shuffled(target, rng),
            selected: None,
            wrong: None,
            score: 0,
            total: count_u32(words.len()),
            flash: Duration::milliseconds(i64::from(wrong_flash_ms)),
        })
    }

    #[must_use]
    pub fn source_column(&self) -> &[MatchPuzzleItem] {
        &self.source
    }

    #[must_use]
    pub fn target_column(&self) -> &[MatchPuzzleItem] {
        &self.target
    }

    /// All 2N items, source column first.
    pub fn items(&self) -> impl Iterator<Item = &MatchPuzzleItem> {
        self.source.iter().chain(self.target.iter())
    }

    #[must_use]
    pub fn selected(&self) -> Option<&MatchPuzzleItem> {
        self.selected.as_deref().and_then(|id| self.find(id))
    }

    /// Ids of the pair currently flashing as wrong.
    #[must_use]
    pub fn wrong_pair(&self) -> Option<(&str, &str)> {
        self.wrong
            .as_ref()
            .map(|w| (w.first.as_str(), w.second.as_str()))
    }

    #[must_use]
    pub fn score(&self) -> u32 {
        self.score
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.items().all(|i| i.solved)
    }

    /// Completion event, once every item is solved.
    #[must_use]
    pub fn outcome(&self) -> Option<ActivityOutcome> {
        self.is_complete()
            .then(|| ActivityOutcome::new(self.score, self.total))
    }

    /// Clear an expired wrong flash. Returns true if something was cleared.
    pub fn tick(&mut self, now: DateTime<Utc>) -> bool {
        let expired = self.wrong.as_ref().is_some_and(|flash| now >= flash.until);
        if expired {
            self.wrong = None;
            self.selected = None;
        }
        expired
    }

    /// Handle a click on `item_id`.
    pub fn select(&mut self, item_id: &str, now: DateTime<Utc>) -> SelectionResult {
        self.tick(now);
        if self.wrong.is_some() {
            return SelectionResult::Rejected;
        }

        let Some(item) = self.find(item_id) else {
            return SelectionResult::Rejected;
        };
        if item.solved {
            return SelectionResult::Rejected;
        }
        let (lang, pair_key) = (item.lang, item.pair_key.clone());

        let Some(current) = self.selected().cloned() else {
            self.selected = Some(item_id.to_owned());
            return SelectionResult::Selected;
        };

        if current.id == item_id {
            self.selected = None;
            return SelectionResult::Deselected;
        }
        if current.lang == lang {
            self.selected = Some(item_id.to_owned());
            return SelectionResult::Replaced;
        }

        if current.pair_key == pair_key {
            self.mark_solved(&current.id);
            self.mark_solved(item_id);
            self.selected = None;
            self.score = self.score.saturating_add(1).min(self.total);
            return match self.outcome() {
                Some(outcome) => SelectionResult::Completed(outcome),
                None => SelectionResult::Matched { pair_key },
            };
        }

        let until = now + self.flash;
        self.wrong = Some(WrongFlash {
            first: current.id,
            second: item_id.to_owned(),
            until,
        });
        SelectionResult::Mismatched { until }
    }

    fn find(&self, id: &str) -> Option<&MatchPuzzleItem> {
        self.items().find(|i| i.id == id)
    }

    fn mark_solved(&mut self, id: &str) {
        if let Some(item) = self
            .source
            .iter_mut()
            .chain(self.target.iter_mut())
            .find(|i| i.id == id)
        {
            item.solved = true;
        }
    }
}
