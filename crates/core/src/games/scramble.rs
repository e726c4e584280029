use rand::Rng;
use serde::{Deserialize, Serialize};

use super::{GameError, count_u32, shuffled};
use crate::model::{ActivityOutcome, WordItem};

/// A letter tile. `id` keeps repeated letters distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Letter {
    pub id: usize,
    pub ch: char,
}

/// Result of `ScrambleState::check`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScrambleCheck {
    pub correct: bool,
}

/// Letter-rearrangement puzzle for a single word.
///
/// Every tile is always in exactly one place: the pool or a slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrambleState {
    target_word: String,
    letter_pool: Vec<Letter>,
    slots: Vec<Option<Letter>>,
}

impl ScrambleState {
    /// Split `word` into uppercase tiles and shuffle them into the pool.
    pub fn build<R: Rng + ?Sized>(word: &str, rng: &mut R) -> Self {
        let target_word = word.trim().to_uppercase();
        let letters: Vec<Letter> = target_word
            .chars()
            .enumerate()
            .map(|(id, ch)| Letter { id, ch })
            .collect();
        let slots = vec![None; letters.len()];
        Self {
            target_word,
            letter_pool: shuffled(letters, rng),
            slots,
        }
    }

    #[must_use]
    pub fn target_word(&self) -> &str {
        &self.target_word
    }

    #[must_use]
    pub fn letter_pool(&self) -> &[Letter] {
        &self.letter_pool
    }

    #[must_use]
    pub fn slots(&self) -> &[Option<Letter>] {
        &self.slots
    }

    #[must_use]
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// Current slot contents, with `_` for empty slots.
    #[must_use]
    pub fn assembled(&self) -> String {
        self.slots
            .iter()
            .map(|s| s.map_or('_', |l| l.ch))
            .collect()
    }

    /// Move tile `letter_id` from the pool into the first empty slot.
    ///
    /// Returns false (no-op) if the tile is not in the pool or no slot is empty.
    pub fn place_letter(&mut self, letter_id: usize) -> bool {
        let Some(slot) = self.slots.iter().position(Option::is_none) else {
            return false;
        };
        let Some(pos) = self.letter_pool.iter().position(|l| l.id == letter_id) else {
            return false;
        };
        let letter = self.letter_pool.remove(pos);
        self.slots[slot] = Some(letter);
        true
    }

    /// Move the tile in `slot_index` back to the end of the pool.
    ///
    /// Returns false (no-op) if the slot is empty or out of range.
    pub fn remove_letter(&mut self, slot_index: usize) -> bool {
        let Some(letter) = self.slots.get_mut(slot_index).and_then(Option::take) else {
            return false;
        };
        self.letter_pool.push(letter);
        true
    }

    /// Correct iff every slot is filled and the slots spell the target,
    /// compared position by position without regard to case.
    #[must_use]
    pub fn check(&self) -> ScrambleCheck {
        if !self.is_full() {
            return ScrambleCheck { correct: false };
        }
        let assembled: String = self.slots.iter().flatten().map(|l| l.ch).collect();
        ScrambleCheck {
            correct: assembled.to_lowercase() == self.target_word.to_lowercase(),
        }
    }
}

/// What a check did to the round.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScrambleProgress {
    /// Slots left untouched for further editing.
    Wrong,
    /// Word solved, the next word is now current.
    Solved { word: String },
    /// Last word solved.
    Completed { word: String, outcome: ActivityOutcome },
}

/// A scramble activity over a list of words, one puzzle at a time.
#[derive(Debug, Clone)]
pub struct ScrambleRound {
    puzzles: Vec<ScrambleState>,
    current: usize,
    solved: u32,
}

impl ScrambleRound {
    /// Build one shuffled puzzle per word.
    ///
    /// # Errors
    ///
    /// Returns `GameError::InsufficientData` if `words` is empty.
    pub fn build<R: Rng + ?Sized>(words: &[WordItem], rng: &mut R) -> Result<Self, GameError> {
        if words.is_empty() {
            return Err(GameError::InsufficientData {
                needed: 1,
                available: 0,
            });
        }
        let puzzles = words
            .iter()
            .map(|w| ScrambleState::build(&w.headword, rng))
            .collect();
        Ok(Self {
            puzzles,
            current: 0,
            solved: 0,
        })
    }

    /// Puzzle being played, `None` once the round is complete.
    #[must_use]
    pub fn current(&self) -> Option<&ScrambleState> {
        self.puzzles.get(self.current)
    }

    #[must_use]
    pub fn position(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.puzzles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.puzzles.is_empty()
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.current >= self.puzzles.len()
    }

    pub fn place_letter(&mut self, letter_id: usize) -> bool {
        self.puzzles
            .get_mut(self.current)
            .is_some_and(|p| p.place_letter(letter_id))
    }

    pub fn remove_letter(&mut self, slot_index: usize) -> bool {
        self.puzzles
            .get_mut(self.current)
            .is_some_and(|p| p.remove_letter(slot_index))
    }

    /// Check the current puzzle and advance on success.
    pub fn check(&mut self) -> ScrambleProgress {
        let Some(puzzle) = self.puzzles.get(self.current) else {
            return ScrambleProgress::Wrong;
        };
        if !puzzle.check().correct {
            return ScrambleProgress::Wrong;
        }

        let word = puzzle.target_word().to_owned();
        self.solved = self.solved.saturating_add(1);
        self.current += 1;
        if self.is_complete() {
            ScrambleProgress::Completed {
                word,
                outcome: ActivityOutcome::new(self.solved, count_u32(self.puzzles.len())),
            }
        } else {
            ScrambleProgress::Solved { word }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WordId;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sorted_chars(s: &str) -> Vec<char> {
        let mut chars: Vec<char> = s.chars().collect();
        chars.sort_unstable();
        chars
    }

    fn multiset(state: &ScrambleState) -> Vec<char> {
        let mut chars: Vec<char> = state
            .letter_pool()
            .iter()
            .map(|l| l.ch)
            .chain(state.slots().iter().flatten().map(|l| l.ch))
            .collect();
        chars.sort_unstable();
        chars
    }

    /// Place tiles so the slots read `spelling`.
    fn spell(state: &mut ScrambleState, spelling: &str) {
        for ch in spelling.chars() {
            let id = state
                .letter_pool()
                .iter()
                .find(|l| l.ch == ch)
                .map(|l| l.id)
                .unwrap();
            assert!(state.place_letter(id));
        }
    }

    #[test]
    fn build_uppercases_and_opens_slots() {
        let mut rng = StdRng::seed_from_u64(3);
        let state = ScrambleState::build("apple", &mut rng);
        assert_eq!(state.target_word(), "APPLE");
        assert_eq!(state.slots().len(), 5);
        assert!(state.slots().iter().all(Option::is_none));
        assert_eq!(multiset(&state), sorted_chars("APPLE"));
    }

    #[test]
    fn placement_preserves_multiset() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut state = ScrambleState::build("banana", &mut rng);
        let ids: Vec<usize> = state.letter_pool().iter().map(|l| l.id).collect();
        for id in &ids[..3] {
            assert!(state.place_letter(*id));
            assert_eq!(multiset(&state), sorted_chars("BANANA"));
        }
        assert!(state.remove_letter(1));
        assert_eq!(multiset(&state), sorted_chars("BANANA"));
        assert_eq!(state.slots()[1], None);
        // next placement fills the hole first
        let next = state.letter_pool()[0].id;
        assert!(state.place_letter(next));
        assert!(state.slots()[1].is_some());
    }

    #[test]
    fn removed_letter_goes_to_end_of_pool() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = ScrambleState::build("cat", &mut rng);
        let first = state.letter_pool()[0];
        state.place_letter(first.id);
        state.remove_letter(0);
        assert_eq!(state.letter_pool().last(), Some(&first));
    }

    #[test]
    fn no_op_cases() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut state = ScrambleState::build("go", &mut rng);
        assert!(!state.remove_letter(0));
        assert!(!state.remove_letter(9));
        assert!(!state.place_letter(99));
        spell(&mut state, "GO");
        let before = state.clone();
        assert!(!state.place_letter(0));
        assert_eq!(state, before);
    }

    #[test]
    fn correct_spelling_is_accepted() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = ScrambleState::build("Water", &mut rng);
        spell(&mut state, "WATER");
        assert!(state.check().correct);
    }

    #[test]
    fn wrong_permutation_is_rejected_and_kept() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut state = ScrambleState::build("Water", &mut rng);
        spell(&mut state, "TAWER");
        assert!(!state.check().correct);
        assert_eq!(state.assembled(), "TAWER");
    }

    #[test]
    fn repeated_letters_are_interchangeable() {
        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut state = ScrambleState::build("APPLE", &mut rng);
            // place the second P tile before the first one
            let p_ids: Vec<usize> = {
                let mut ids: Vec<usize> = state
                    .letter_pool()
                    .iter()
                    .filter(|l| l.ch == 'P')
                    .map(|l| l.id)
                    .collect();
                ids.sort_unstable();
                ids.reverse();
                ids
            };
            let a = state.letter_pool().iter().find(|l| l.ch == 'A').unwrap().id;
            state.place_letter(a);
            state.place_letter(p_ids[0]);
            state.place_letter(p_ids[1]);
            spell(&mut state, "LE");
            assert!(state.check().correct, "seed {seed}");
        }
    }

    #[test]
    fn partial_fill_is_never_correct() {
        let mut rng = StdRng::seed_from_u64(8);
        let mut state = ScrambleState::build("book", &mut rng);
        spell(&mut state, "BOO");
        assert!(!state.check().correct);
    }

    #[test]
    fn round_walks_all_words() {
        let words: Vec<WordItem> = [("w1", "Book", "Buku"), ("w2", "Home", "Rumah")]
            .iter()
            .map(|(id, en, tr)| WordItem::pair(WordId::new(*id).unwrap(), *en, *tr).unwrap())
            .collect();
        let mut rng = StdRng::seed_from_u64(4);
        let mut round = ScrambleRound::build(&words, &mut rng).unwrap();

        assert_eq!(round.check(), ScrambleProgress::Wrong);
        for ch in "BOOK".chars() {
            let id = round
                .current()
                .unwrap()
                .letter_pool()
                .iter()
                .find(|l| l.ch == ch)
                .unwrap()
                .id;
            round.place_letter(id);
        }
        assert_eq!(
            round.check(),
            ScrambleProgress::Solved {
                word: "BOOK".into()
            }
        );
        assert_eq!(round.position(), 1);

        for ch in "HOME".chars() {
            let id = round
                .current()
                .unwrap()
                .letter_pool()
                .iter()
                .find(|l| l.ch == ch)
                .unwrap()
                .id;
            round.place_letter(id);
        }
        assert_eq!(
            round.check(),
            ScrambleProgress::Completed {
                word: "HOME".into(),
                outcome: ActivityOutcome::full(2)
            }
        );
        assert!(round.is_complete());
        assert!(round.current().is_none());
    }
}
