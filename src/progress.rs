//! Completed level tracking
//!
//! The relay owns the authoritative list; this is the client's copy, updated
//! from `completedLevelsResponse` / `completedLevelsUpdated` and from local
//! goal hits.

use serde::{Deserialize, Serialize};

use crate::consts::TOTAL_LEVELS;

/// Set of completed level numbers, kept sorted
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct CompletedLevels {
    pub levels: Vec<u32>,
}

impl CompletedLevels {
    pub fn new() -> Self {
        Self { levels: Vec::new() }
    }

    /// Record a completion. Returns true if the level was new.
    pub fn mark(&mut self, level: u32) -> bool {
        if level == 0 || level > TOTAL_LEVELS {
            return false;
        }
        match self.levels.binary_search(&level) {
            Ok(_) => false,
            Err(pos) => {
                self.levels.insert(pos, level);
                true
            }
        }
    }

    /// Replace with the relay's list (invalid entries dropped)
    pub fn replace(&mut self, levels: &[u32]) {
        self.levels.clear();
        for &level in levels {
            self.mark(level);
        }
        log::debug!("Completed levels: {:?}", self.levels);
    }

    pub fn contains(&self, level: u32) -> bool {
        self.levels.binary_search(&level).is_ok()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn count(&self) -> usize {
        self.levels.len()
    }

    /// Highest completed level (if any)
    pub fn highest(&self) -> Option<u32> {
        self.levels.last().copied()
    }

    /// Every level has been completed
    pub fn all_done(&self) -> bool {
        self.levels.len() == TOTAL_LEVELS as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mark_sorted_and_unique() {
        let mut done = CompletedLevels::new();
        assert!(done.mark(3));
        assert!(done.mark(1));
        assert!(!done.mark(3));
        assert_eq!(done.levels, vec![1, 3]);
        assert_eq!(done.highest(), Some(3));
    }

    #[test]
    fn test_replace_drops_out_of_range() {
        let mut done = CompletedLevels::new();
        done.mark(2);
        done.replace(&[0, 9, 4, 42, 4]);
        assert_eq!(done.levels, vec![4, 9]);
        assert!(done.contains(9));
        assert!(!done.contains(2));
    }

    #[test]
    fn test_all_done() {
        let mut done = CompletedLevels::new();
        for level in 1..=TOTAL_LEVELS {
            done.mark(level);
        }
        assert!(done.all_done());
    }
}
