//! Bounded undo history for card edits.

use std::collections::VecDeque;

use crate::types::CardNutrients;

/// Default number of snapshots kept per session.
pub const DEFAULT_UNDO_DEPTH: usize = 50;

/// Stack of previously committed card nutrient lists, most recent last.
///
/// Lives only as long as the editing session that owns it. When full, the
/// oldest snapshot is evicted to make room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UndoHistory {
    entries: VecDeque<CardNutrients>,
    capacity: usize,
}

impl UndoHistory {
    /// An empty history keeping at most `capacity` snapshots (at least one).
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(DEFAULT_UNDO_DEPTH)),
            capacity,
        }
    }

    /// Record a snapshot, evicting the oldest one if the history is full.
    pub fn push(&mut self, snapshot: CardNutrients) {
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(snapshot);
    }

    /// Remove and return the most recent snapshot.
    pub fn pop(&mut self) -> Option<CardNutrients> {
        self.entries.pop_back()
    }

    /// Whether there is anything to undo.
    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Snapshots from oldest to most recent.
    pub fn iter(&self) -> impl Iterator<Item = &CardNutrients> {
        self.entries.iter()
    }
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::new(DEFAULT_UNDO_DEPTH)
    }
}
