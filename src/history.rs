//! Linear undo history of whole-surface snapshots.
//!
//! One snapshot is pushed per completed stroke. Undo drops the newest entry and
//! hands back the one before it; there is no redo. The first entry is the floor
//! that undo never removes.

use std::collections::VecDeque;

/// How many snapshots a [`HistoryLog`] retains.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HistoryLimit {
    #[default]
    Unbounded,
    /// Keep at most this many entries, evicting the oldest. Values below 1
    /// are treated as 1.
    Bounded(usize),
}

impl HistoryLimit {
    /// `0` in the config file means unbounded.
    pub fn from_config(limit: usize) -> Self {
        if limit == 0 {
            HistoryLimit::Unbounded
        } else {
            HistoryLimit::Bounded(limit)
        }
    }
}

#[derive(Clone, Debug)]
pub struct HistoryLog<T> {
    entries: VecDeque<T>,
    limit: HistoryLimit,
}

impl<T> HistoryLog<T> {
    /// Seeds the log with the empty-surface snapshot.
    pub fn initialize(empty: T, limit: HistoryLimit) -> Self {
        let mut entries = VecDeque::new();
        entries.push_back(empty);
        Self { entries, limit }
    }

    pub fn push(&mut self, snapshot: T) {
        self.entries.push_back(snapshot);
        if let HistoryLimit::Bounded(max) = self.limit {
            let max = max.max(1);
            while self.entries.len() > max {
                self.entries.pop_front();
            }
        }
    }

    /// Steps back one entry and returns the state to restore. At the floor
    /// this is a no-op returning the sole entry.
    pub fn undo(&mut self) -> &T {
        if self.entries.len() > 1 {
            self.entries.pop_back();
        }
        self.current()
    }

    pub fn current(&self) -> &T {
        // never empty: seeded on construction and undo keeps the last entry
        &self.entries[self.entries.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn undo_on_fresh_log_returns_seed() {
        let mut log = HistoryLog::initialize("empty", HistoryLimit::Unbounded);
        assert_eq!(*log.undo(), "empty");
        assert_eq!(*log.undo(), "empty");
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn undo_walks_back_to_the_seed_and_stops() {
        let mut log = HistoryLog::initialize(0, HistoryLimit::Unbounded);
        for i in 1..=4 {
            log.push(i);
        }
        assert_eq!(log.len(), 5);

        assert_eq!(*log.undo(), 3);
        assert_eq!(*log.undo(), 2);
        assert_eq!(*log.undo(), 1);
        assert_eq!(*log.undo(), 0);
        assert_eq!(*log.undo(), 0);
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn push_after_undo_discards_the_undone_branch() {
        let mut log = HistoryLog::initialize('a', HistoryLimit::Unbounded);
        log.push('b');
        log.push('c');
        log.undo();
        log.push('d');

        assert_eq!(*log.current(), 'd');
        assert_eq!(*log.undo(), 'b');
        assert_eq!(*log.undo(), 'a');
    }

    #[test]
    fn duplicate_snapshots_are_kept() {
        let mut log = HistoryLog::initialize(1, HistoryLimit::Unbounded);
        log.push(1);
        log.push(1);
        assert_eq!(log.len(), 3);
    }

    #[test]
    fn bounded_log_evicts_oldest_and_moves_the_floor() {
        let mut log = HistoryLog::initialize(0, HistoryLimit::Bounded(3));
        for i in 1..=5 {
            log.push(i);
            assert!(log.len() <= 3);
        }
        assert_eq!(*log.current(), 5);
        assert_eq!(*log.undo(), 4);
        assert_eq!(*log.undo(), 3);
        assert_eq!(*log.undo(), 3);
        assert!(!log.is_empty());
    }

    #[test]
    fn zero_bound_still_keeps_one_entry() {
        let mut log = HistoryLog::initialize("seed", HistoryLimit::Bounded(0));
        log.push("stroke");
        assert_eq!(log.len(), 1);
        assert_eq!(*log.undo(), "stroke");
    }

    #[test]
    fn config_zero_means_unbounded() {
        assert_eq!(HistoryLimit::from_config(0), HistoryLimit::Unbounded);
        assert_eq!(HistoryLimit::from_config(20), HistoryLimit::Bounded(20));
    }
}
