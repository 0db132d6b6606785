//! Min-queue of `(priority, clause)` entries with lazy invalidation.
//!
//! Updating a clause's weight only inserts a new entry; the weight table stays the ground
//! truth and entries that disagree with it are dropped when they reach the top. Every
//! insertion and removal is journaled so a search branch can be rolled back exactly.

use crate::formula::ClauseIdx;
use crate::solver::heuristic::Priority;
use std::collections::BTreeMap;

#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(crate) struct Entry {
    pub priority: Priority,
    pub clause: ClauseIdx,
}

#[derive(Clone, Copy, Debug)]
enum Op {
    Pushed(Entry),
    Removed(Entry),
}

#[derive(Default, Debug)]
pub(crate) struct LazyQueue {
    // multiset: entry -> multiplicity
    entries: BTreeMap<Entry, usize>,
    journal: Vec<Op>,
}

impl LazyQueue {
    pub fn push(&mut self, entry: Entry) {
        self.insert(entry);
        self.journal.push(Op::Pushed(entry));
    }

    /// Drops stale entries from the top until one satisfies `is_current`, and returns it
    /// without removing it.
    pub fn peek_valid(&mut self, is_current: impl Fn(&Entry) -> bool) -> Option<Entry> {
        loop {
            let top = *self.entries.keys().next()?;
            if is_current(&top) {
                return Some(top);
            }
            self.take(top);
            self.journal.push(Op::Removed(top));
        }
    }

    /// Removes one copy of `entry`.
    pub fn remove(&mut self, entry: Entry) {
        let removed = self.take(entry);
        debug_assert!(removed, "removing {:?} which is not queued", entry);
        self.journal.push(Op::Removed(entry));
    }

    pub fn mark(&self) -> usize {
        self.journal.len()
    }

    /// Undoes every push and removal made since `mark`.
    pub fn rollback(&mut self, mark: usize) {
        while self.journal.len() > mark {
            match self.journal.pop() {
                Some(Op::Pushed(entry)) => {
                    self.take(entry);
                }
                Some(Op::Removed(entry)) => self.insert(entry),
                None => break,
            }
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.entries.values().sum()
    }

    #[cfg(test)]
    pub fn contains(&self, entry: &Entry) -> bool {
        self.entries.contains_key(entry)
    }

    #[cfg(test)]
    pub fn snapshot(&self) -> Vec<(Entry, usize)> {
        self.entries.iter().map(|(e, count)| (*e, *count)).collect()
    }

    fn insert(&mut self, entry: Entry) {
        *self.entries.entry(entry).or_insert(0) += 1;
    }

    fn take(&mut self, entry: Entry) -> bool {
        match self.entries.get_mut(&entry) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                self.entries.remove(&entry);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::heuristic::{Band, Weight};

    fn entry(band: Band, clause: usize) -> Entry {
        Entry {
            priority: Weight::new(band).priority(),
            clause: ClauseIdx(clause),
        }
    }

    #[test]
    fn pops_in_priority_order() {
        let mut q = LazyQueue::default();
        q.push(entry(Band::Negative, 0));
        q.push(entry(Band::Positive { slack: 3, fresh: 3 }, 1));
        q.push(entry(Band::Positive { slack: 2, fresh: 0 }, 2));

        let top = q.peek_valid(|_| true).unwrap();
        assert_eq!(top.clause, ClauseIdx(2));
        q.remove(top);
        assert_eq!(q.peek_valid(|_| true).unwrap().clause, ClauseIdx(1));
        assert_eq!(q.len(), 2);
    }

    #[test]
    fn stale_entries_are_skipped() {
        let mut table = vec![Weight::new(Band::Positive { slack: 2, fresh: 2 }); 2];
        let mut q = LazyQueue::default();
        for (idx, w) in table.iter().enumerate() {
            q.push(Entry {
                priority: w.priority(),
                clause: ClauseIdx(idx),
            });
        }

        // clause 0 is satisfied; its queued entry goes stale and is never reinserted
        table[0] = Weight::new(Band::Satisfied);
        let top = q
            .peek_valid(|e| table[e.clause.0].priority() == e.priority)
            .unwrap();
        assert_eq!(top.clause, ClauseIdx(1));
        assert_eq!(q.len(), 1);
    }

    #[test]
    fn rollback_restores_the_multiset() {
        let mut q = LazyQueue::default();
        q.push(entry(Band::Negative, 0));
        q.push(entry(Band::Unit(crate::formula::p(1)), 1));
        let before = q.snapshot();

        let mark = q.mark();
        q.push(entry(Band::Unit(crate::formula::p(1)), 1));
        q.push(entry(Band::Positive { slack: 2, fresh: 1 }, 2));
        let top = q.peek_valid(|e| e.clause != ClauseIdx(1)).unwrap();
        q.remove(top);
        assert_ne!(q.snapshot(), before);

        q.rollback(mark);
        assert_eq!(q.snapshot(), before);
    }
}
