// src/watch/milestones.rs

use std::collections::{BTreeSet, HashSet};

/// Exact log messages that must each be seen at least once, in any order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MilestoneSet {
    messages: BTreeSet<String>,
}

impl MilestoneSet {
    pub fn new<I, S>(messages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            messages: messages.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a set from a block of text, one milestone per non-empty line.
    pub fn from_lines(text: &str) -> Self {
        Self::new(text.lines().filter(|l| !l.is_empty()))
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, message: &str) -> bool {
        self.messages.contains(message)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.messages.iter().map(String::as_str)
    }

    /// Fresh progress tracker over this set.
    pub fn tracker(&self) -> MilestoneTracker {
        MilestoneTracker {
            pending: self.messages.iter().cloned().collect(),
            total: self.messages.len(),
        }
    }
}

impl<S: Into<String>> FromIterator<S> for MilestoneSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self::new(iter)
    }
}

/// Mutable per-watcher view of a [`MilestoneSet`].
///
/// Only the first occurrence of each milestone counts.
#[derive(Debug, Clone)]
pub struct MilestoneTracker {
    pending: HashSet<String>,
    total: usize,
}

impl MilestoneTracker {
    /// Record `message`; returns true if it satisfied a pending milestone.
    pub fn observe(&mut self, message: &str) -> bool {
        self.pending.remove(message)
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn is_complete(&self) -> bool {
        self.pending.is_empty()
    }
}
