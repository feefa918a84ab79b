//! Bookkeeping for symbols the note mapping could not translate

use std::collections::BTreeMap;

/// Lookup failures counted by key
///
/// The reader keys failures by (instrument, pitch); the writer keys them by
/// (instrument name, symbol). Conversions keep going and hand the counts
/// back for inspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureCounts<K: Ord> {
    counts: BTreeMap<K, usize>,
}

impl<K: Ord> FailureCounts<K> {
    pub fn new() -> Self {
        Self { counts: BTreeMap::new() }
    }

    pub fn record(&mut self, key: K) {
        *self.counts.entry(key).or_insert(0) += 1;
    }

    pub fn count(&self, key: &K) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    /// Total number of failed lookups
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &usize)> {
        self.counts.iter()
    }
}

impl<K: Ord> Default for FailureCounts<K> {
    fn default() -> Self {
        Self::new()
    }
}
