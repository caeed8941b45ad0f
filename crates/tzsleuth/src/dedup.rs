//! Provenance-keyed merging.
//!
//! Overlapping sources (a push event and a commit search hit for the same
//! commit, a PR seen in both the event stream and the PR search) are merged
//! here. Order is preserved: baseline first, then incoming in fetch order.

use std::collections::HashSet;

use crate::model::ProvenanceKey;

/// Provenance URLs already incorporated into a result.
///
/// Grows monotonically for the lifetime of one aggregation call.
#[derive(Debug, Default, Clone)]
pub struct SeenKeySet {
    keys: HashSet<String>,
}

impl SeenKeySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a key set from existing items.
    pub fn from_items<T: ProvenanceKey>(items: &[T]) -> Self {
        Self {
            keys: items
                .iter()
                .map(|item| item.provenance_key().to_string())
                .collect(),
        }
    }

    /// Record a key. Returns false if it was already present.
    pub fn insert(&mut self, key: &str) -> bool {
        if self.keys.contains(key) {
            return false;
        }
        self.keys.insert(key.to_string())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(key)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Append every unseen item of `incoming` to `target`.
    ///
    /// Returns the number of items appended. Duplicates inside `incoming`
    /// itself are dropped as well.
    pub fn merge_into<T: ProvenanceKey>(
        &mut self,
        target: &mut Vec<T>,
        incoming: impl IntoIterator<Item = T>,
    ) -> usize {
        let before = target.len();
        for item in incoming {
            if self.insert(item.provenance_key()) {
                target.push(item);
            }
        }
        target.len() - before
    }
}

/// Merge `incoming` into `baseline`, discarding anything whose provenance key
/// is already present.
///
/// The baseline is assumed to be duplicate-free; incoming duplicates of
/// either the baseline or of earlier incoming items are discarded.
pub fn merge<T: ProvenanceKey>(baseline: Vec<T>, incoming: Vec<T>) -> Vec<T> {
    let mut seen = SeenKeySet::from_items(&baseline);
    let mut merged = baseline;
    merged.reserve(incoming.len());
    seen.merge_into(&mut merged, incoming);
    merged
}
