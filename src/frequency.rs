//! Occurrence counts of distinct balanced sequences.
//!
//! The table only ever grows: entries are created on first sight and bumped on
//! every repeat. Keys are owned copies of the sampled sequences.

use std::collections::hash_map::{HashMap, Iter};

use crate::sequence::Sequence;

#[derive(Debug, Clone, Default)]
pub struct FrequencyTable {
    counts: HashMap<Sequence, u64>,
    total: u64,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more observation of `sequence`.
    pub fn record(&mut self, sequence: Sequence) {
        *self.counts.entry(sequence).or_insert(0) += 1;
        self.total += 1;
    }

    /// Sum of all counts.
    pub fn total_count(&self) -> u64 {
        self.total
    }

    /// Number of distinct sequences seen.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn count_of(&self, sequence: &Sequence) -> u64 {
        self.counts.get(sequence).copied().unwrap_or(0)
    }

    /// Each entry's share of the total, in unspecified order.
    pub fn proportions(&self) -> Vec<f64> {
        let total = self.total as f64;
        self.counts.values().map(|&count| count as f64 / total).collect()
    }

    pub fn iter(&self) -> Iter<'_, Sequence, u64> {
        self.counts.iter()
    }
}

impl Extend<Sequence> for FrequencyTable {
    fn extend<T: IntoIterator<Item = Sequence>>(&mut self, iter: T) {
        for sequence in iter {
            self.record(sequence);
        }
    }
}

impl<'a> IntoIterator for &'a FrequencyTable {
    type Item = (&'a Sequence, &'a u64);
    type IntoIter = Iter<'a, Sequence, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
