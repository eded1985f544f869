//! Stable frequency counting and top-N ranking

use std::collections::HashMap;
use std::hash::Hash;

/// Count occurrences, remembering the order in which keys were first seen
#[derive(Debug, Clone)]
pub struct FrequencyCounter<K> {
    counts: Vec<(K, usize)>,
    index: HashMap<K, usize>,
}

impl<K: Eq + Hash + Clone> FrequencyCounter<K> {
    pub fn new() -> Self {
        Self {
            counts: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn add(&mut self, key: K) {
        match self.index.get(&key) {
            Some(&slot) => self.counts[slot].1 += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push((key, 1));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// All keys by count descending; ties keep first-seen order
    pub fn ranked(self) -> Vec<(K, usize)> {
        let mut counts = self.counts;
        // sort_by is stable
        counts.sort_by(|a, b| b.1.cmp(&a.1));
        counts
    }

    /// The `n` highest counts; ties keep first-seen order
    pub fn top(self, n: usize) -> Vec<(K, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }
}

impl<K: Eq + Hash + Clone> Default for FrequencyCounter<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Eq + Hash + Clone> FromIterator<K> for FrequencyCounter<K> {
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Self::new();
        for key in iter {
            counter.add(key);
        }
        counter
    }
}
