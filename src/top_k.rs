use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pattern {
    // Sorted ascending by id.
    pub items: Vec<u32>,
    pub support: u64,
}

// Higher support ranks higher, then longer patterns, then lower ids.
impl Ord for Pattern {
    fn cmp(&self, other: &Pattern) -> Ordering {
        self.support
            .cmp(&other.support)
            .then_with(|| self.items.len().cmp(&other.items.len()))
            .then_with(|| other.items.cmp(&self.items))
    }
}

impl PartialOrd for Pattern {
    fn partial_cmp(&self, other: &Pattern) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Assumes both itemsets are sorted.
pub fn is_subset(a: &[u32], b: &[u32]) -> bool {
    let mut bp = 0;
    for &item in a {
        while bp < b.len() && b[bp] < item {
            bp += 1;
        }
        if bp == b.len() || b[bp] != item {
            return false;
        }
        bp += 1;
    }
    true
}

/// Keeps the `capacity` best closed patterns seen so far in a min-heap. When
/// full, inserting a better pattern evicts the current worst one.
///
/// Only closed patterns are retained: a pattern is rejected if a kept
/// superset has the same support, and it replaces any kept subsets that have
/// the same support.
pub struct TopKPatterns {
    capacity: usize,
    heap: BinaryHeap<Reverse<Pattern>>,
}

impl TopKPatterns {
    pub fn new(capacity: usize) -> TopKPatterns {
        TopKPatterns {
            capacity: capacity.max(1),
            heap: BinaryHeap::with_capacity(capacity.max(1) + 1),
        }
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.heap.len() >= self.capacity
    }

    pub fn least_support(&self) -> Option<u64> {
        self.heap.peek().map(|&Reverse(ref p)| p.support)
    }

    /// Whether a pattern of this support could still enter the heap. Since
    /// support only shrinks as a pattern grows, a `false` here also rules
    /// out every extension of the pattern.
    pub fn admits(&self, support: u64) -> bool {
        match self.least_support() {
            Some(least) if self.is_full() => support >= least,
            _ => true,
        }
    }

    pub fn insert(&mut self, items: Vec<u32>, support: u64) -> bool {
        if !self.admits(support) {
            return false;
        }
        let subsumed = self
            .heap
            .iter()
            .any(|&Reverse(ref p)| p.support == support && is_subset(&items, &p.items));
        if subsumed {
            return false;
        }
        self.heap
            .retain(|&Reverse(ref p)| !(p.support == support && is_subset(&p.items, &items)));
        self.heap.push(Reverse(Pattern { items, support }));
        if self.heap.len() > self.capacity {
            self.heap.pop();
        }
        true
    }

    /// The kept patterns, best first.
    pub fn into_sorted_vec(self) -> Vec<Pattern> {
        let mut patterns: Vec<Pattern> = self.heap.into_iter().map(|Reverse(p)| p).collect();
        patterns.sort_by(|a, b| b.cmp(a));
        patterns
    }
}
