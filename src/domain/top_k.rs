//! Bounded top-K selection
//!
//! Keeps the K largest items of a stream in a min-heap of fixed capacity, so
//! selecting the K most frequent words out of D distinct ones costs
//! O(D log K) instead of the O(D log D) of a full sort.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use super::word_freq::{WordFreq, WordFrequencyMap};

/// Fixed-capacity container that retains the largest items offered to it.
///
/// The smallest retained item sits at the top of the heap. Once full, a new
/// item only gets in if it is strictly greater than that minimum, which it
/// then evicts.
#[derive(Debug, Clone)]
pub struct BoundedMinHeap<T: Ord> {
    capacity: usize,
    heap: BinaryHeap<Reverse<T>>,
}

impl<T: Ord> BoundedMinHeap<T> {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    /// Offers an item; returns whether it was retained.
    pub fn offer(&mut self, item: T) -> bool {
        if self.heap.len() < self.capacity {
            self.heap.push(Reverse(item));
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut min) if item > min.0 => {
                // PeekMut restores the heap property when dropped.
                *min = Reverse(item);
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub fn peek_min(&self) -> Option<&T> {
        self.heap.peek().map(|Reverse(item)| item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Drains the heap (smallest first) and reverses the result, yielding the
    /// retained items largest first.
    #[must_use]
    pub fn into_sorted_desc(mut self) -> Vec<T> {
        let mut drained = Vec::with_capacity(self.heap.len());
        while let Some(Reverse(item)) = self.heap.pop() {
            drained.push(item);
        }
        drained.reverse();
        drained
    }
}

/// Orders a `WordFreq` by its frequency alone.
#[derive(Debug, Clone)]
struct ByFrequency(WordFreq);

impl PartialEq for ByFrequency {
    fn eq(&self, other: &Self) -> bool {
        self.0.frequency == other.0.frequency
    }
}

impl Eq for ByFrequency {}

impl PartialOrd for ByFrequency {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ByFrequency {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.frequency.cmp(&other.0.frequency)
    }
}

/// Returns the `k` most frequent words, highest frequency first.
///
/// The result holds `min(k, freq.len())` entries. Words with equal counts are
/// returned in no particular order, and which of them survives at the cut-off
/// is unspecified.
#[must_use]
pub fn top_n(k: usize, freq: &WordFrequencyMap) -> Vec<WordFreq> {
    let mut heap = BoundedMinHeap::with_capacity(k.min(freq.len()));

    for (word, &count) in freq {
        // Cheap pre-check so losing candidates never allocate.
        if heap.len() == heap.capacity()
            && heap.peek_min().is_none_or(|min: &ByFrequency| count <= min.0.frequency)
        {
            continue;
        }
        heap.offer(ByFrequency(WordFreq::new(word.clone(), count)));
    }

    heap.into_sorted_desc().into_iter().map(|entry| entry.0).collect()
}
