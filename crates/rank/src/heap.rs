//! Bounded rank aggregator
//!
//! Keeps the `k` most desirable entries of a stream in O(log k) per offer.
//!
//! The heap is ordered by the inverse of the desired output order, so its
//! top is always the least desirable entry held: the eviction candidate when
//! an offer pushes the size past `k`. Draining pops that same end repeatedly
//! and prepends each entry, which leaves the output in desired order without
//! a separate sort.

use crate::order::DesiredOrder;
use snb_core::Limit;
use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};

/// Upper bound on slots reserved up front; larger limits grow on demand
const PREALLOCATE_MAX: usize = 1024;

/// Heap slot carrying the caller's desired order
struct Inverted<T> {
    entry: T,
    desired: DesiredOrder<T>,
}

impl<T> Ord for Inverted<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap pops its maximum. Under the desired order the maximum
        // is the entry emitted last, which is the minimum of the inverted
        // order: the least desirable entry.
        (self.desired)(&self.entry, &other.entry)
    }
}

impl<T> PartialOrd for Inverted<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> PartialEq for Inverted<T> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<T> Eq for Inverted<T> {}

/// Fixed-capacity top-k structure
pub struct BoundedHeap<T> {
    heap: BinaryHeap<Inverted<T>>,
    capacity: usize,
    desired: DesiredOrder<T>,
    offered: u64,
    evicted: u64,
}

impl<T> BoundedHeap<T> {
    /// Create a heap keeping at most `limit` entries under `desired`
    ///
    /// `desired` is the order the drained output should have (most desirable
    /// first); the heap inverts it internally.
    pub fn new(limit: Limit, desired: DesiredOrder<T>) -> Self {
        let capacity = limit.get();
        BoundedHeap {
            heap: BinaryHeap::with_capacity(capacity.min(PREALLOCATE_MAX) + 1),
            capacity,
            desired,
            offered: 0,
            evicted: 0,
        }
    }

    /// Insert `entry`, evicting the least desirable entry if over capacity
    ///
    /// Returns the evicted entry, which may be `entry` itself.
    pub fn offer(&mut self, entry: T) -> Option<T> {
        self.offered += 1;
        self.heap.push(Inverted {
            entry,
            desired: self.desired,
        });
        if self.heap.len() > self.capacity {
            self.evicted += 1;
            return self.heap.pop().map(|slot| slot.entry);
        }
        None
    }

    /// The least desirable entry currently held
    pub fn peek_worst(&self) -> Option<&T> {
        self.heap.peek().map(|slot| &slot.entry)
    }

    /// Number of entries held
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Whether nothing is held
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Maximum number of entries held
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries offered so far
    pub fn offered(&self) -> u64 {
        self.offered
    }

    /// Entries evicted so far
    pub fn evicted(&self) -> u64 {
        self.evicted
    }

    /// Consume the heap, most desirable entry first
    pub fn drain(mut self) -> Vec<T> {
        let mut out = VecDeque::with_capacity(self.heap.len());
        while let Some(slot) = self.heap.pop() {
            out.push_front(slot.entry);
        }
        out.into()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for BoundedHeap<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoundedHeap")
            .field("len", &self.heap.len())
            .field("capacity", &self.capacity)
            .field("worst", &self.peek_worst())
            .finish()
    }
}
