//! Bounded spin history
//!
//! Most-recent-first ring buffer over the feed's outcomes. The feed often
//! returns the same latest spin for several polls in a row, so an append of
//! a value equal to the current head is treated as "no new data".

use crate::types::Spin;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SpinHistory {
    spins: VecDeque<Spin>,
    capacity: usize,
    seq: u64,
}

impl SpinHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            spins: VecDeque::with_capacity(capacity),
            capacity,
            seq: 0,
        }
    }

    /// Records a new spin at the front. Returns `false` (and leaves the
    /// history untouched) when the spin equals the most recent one.
    pub fn record(&mut self, spin: Spin) -> bool {
        if self.spins.front() == Some(&spin) {
            return false;
        }
        self.spins.push_front(spin);
        self.seq += 1;
        while self.spins.len() > self.capacity {
            self.spins.pop_back();
        }
        true
    }

    /// Sequence number of the newest spin: the count of spins ever
    /// recorded. Lets callers tell whether a given spin was already
    /// visible when some other state was captured.
    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn latest(&self) -> Option<Spin> {
        self.spins.front().copied()
    }

    pub fn len(&self) -> usize {
        self.spins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spins.is_empty()
    }

    /// Up to `n` most recent spins, most recent first.
    pub fn window(&self, n: usize) -> Vec<Spin> {
        self.spins.iter().take(n).copied().collect()
    }

    /// Full snapshot, most recent first.
    pub fn snapshot(&self) -> Vec<Spin> {
        self.spins.iter().copied().collect()
    }
}
