//! Atomic bitset that grows on demand for unbounded id domains.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicU64, Ordering};
use thiserror::Error;

const NUM_BITS: usize = 64;

/// Hard ceiling on the word count so a single runaway id cannot request an
/// absurd allocation. 2^56 words is 2^62 bits, well past any valid node id.
const MAX_WORDS: usize = 1 << 56;

/// Raised when the bitset cannot be resized to cover a requested index.
#[derive(Debug, Clone, Error)]
#[error("cannot grow bitset to cover bit index {index}")]
pub struct BitsetGrowError {
    pub index: usize,
}

/// Thread-safe bitset whose capacity doubles whenever an out-of-range bit is
/// touched.
///
/// The fast path takes a read lock and performs a lock-free `fetch_or` on the
/// addressed word. Resizing swaps in a larger word vector under the write
/// lock; readers never observe a shrinking capacity.
pub struct GrowingAtomicBitSet {
    words: RwLock<Vec<AtomicU64>>,
}

impl GrowingAtomicBitSet {
    const INITIAL_WORDS: usize = 16;

    pub fn new() -> Self {
        let mut words = Vec::with_capacity(Self::INITIAL_WORDS);
        words.resize_with(Self::INITIAL_WORDS, || AtomicU64::new(0));
        Self {
            words: RwLock::new(words),
        }
    }

    /// Current capacity in bits.
    pub fn capacity(&self) -> usize {
        self.words.read().len() * NUM_BITS
    }

    /// Returns the state of the bit at `index` without growing.
    pub fn get(&self, index: usize) -> bool {
        let words = self.words.read();
        let word_index = index / NUM_BITS;
        match words.get(word_index) {
            Some(word) => word.load(Ordering::SeqCst) & (1u64 << (index % NUM_BITS)) != 0,
            None => false,
        }
    }

    /// Atomically sets the bit at `index`, growing if necessary, and returns
    /// its previous state.
    pub fn get_and_set(&self, index: usize) -> Result<bool, BitsetGrowError> {
        let word_index = index / NUM_BITS;
        let mask = 1u64 << (index % NUM_BITS);

        {
            let words = self.words.read();
            if let Some(word) = words.get(word_index) {
                return Ok(word.fetch_or(mask, Ordering::SeqCst) & mask != 0);
            }
        }

        let mut words = self.words.write();
        if word_index >= words.len() {
            let mut new_len = words.len().max(1);
            while new_len <= word_index {
                new_len = new_len.saturating_mul(2);
                if new_len > MAX_WORDS {
                    return Err(BitsetGrowError { index });
                }
            }
            words.resize_with(new_len, || AtomicU64::new(0));
        }
        Ok(words[word_index].fetch_or(mask, Ordering::SeqCst) & mask != 0)
    }

    /// Number of set bits. Not synchronized with concurrent writers.
    pub fn cardinality(&self) -> usize {
        self.words
            .read()
            .iter()
            .map(|word| word.load(Ordering::SeqCst).count_ones() as usize)
            .sum()
    }
}

impl Default for GrowingAtomicBitSet {
    fn default() -> Self {
        Self::new()
    }
}
