//! Fixed-capacity atomic bitset for concurrent membership tracking.
//!
//! Backs deduplication during parallel graph construction: workers race on
//! `get_and_set` and exactly one of them observes `false` for a given bit.
//! All bit operations are lock-free word-level atomics.

use std::sync::atomic::{AtomicU64, Ordering};

const NUM_BITS: usize = 64;

/// Thread-safe bitset with a capacity fixed at construction time.
///
/// Bits are packed 64 per word. `set`/`get`/`get_and_set` are safe to call
/// from any number of threads; the bulk inspection methods (`cardinality`,
/// `is_empty`) are only meaningful once concurrent writers have quiesced.
pub struct AtomicBitSet {
    words: Vec<AtomicU64>,
    num_bits: usize,
}

impl AtomicBitSet {
    /// Creates a bitset holding `size` bits, all unset.
    pub fn new(size: usize) -> Self {
        let word_count = size.div_ceil(NUM_BITS);
        let mut words = Vec::with_capacity(word_count);
        words.resize_with(word_count, || AtomicU64::new(0));
        Self {
            words,
            num_bits: size,
        }
    }

    /// Number of bits this set can hold.
    pub fn size(&self) -> usize {
        self.num_bits
    }

    /// Returns the state of the bit at `index`.
    pub fn get(&self, index: usize) -> bool {
        debug_assert!(
            index < self.num_bits,
            "index {} out of bounds (size: {})",
            index,
            self.num_bits
        );
        let mask = 1u64 << (index % NUM_BITS);
        self.words[index / NUM_BITS].load(Ordering::SeqCst) & mask != 0
    }

    /// Sets the bit at `index`.
    pub fn set(&self, index: usize) {
        debug_assert!(
            index < self.num_bits,
            "index {} out of bounds (size: {})",
            index,
            self.num_bits
        );
        let mask = 1u64 << (index % NUM_BITS);
        self.words[index / NUM_BITS].fetch_or(mask, Ordering::SeqCst);
    }

    /// Atomically sets the bit at `index` and returns its previous state.
    ///
    /// When several threads race on the same index, exactly one observes
    /// `false`.
    pub fn get_and_set(&self, index: usize) -> bool {
        debug_assert!(
            index < self.num_bits,
            "index {} out of bounds (size: {})",
            index,
            self.num_bits
        );
        let mask = 1u64 << (index % NUM_BITS);
        let previous = self.words[index / NUM_BITS].fetch_or(mask, Ordering::SeqCst);
        previous & mask != 0
    }

    /// Number of set bits. Not synchronized with concurrent writers.
    pub fn cardinality(&self) -> usize {
        self.words
            .iter()
            .map(|word| word.load(Ordering::SeqCst).count_ones() as usize)
            .sum()
    }

    /// `true` if no bit is set. Not synchronized with concurrent writers.
    pub fn is_empty(&self) -> bool {
        self.words
            .iter()
            .all(|word| word.load(Ordering::SeqCst) == 0)
    }
}

impl std::fmt::Debug for AtomicBitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AtomicBitSet")
            .field("num_bits", &self.num_bits)
            .field("cardinality", &self.cardinality())
            .finish()
    }
}
