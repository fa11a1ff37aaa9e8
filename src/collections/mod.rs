pub mod atomic_bitset;
pub mod bit_set;
pub mod growing_bitset;

pub use atomic_bitset::AtomicBitSet;
pub use bit_set::BitSet;
pub use growing_bitset::GrowingAtomicBitSet;
