//! Duplicate detection for original node ids.

use crate::collections::{AtomicBitSet, GrowingAtomicBitSet};
use crate::core::loading::error::ResourceError;

/// Decides whether an original id has been imported before.
///
/// With dedup disabled every id counts as unseen. With a known id domain a
/// fixed-capacity atomic bitset is indexed directly by original id; with an
/// unknown domain a growing bitset doubles its capacity under a write lock.
pub enum DedupPredicate {
    Disabled,
    FixedSize(AtomicBitSet),
    Growing(GrowingAtomicBitSet),
}

impl DedupPredicate {
    pub fn for_config(deduplicate_ids: bool, max_original_id: Option<i64>) -> Self {
        if !deduplicate_ids {
            return DedupPredicate::Disabled;
        }
        match max_original_id {
            Some(max) => {
                DedupPredicate::FixedSize(AtomicBitSet::new(max as usize + 1))
            }
            None => DedupPredicate::Growing(GrowingAtomicBitSet::new()),
        }
    }

    /// Marks `original` as seen and reports whether it already was.
    ///
    /// Exactly one of any number of racing callers observes `false` for a
    /// given id.
    pub fn seen_before(&self, original: i64) -> Result<bool, ResourceError> {
        match self {
            DedupPredicate::Disabled => Ok(false),
            DedupPredicate::FixedSize(bits) => Ok(bits.get_and_set(original as usize)),
            DedupPredicate::Growing(bits) => {
                bits.get_and_set(original as usize).map_err(Into::into)
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, DedupPredicate::Disabled)
    }
}
