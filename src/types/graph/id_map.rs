//! Bijection between original (external) and internal dense node ids.

use crate::collections::BitSet;
use crate::types::schema::NodeLabel;
use std::collections::HashMap;

/// Sentinel returned by raw lookups when an original id is not mapped.
pub const NOT_FOUND: i64 = -1;

pub type MappedNodeId = u64;
pub type OriginalNodeId = i64;

const PAGE_SHIFT: usize = 16;
const PAGE_SIZE: usize = 1 << PAGE_SHIFT;
const PAGE_MASK: usize = PAGE_SIZE - 1;

/// Backing storage for the original-to-internal direction.
///
/// `Dense` is a single array indexed by original id, `Paged` a two-level
/// page table for sparse or large domains, `HighLimit` a hash map for
/// arbitrary id spaces.
#[derive(Clone, Debug)]
pub enum ForwardMapping {
    Dense(Vec<i64>),
    Paged(Vec<Option<Box<[i64]>>>),
    HighLimit(HashMap<OriginalNodeId, MappedNodeId>),
}

impl ForwardMapping {
    fn get(&self, original: OriginalNodeId) -> i64 {
        if original < 0 {
            return NOT_FOUND;
        }
        let index = original as usize;
        match self {
            ForwardMapping::Dense(mapping) => {
                mapping.get(index).copied().unwrap_or(NOT_FOUND)
            }
            ForwardMapping::Paged(pages) => pages
                .get(index >> PAGE_SHIFT)
                .and_then(|page| page.as_ref())
                .map(|page| page[index & PAGE_MASK])
                .unwrap_or(NOT_FOUND),
            ForwardMapping::HighLimit(mapping) => mapping
                .get(&original)
                .map(|&internal| internal as i64)
                .unwrap_or(NOT_FOUND),
        }
    }
}

/// Builder-side mutable counterpart of [`ForwardMapping`].
#[derive(Clone, Debug)]
pub enum ForwardMappingBuilder {
    Dense(Vec<i64>),
    Paged(Vec<Option<Box<[i64]>>>),
    HighLimit(HashMap<OriginalNodeId, MappedNodeId>),
}

impl ForwardMappingBuilder {
    pub fn dense(capacity: usize) -> Self {
        ForwardMappingBuilder::Dense(vec![NOT_FOUND; capacity])
    }

    pub fn paged() -> Self {
        ForwardMappingBuilder::Paged(Vec::new())
    }

    pub fn high_limit() -> Self {
        ForwardMappingBuilder::HighLimit(HashMap::new())
    }

    pub fn set(&mut self, original: OriginalNodeId, internal: MappedNodeId) {
        debug_assert!(original >= 0, "original ids must be non-negative");
        let index = original as usize;
        match self {
            ForwardMappingBuilder::Dense(mapping) => {
                if index >= mapping.len() {
                    mapping.resize(index + 1, NOT_FOUND);
                }
                mapping[index] = internal as i64;
            }
            ForwardMappingBuilder::Paged(pages) => {
                let page_index = index >> PAGE_SHIFT;
                if page_index >= pages.len() {
                    pages.resize(page_index + 1, None);
                }
                let page = pages[page_index]
                    .get_or_insert_with(|| vec![NOT_FOUND; PAGE_SIZE].into_boxed_slice());
                page[index & PAGE_MASK] = internal as i64;
            }
            ForwardMappingBuilder::HighLimit(mapping) => {
                mapping.insert(original, internal);
            }
        }
    }

    pub fn build(self) -> ForwardMapping {
        match self {
            ForwardMappingBuilder::Dense(mapping) => ForwardMapping::Dense(mapping),
            ForwardMappingBuilder::Paged(pages) => ForwardMapping::Paged(pages),
            ForwardMappingBuilder::HighLimit(mapping) => ForwardMapping::HighLimit(mapping),
        }
    }
}

/// Immutable mapping between original ids and the dense internal id space,
/// with per-label membership bitmaps.
#[derive(Clone, Debug)]
pub struct IdMap {
    internal_to_original: Vec<OriginalNodeId>,
    forward: ForwardMapping,
    label_bitmaps: HashMap<NodeLabel, BitSet>,
    highest_original_id: OriginalNodeId,
}

impl IdMap {
    pub fn new(
        internal_to_original: Vec<OriginalNodeId>,
        forward: ForwardMapping,
        label_bitmaps: HashMap<NodeLabel, BitSet>,
    ) -> Self {
        let highest_original_id = internal_to_original.iter().copied().max().unwrap_or(-1);
        Self {
            internal_to_original,
            forward,
            label_bitmaps,
            highest_original_id,
        }
    }

    /// An id map over zero nodes.
    pub fn empty() -> Self {
        Self::new(Vec::new(), ForwardMapping::Dense(Vec::new()), HashMap::new())
    }

    pub fn node_count(&self) -> usize {
        self.internal_to_original.len()
    }

    pub fn highest_original_id(&self) -> OriginalNodeId {
        self.highest_original_id
    }

    /// Raw lookup; returns [`NOT_FOUND`] when the original id is unmapped.
    pub fn to_mapped_node_id(&self, original: OriginalNodeId) -> i64 {
        self.forward.get(original)
    }

    /// Checked lookup.
    pub fn to_internal(&self, original: OriginalNodeId) -> Option<MappedNodeId> {
        match self.forward.get(original) {
            NOT_FOUND => None,
            internal => Some(internal as MappedNodeId),
        }
    }

    pub fn to_original_node_id(&self, internal: MappedNodeId) -> OriginalNodeId {
        self.internal_to_original[internal as usize]
    }

    pub fn contains(&self, original: OriginalNodeId) -> bool {
        self.forward.get(original) != NOT_FOUND
    }

    pub fn available_node_labels(&self) -> impl Iterator<Item = &NodeLabel> {
        self.label_bitmaps.keys()
    }

    pub fn has_label(&self, internal: MappedNodeId, label: &NodeLabel) -> bool {
        self.label_bitmaps
            .get(label)
            .map(|bitmap| bitmap.get(internal as usize))
            .unwrap_or(false)
    }

    pub fn node_labels(&self, internal: MappedNodeId) -> Vec<NodeLabel> {
        self.label_bitmaps
            .iter()
            .filter(|(_, bitmap)| bitmap.get(internal as usize))
            .map(|(label, _)| label.clone())
            .collect()
    }

    /// Number of nodes carrying `label`.
    pub fn node_count_for_label(&self, label: &NodeLabel) -> usize {
        self.label_bitmaps
            .get(label)
            .map(|bitmap| bitmap.cardinality())
            .unwrap_or(0)
    }

    /// Iterates internal ids of nodes carrying `label`.
    pub fn nodes_for_label<'a>(
        &'a self,
        label: &NodeLabel,
    ) -> Box<dyn Iterator<Item = MappedNodeId> + 'a> {
        match self.label_bitmaps.get(label) {
            Some(bitmap) => Box::new(bitmap.iter().map(|id| id as MappedNodeId)),
            None => Box::new(std::iter::empty()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = MappedNodeId> {
        0..self.node_count() as MappedNodeId
    }

    pub fn iter_original(&self) -> impl Iterator<Item = OriginalNodeId> + '_ {
        self.internal_to_original.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id_map_of(original_ids: &[i64]) -> IdMap {
        let mut builder = ForwardMappingBuilder::dense(0);
        for (internal, &original) in original_ids.iter().enumerate() {
            builder.set(original, internal as u64);
        }
        IdMap::new(original_ids.to_vec(), builder.build(), HashMap::new())
    }

    #[test]
    fn round_trip_both_directions() {
        let id_map = id_map_of(&[42, 7, 100]);

        for internal in id_map.iter() {
            let original = id_map.to_original_node_id(internal);
            assert_eq!(id_map.to_internal(original), Some(internal));
        }
        for original in [42i64, 7, 100] {
            let internal = id_map.to_internal(original).unwrap();
            assert_eq!(id_map.to_original_node_id(internal), original);
        }
    }

    #[test]
    fn unmapped_ids_report_not_found() {
        let id_map = id_map_of(&[1, 2]);
        assert_eq!(id_map.to_mapped_node_id(99), NOT_FOUND);
        assert_eq!(id_map.to_internal(99), None);
        assert_eq!(id_map.to_mapped_node_id(-5), NOT_FOUND);
    }

    #[test]
    fn paged_mapping_handles_sparse_domains() {
        let mut builder = ForwardMappingBuilder::paged();
        builder.set(3, 0);
        builder.set(5_000_000, 1);
        let id_map = IdMap::new(vec![3, 5_000_000], builder.build(), HashMap::new());

        assert_eq!(id_map.to_internal(3), Some(0));
        assert_eq!(id_map.to_internal(5_000_000), Some(1));
        assert_eq!(id_map.to_internal(4), None);
        assert_eq!(id_map.highest_original_id(), 5_000_000);
    }

    #[test]
    fn high_limit_mapping() {
        let mut builder = ForwardMappingBuilder::high_limit();
        builder.set(i64::MAX - 1, 0);
        let id_map = IdMap::new(vec![i64::MAX - 1], builder.build(), HashMap::new());

        assert_eq!(id_map.to_internal(i64::MAX - 1), Some(0));
        assert_eq!(id_map.to_internal(0), None);
    }

    #[test]
    fn label_bitmaps_answer_membership() {
        let person = NodeLabel::of("Person");
        let mut bitmap = BitSet::new();
        bitmap.set(0);
        bitmap.set(2);
        let mut bitmaps = HashMap::new();
        bitmaps.insert(person.clone(), bitmap);

        let mut builder = ForwardMappingBuilder::dense(3);
        for internal in 0..3u64 {
            builder.set(internal as i64, internal);
        }
        let id_map = IdMap::new(vec![0, 1, 2], builder.build(), bitmaps);

        assert!(id_map.has_label(0, &person));
        assert!(!id_map.has_label(1, &person));
        assert_eq!(id_map.node_count_for_label(&person), 2);
        let members: Vec<_> = id_map.nodes_for_label(&person).collect();
        assert_eq!(members, vec![0, 2]);
    }
}
