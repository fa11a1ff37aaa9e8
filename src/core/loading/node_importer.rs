//! Shared node importer: assigns internal ids and tracks label membership.

use crate::collections::BitSet;
use crate::core::loading::token_table::{LabelToken, TokenToNodeLabels, ANY_LABEL_TOKEN};
use crate::types::graph::id_map::{ForwardMappingBuilder, IdMap};
use crate::types::schema::NodeLabel;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

/// Backing layout for the original-to-internal id mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdMapBacking {
    /// Single array indexed by original id. Best when ids are dense in
    /// `[0, max_original_id]`.
    Dense,
    /// Two-level page table. Handles sparse and large id domains.
    Paged,
    /// Hash-backed mapping for arbitrary id domains.
    HighLimit,
}

impl IdMapBacking {
    /// Picks a layout when none was configured: dense when the id domain is
    /// bounded by a hint, paged otherwise.
    pub fn for_hint(max_original_id: Option<i64>) -> Self {
        match max_original_id {
            Some(_) => IdMapBacking::Dense,
            None => IdMapBacking::Paged,
        }
    }
}

struct ImporterState {
    internal_to_original: Vec<i64>,
    forward: ForwardMappingBuilder,
    label_bitmaps: HashMap<LabelToken, BitSet>,
}

/// Single point where batches turn into internal ids.
///
/// Internal ids are contiguous per batch and assigned in the order batches
/// take the importer lock; cross-worker arrival order is unspecified.
pub struct NodeImporter {
    state: Mutex<ImporterState>,
}

impl NodeImporter {
    pub fn new(backing: IdMapBacking, max_original_id: Option<i64>) -> Self {
        let forward = match backing {
            IdMapBacking::Dense => {
                let capacity = max_original_id.map(|max| max as usize + 1).unwrap_or(0);
                ForwardMappingBuilder::dense(capacity)
            }
            IdMapBacking::Paged => ForwardMappingBuilder::paged(),
            IdMapBacking::HighLimit => ForwardMappingBuilder::high_limit(),
        };
        Self {
            state: Mutex::new(ImporterState {
                internal_to_original: Vec::new(),
                forward,
                label_bitmaps: HashMap::new(),
            }),
        }
    }

    /// Imports one batch: writes the original-to-internal mapping and unions
    /// the per-token membership bitmaps. Returns the first internal id of the
    /// batch's contiguous range.
    pub fn import_nodes(
        &self,
        original_ids: &[i64],
        label_tokens: &[Arc<Vec<LabelToken>>],
    ) -> u64 {
        debug_assert_eq!(original_ids.len(), label_tokens.len());

        let mut state = self.state.lock();
        let start_id = state.internal_to_original.len() as u64;

        for (offset, (&original, tokens)) in
            original_ids.iter().zip(label_tokens.iter()).enumerate()
        {
            let internal = start_id + offset as u64;
            state.internal_to_original.push(original);
            state.forward.set(original, internal);
            for &token in tokens.iter() {
                state
                    .label_bitmaps
                    .entry(token)
                    .or_default()
                    .set(internal as usize);
            }
        }

        start_id
    }

    pub fn node_count(&self) -> usize {
        self.state.lock().internal_to_original.len()
    }

    /// Seals the importer into an [`IdMap`], resolving token bitmaps into
    /// per-label bitmaps through the reverse token table.
    pub fn finalize(&self, token_table: &TokenToNodeLabels) -> IdMap {
        let state = {
            let mut guard = self.state.lock();
            ImporterState {
                internal_to_original: std::mem::take(&mut guard.internal_to_original),
                forward: std::mem::replace(
                    &mut guard.forward,
                    ForwardMappingBuilder::dense(0),
                ),
                label_bitmaps: std::mem::take(&mut guard.label_bitmaps),
            }
        };

        let mut by_label: HashMap<NodeLabel, BitSet> = HashMap::new();
        for (token, bitmap) in state.label_bitmaps {
            let labels = if token == ANY_LABEL_TOKEN {
                vec![NodeLabel::all_nodes()]
            } else {
                token_table.identifiers_of(token)
            };
            for label in labels {
                by_label.entry(label).or_default().union_with(&bitmap);
            }
        }

        IdMap::new(state.internal_to_original, state.forward.build(), by_label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn batches_receive_contiguous_ranges() {
        let importer = NodeImporter::new(IdMapBacking::Dense, Some(10));
        let no_labels = Arc::new(Vec::new());

        let first = importer.import_nodes(&[5, 3], &[Arc::clone(&no_labels), Arc::clone(&no_labels)]);
        let second = importer.import_nodes(&[7], &[no_labels]);

        assert_eq!(first, 0);
        assert_eq!(second, 2);
        assert_eq!(importer.node_count(), 3);
    }

    #[test]
    fn finalize_round_trips_ids() {
        let importer = NodeImporter::new(IdMapBacking::Paged, None);
        let tokens = Arc::new(vec![0]);
        importer.import_nodes(&[42, 7], &[Arc::clone(&tokens), tokens]);

        let table = TokenToNodeLabels::lazy();
        let person = NodeLabel::of("Person");
        assert_eq!(table.token_of(&person).unwrap(), 0);

        let id_map = importer.finalize(&table);
        assert_eq!(id_map.node_count(), 2);
        assert_eq!(id_map.to_internal(42), Some(0));
        assert_eq!(id_map.to_internal(7), Some(1));
        assert_eq!(id_map.to_original_node_id(1), 7);
        assert_eq!(id_map.node_count_for_label(&person), 2);
    }

    #[test]
    fn any_token_maps_to_all_nodes_label() {
        let importer = NodeImporter::new(IdMapBacking::Dense, Some(1));
        importer.import_nodes(&[0], &[Arc::new(vec![ANY_LABEL_TOKEN])]);

        let id_map = importer.finalize(&TokenToNodeLabels::lazy());
        assert_eq!(id_map.node_count_for_label(&NodeLabel::all_nodes()), 1);
    }
}
