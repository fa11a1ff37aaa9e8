//! Bounded per-worker batch buffer for node inserts.

use crate::core::loading::token_table::LabelToken;
use std::sync::Arc;

/// Property-reference value for nodes without properties.
pub const NO_PROPERTY_REF: i64 = -1;

/// Records `(original id, property ref, label tokens)` triples until the
/// buffer is full and the owning worker drains it into the shared importer.
///
/// Label token lists are shared `Arc`s; the per-worker label cache hands out
/// the same list for every node with the same label combination.
pub struct NodesBatchBuffer {
    capacity: usize,
    original_ids: Vec<i64>,
    property_refs: Vec<i64>,
    label_tokens: Vec<Arc<Vec<LabelToken>>>,
}

impl NodesBatchBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            original_ids: Vec::with_capacity(capacity),
            property_refs: Vec::with_capacity(capacity),
            label_tokens: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, original_id: i64, property_ref: i64, tokens: Arc<Vec<LabelToken>>) {
        debug_assert!(!self.is_full(), "buffer must be drained before adding");
        self.original_ids.push(original_id);
        self.property_refs.push(property_ref);
        self.label_tokens.push(tokens);
    }

    pub fn len(&self) -> usize {
        self.original_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original_ids.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.original_ids.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes the buffered batch, leaving the buffer empty with its capacity
    /// retained.
    #[allow(clippy::type_complexity)]
    pub fn drain(&mut self) -> (Vec<i64>, Vec<i64>, Vec<Arc<Vec<LabelToken>>>) {
        (
            std::mem::take(&mut self.original_ids),
            std::mem::take(&mut self.property_refs),
            std::mem::take(&mut self.label_tokens),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_to_exact_capacity() {
        let mut buffer = NodesBatchBuffer::new(3);
        let tokens = Arc::new(vec![0]);

        for id in 0..3 {
            assert!(!buffer.is_full());
            buffer.add(id, NO_PROPERTY_REF, Arc::clone(&tokens));
        }
        assert!(buffer.is_full());
        assert_eq!(buffer.len(), 3);
    }

    #[test]
    fn drain_empties_and_preserves_order() {
        let mut buffer = NodesBatchBuffer::new(4);
        let tokens = Arc::new(vec![]);
        buffer.add(5, NO_PROPERTY_REF, Arc::clone(&tokens));
        buffer.add(2, 0, Arc::clone(&tokens));

        let (ids, refs, _) = buffer.drain();
        assert_eq!(ids, vec![5, 2]);
        assert_eq!(refs, vec![NO_PROPERTY_REF, 0]);
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }
}
