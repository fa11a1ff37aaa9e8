//! Bounded per-worker batch buffer for relationship inserts.

/// Property-reference value for relationships without properties.
pub const NO_PROPERTY_REF: i64 = -1;

/// Records `(source, target, property ref)` triples in original id space.
///
/// The property reference is overloaded: for zero properties it is
/// [`NO_PROPERTY_REF`], for a single property it carries the IEEE-754 bit
/// pattern of the value inline, and for two or more properties it is the
/// local edge id handed out by the worker's buffered property reader.
pub struct RelationshipsBatchBuffer {
    capacity: usize,
    sources: Vec<i64>,
    targets: Vec<i64>,
    property_refs: Vec<i64>,
}

impl RelationshipsBatchBuffer {
    pub const DEFAULT_CAPACITY: usize = 8192;

    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            sources: Vec::with_capacity(capacity),
            targets: Vec::with_capacity(capacity),
            property_refs: Vec::with_capacity(capacity),
        }
    }

    pub fn add(&mut self, source: i64, target: i64, property_ref: i64) {
        debug_assert!(!self.is_full(), "buffer must be drained before adding");
        self.sources.push(source);
        self.targets.push(target);
        self.property_refs.push(property_ref);
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.sources.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Takes the buffered batch, leaving the buffer empty.
    pub fn drain(&mut self) -> (Vec<i64>, Vec<i64>, Vec<i64>) {
        (
            std::mem::take(&mut self.sources),
            std::mem::take(&mut self.targets),
            std::mem::take(&mut self.property_refs),
        )
    }
}
