//! Compressed adjacency storage for one relationship type.

/// Per-source neighbor lists in compressed sparse row layout.
///
/// `offsets` has one entry per source node plus a trailing sentinel, so the
/// targets of node `s` live in `targets[offsets[s]..offsets[s + 1]]`.
/// Immutable once built.
#[derive(Clone, Debug)]
pub struct RelationshipTopology {
    offsets: Vec<usize>,
    targets: Vec<u64>,
    is_multi_graph: bool,
}

impl RelationshipTopology {
    pub fn new(offsets: Vec<usize>, targets: Vec<u64>, is_multi_graph: bool) -> Self {
        debug_assert!(!offsets.is_empty(), "offsets must contain the sentinel");
        debug_assert_eq!(*offsets.last().unwrap(), targets.len());
        Self {
            offsets,
            targets,
            is_multi_graph,
        }
    }

    /// Topology over `node_count` sources without any relationships.
    pub fn empty(node_count: usize) -> Self {
        Self {
            offsets: vec![0; node_count + 1],
            targets: Vec::new(),
            is_multi_graph: false,
        }
    }

    /// Total number of relationships stored.
    pub fn element_count(&self) -> usize {
        self.targets.len()
    }

    /// Number of source slots.
    pub fn node_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn degree(&self, source: u64) -> usize {
        let source = source as usize;
        self.offsets[source + 1] - self.offsets[source]
    }

    /// Targets of `source` in drain order.
    pub fn neighbors(&self, source: u64) -> &[u64] {
        let source = source as usize;
        &self.targets[self.offsets[source]..self.offsets[source + 1]]
    }

    /// Index into the relationship-aligned property columns for the `n`-th
    /// neighbor of `source`.
    pub fn relationship_index(&self, source: u64, n: usize) -> usize {
        self.offsets[source as usize] + n
    }

    /// Whether parallel relationships may be present.
    pub fn is_multi_graph(&self) -> bool {
        self.is_multi_graph
    }

    /// Iterates `(source, target)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, u64)> + '_ {
        (0..self.node_count()).flat_map(move |source| {
            self.neighbors(source as u64)
                .iter()
                .map(move |&target| (source as u64, target))
        })
    }
}
