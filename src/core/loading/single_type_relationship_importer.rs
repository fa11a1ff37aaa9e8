//! Shared relationship importer for one topology of one type.
//!
//! Workers drain resolved batches into adjacency shards; a shard covers a
//! range of source pages, so all edges of a given source land in the same
//! shard and per-source arrival order is preserved. Aggregation of parallel
//! edges happens once, when the shards are folded into the compressed
//! topology.

use crate::types::graph::RelationshipTopology;
use crate::types::schema::Aggregation;
use parking_lot::Mutex;
use std::collections::HashMap;

/// Sources per adjacency page; shards are addressed by page modulo.
const SOURCE_PAGE_SHIFT: usize = 12;

struct BufferedEdge {
    target: u64,
    properties: Box<[f64]>,
}

#[derive(Default)]
struct AdjacencyShard {
    adjacency: HashMap<u64, Vec<BufferedEdge>>,
}

/// One resolved relationship handed over by a worker flush.
pub struct ResolvedEdge {
    pub source: u64,
    pub target: u64,
    pub properties: Box<[f64]>,
}

/// Topology plus relationship-aligned property columns, pre-CSR.
pub struct ImportedTopology {
    pub topology: RelationshipTopology,
    /// One column per configured property, aligned with the topology.
    pub property_columns: Vec<Vec<f64>>,
}

pub struct SingleTypeRelationshipImporter {
    aggregations: Vec<Aggregation>,
    no_property_aggregation: Aggregation,
    shards: Vec<Mutex<AdjacencyShard>>,
}

impl SingleTypeRelationshipImporter {
    pub fn new(
        aggregations: Vec<Aggregation>,
        no_property_aggregation: Aggregation,
        shard_count: usize,
    ) -> Self {
        let shard_count = shard_count.max(1);
        let mut shards = Vec::with_capacity(shard_count);
        shards.resize_with(shard_count, || Mutex::new(AdjacencyShard::default()));
        Self {
            aggregations: aggregations.into_iter().map(Aggregation::resolve).collect(),
            no_property_aggregation: Aggregation::resolve(no_property_aggregation),
            shards,
        }
    }

    pub fn property_count(&self) -> usize {
        self.aggregations.len()
    }

    fn reduces_parallel_edges(&self) -> bool {
        if self.aggregations.is_empty() {
            self.no_property_aggregation.reduces_parallel_edges()
        } else {
            self.aggregations
                .iter()
                .any(|agg| agg.reduces_parallel_edges())
        }
    }

    fn shard_index(&self, source: u64) -> usize {
        ((source >> SOURCE_PAGE_SHIFT) % self.shards.len() as u64) as usize
    }

    /// Drains one batch into the shards. Edges are grouped per shard first so
    /// each shard lock is taken at most once per batch.
    pub fn import_batch(&self, edges: Vec<ResolvedEdge>) {
        let mut grouped: Vec<Vec<ResolvedEdge>> = Vec::new();
        grouped.resize_with(self.shards.len(), Vec::new);
        for edge in edges {
            grouped[self.shard_index(edge.source)].push(edge);
        }

        for (shard_index, group) in grouped.into_iter().enumerate() {
            if group.is_empty() {
                continue;
            }
            let mut shard = self.shards[shard_index].lock();
            for edge in group {
                shard
                    .adjacency
                    .entry(edge.source)
                    .or_default()
                    .push(BufferedEdge {
                        target: edge.target,
                        properties: edge.properties,
                    });
            }
        }
    }

    /// Folds the shards into a compressed topology over `node_count` sources,
    /// applying the configured per-property aggregations to parallel edges.
    pub fn build(&self, node_count: usize) -> ImportedTopology {
        let mut adjacency: HashMap<u64, Vec<BufferedEdge>> = HashMap::new();
        for shard in &self.shards {
            let taken = std::mem::take(&mut shard.lock().adjacency);
            for (source, edges) in taken {
                adjacency.entry(source).or_default().extend(edges);
            }
        }

        let property_count = self.aggregations.len();
        let reduces = self.reduces_parallel_edges();

        let mut offsets = Vec::with_capacity(node_count + 1);
        offsets.push(0usize);
        let mut targets: Vec<u64> = Vec::new();
        let mut property_columns: Vec<Vec<f64>> = vec![Vec::new(); property_count];
        let mut is_multi_graph = false;

        for source in 0..node_count as u64 {
            match adjacency.remove(&source) {
                None => {}
                Some(edges) if !reduces => {
                    let mut seen = std::collections::HashSet::with_capacity(edges.len());
                    for edge in edges {
                        if !seen.insert(edge.target) {
                            is_multi_graph = true;
                        }
                        targets.push(edge.target);
                        for (index, column) in property_columns.iter_mut().enumerate() {
                            column.push(edge.properties[index]);
                        }
                    }
                }
                Some(edges) => {
                    self.reduce_into(edges, &mut targets, &mut property_columns);
                }
            }
            offsets.push(targets.len());
        }

        ImportedTopology {
            topology: RelationshipTopology::new(offsets, targets, is_multi_graph),
            property_columns,
        }
    }

    /// Folds parallel edges of one source. Distinct targets keep their
    /// first-arrival order.
    fn reduce_into(
        &self,
        edges: Vec<BufferedEdge>,
        targets: &mut Vec<u64>,
        property_columns: &mut [Vec<f64>],
    ) {
        struct Folded {
            target: u64,
            values: Vec<f64>,
            count: u64,
        }

        let mut index_of: HashMap<u64, usize> = HashMap::new();
        let mut folded: Vec<Folded> = Vec::new();

        for edge in edges {
            match index_of.get(&edge.target) {
                None => {
                    index_of.insert(edge.target, folded.len());
                    folded.push(Folded {
                        target: edge.target,
                        values: edge.properties.to_vec(),
                        count: 1,
                    });
                }
                Some(&slot) => {
                    let entry = &mut folded[slot];
                    entry.count += 1;
                    for (index, aggregation) in self.aggregations.iter().enumerate() {
                        let next = edge.properties[index];
                        let current = &mut entry.values[index];
                        match aggregation {
                            Aggregation::Sum => *current += next,
                            Aggregation::Min => *current = current.min(next),
                            Aggregation::Max => *current = current.max(next),
                            // First value wins; later arrivals are dropped.
                            Aggregation::Single => {}
                            // Resolved to a count below.
                            Aggregation::Count => {}
                            Aggregation::None | Aggregation::Default => {}
                        }
                    }
                }
            }
        }

        for entry in folded {
            targets.push(entry.target);
            for (index, aggregation) in self.aggregations.iter().enumerate() {
                let value = match aggregation {
                    Aggregation::Count => entry.count as f64,
                    _ => entry.values[index],
                };
                property_columns[index].push(value);
            }
        }
    }
}
