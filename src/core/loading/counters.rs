//! Per-run import counters.
//!
//! Data warnings are never thrown; they accumulate here and surface on the
//! final result for diagnostics, also when the build fails.

use std::sync::atomic::{AtomicU64, Ordering};

/// Shared, lock-free counters updated by every worker.
#[derive(Debug, Default)]
pub struct ImportCounters {
    nodes_imported: AtomicU64,
    nodes_skipped_duplicate: AtomicU64,
    relationships_imported: AtomicU64,
    relationships_skipped_dangling: AtomicU64,
    graph_property_values: AtomicU64,
    warnings: AtomicU64,
}

impl ImportCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nodes_imported(&self, count: u64) {
        self.nodes_imported.fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_duplicate_node(&self) {
        self.nodes_skipped_duplicate
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_relationships_imported(&self, count: u64) {
        self.relationships_imported
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_dangling_relationship(&self) {
        self.relationships_skipped_dangling
            .fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_graph_property_values(&self, count: u64) {
        self.graph_property_values
            .fetch_add(count, Ordering::Relaxed);
    }

    pub fn increment_warning(&self) {
        self.warnings.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            nodes_imported: self.nodes_imported.load(Ordering::Relaxed),
            nodes_skipped_duplicate: self.nodes_skipped_duplicate.load(Ordering::Relaxed),
            relationships_imported: self.relationships_imported.load(Ordering::Relaxed),
            relationships_skipped_dangling: self
                .relationships_skipped_dangling
                .load(Ordering::Relaxed),
            graph_property_values: self.graph_property_values.load(Ordering::Relaxed),
            warnings: self.warnings.load(Ordering::Relaxed),
        }
    }
}

/// Plain copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CountersSnapshot {
    pub nodes_imported: u64,
    pub nodes_skipped_duplicate: u64,
    pub relationships_imported: u64,
    pub relationships_skipped_dangling: u64,
    pub graph_property_values: u64,
    pub warnings: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_reflects_increments() {
        let counters = ImportCounters::new();
        counters.add_nodes_imported(10);
        counters.increment_duplicate_node();
        counters.increment_dangling_relationship();
        counters.increment_warning();

        let snapshot = counters.snapshot();
        assert_eq!(snapshot.nodes_imported, 10);
        assert_eq!(snapshot.nodes_skipped_duplicate, 1);
        assert_eq!(snapshot.relationships_skipped_dangling, 1);
        assert_eq!(snapshot.warnings, 1);
    }
}
