//! graph_loading - concurrent construction of in-memory property graphs.
//!
//! The crate assembles nodes, relationships, and graph-level properties from
//! streaming record input into an immutable, query-ready [`GraphStore`].
//! Construction is parallel: workers feed batch buffers that drain into
//! shared importers under a documented synchronization discipline.
//!
//! [`GraphStore`]: types::graph_store::GraphStore

pub mod collections;
pub mod concurrency;
pub mod core;
pub mod importer;
pub mod input;
pub mod types;
pub mod values;

pub use importer::{GraphStoreImporter, ImportConfig, ImportResult};
pub use types::graph_store::GraphStore;
