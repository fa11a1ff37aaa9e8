// Construction facades: thread-safe builders that hide the batch buffers,
// importers, and provider machinery behind single-call insert APIs.

pub mod graph_property_builder;
pub mod local_provider;
pub mod nodes_builder;
pub mod relationships_builder;

pub use graph_property_builder::GraphPropertyBuilder;
pub use local_provider::{BuilderHandle, LocalBuilder, LocalBuilderProvider, DEFAULT_POOL_TIMEOUT};
pub use nodes_builder::{Nodes, NodesBuilder, NodesBuilderConfig};
pub use relationships_builder::{PropertyConfig, RelationshipsBuilder, RelationshipsBuilderConfig};
