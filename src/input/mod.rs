//! The boundary between file readers and the construction engine.
//!
//! Readers hand over pre-parsed records and (optionally) a pre-parsed
//! schema; the engine never touches files or CSV tokenization itself.

pub mod file_input;
pub mod header;
pub mod visitor;

pub use file_input::{
    FileInput, GraphPropertyRecord, InMemoryFileInput, InputChunks, NodeRecord,
    RelationshipRecord,
};
pub use header::{
    parse_graph_property_header, parse_node_header, parse_relationship_header, NodeHeader,
    PropertyColumn, RelationshipHeader,
};
pub use visitor::{ElementVisitor, GraphPropertyVisitor, NodeVisitor, RelationshipSink, RelationshipVisitor};
