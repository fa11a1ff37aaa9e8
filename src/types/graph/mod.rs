pub mod id_map;
pub mod relationships;
pub mod topology;

pub use id_map::{IdMap, MappedNodeId, OriginalNodeId, NOT_FOUND};
pub use relationships::SingleTypeRelationships;
pub use topology::RelationshipTopology;
