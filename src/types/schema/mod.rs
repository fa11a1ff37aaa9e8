// Schema definitions for graph elements (nodes, relationships, graphs).
//
// Schemas are accumulated during construction (lazy mode) or validated
// against a fixed schema supplied by the input boundary.

pub mod direction;
pub mod element_identifier;
pub mod graph_schema;
pub mod node_schema;
pub mod property_schema;
pub mod relationship_schema;

pub use direction::{Direction, Orientation};
pub use element_identifier::{ElementIdentifier, NodeLabel, RelationshipType};
pub use graph_schema::{GraphSchema, MutableGraphSchema};
pub use node_schema::{MutableNodeSchema, MutableNodeSchemaEntry, NodeSchema, NodeSchemaEntry};
pub use property_schema::{
    Aggregation, PropertySchema, PropertySchemaTrait, RelationshipPropertySchema,
};
pub use relationship_schema::{
    MutableRelationshipSchema, MutableRelationshipSchemaEntry, RelationshipSchema,
    RelationshipSchemaEntry,
};

use crate::types::ValueType;

/// Error type for schema operations.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("Property '{key}' has conflicting value types: {left:?} vs {right:?}")]
    PropertyTypeConflict {
        key: String,
        left: ValueType,
        right: ValueType,
    },

    #[error("Cannot union entries with different identifiers: {left} and {right}")]
    IdentifierMismatch { left: String, right: String },

    #[error("Conflicting directionality for relationship type: {relationship_type}")]
    DirectionalityConflict { relationship_type: String },

    #[error("Unknown node label: '{label}'")]
    UnknownLabel { label: String },

    #[error("Unknown relationship type: '{relationship_type}'")]
    UnknownRelationshipType { relationship_type: String },

    #[error("Unknown property key: '{key}' for element '{element}'")]
    UnknownProperty { key: String, element: String },

    #[error("Properties declared in the schema were never observed: {keys:?}")]
    MissingProperties { keys: Vec<String> },

    #[error("Value for property '{key}' has type {actual:?}, column expects {expected:?}")]
    IncompatibleValueType {
        key: String,
        expected: ValueType,
        actual: ValueType,
    },

    #[error("Unrecognized value type token: '{token}'")]
    InvalidValueTypeToken { token: String },

    #[error("Invalid operation: {message}")]
    InvalidOperation { message: String },
}

pub type SchemaResult<T> = Result<T, SchemaError>;
