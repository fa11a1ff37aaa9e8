use crate::types::schema::{
    NodeSchema, PropertySchema, RelationshipSchema, SchemaResult,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Complete schema of a graph store: node labels, relationship types, and
/// graph-level properties.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GraphSchema {
    node_schema: NodeSchema,
    relationship_schema: RelationshipSchema,
    graph_properties: HashMap<String, PropertySchema>,
}

impl GraphSchema {
    pub fn new(
        node_schema: NodeSchema,
        relationship_schema: RelationshipSchema,
        graph_properties: HashMap<String, PropertySchema>,
    ) -> Self {
        Self {
            node_schema,
            relationship_schema,
            graph_properties,
        }
    }

    pub fn empty() -> Self {
        Self {
            node_schema: NodeSchema::empty(),
            relationship_schema: RelationshipSchema::empty(),
            graph_properties: HashMap::new(),
        }
    }

    pub fn node_schema(&self) -> &NodeSchema {
        &self.node_schema
    }

    pub fn relationship_schema(&self) -> &RelationshipSchema {
        &self.relationship_schema
    }

    pub fn graph_properties(&self) -> &HashMap<String, PropertySchema> {
        &self.graph_properties
    }

    pub fn union(&self, other: &GraphSchema) -> SchemaResult<GraphSchema> {
        let node_schema = self.node_schema.union(&other.node_schema)?;
        let relationship_schema = self.relationship_schema.union(&other.relationship_schema)?;

        let mut graph_properties = self.graph_properties.clone();
        for (key, schema) in &other.graph_properties {
            graph_properties
                .entry(key.clone())
                .or_insert_with(|| schema.clone());
        }

        Ok(GraphSchema::new(
            node_schema,
            relationship_schema,
            graph_properties,
        ))
    }
}

/// Mutable assembly point for a graph schema during construction.
#[derive(Clone, Debug, Default)]
pub struct MutableGraphSchema {
    pub node_schema: NodeSchema,
    pub relationship_schema: RelationshipSchema,
    pub graph_properties: HashMap<String, PropertySchema>,
}

impl MutableGraphSchema {
    pub fn empty() -> Self {
        Self {
            node_schema: NodeSchema::empty(),
            relationship_schema: RelationshipSchema::empty(),
            graph_properties: HashMap::new(),
        }
    }

    pub fn build(self) -> GraphSchema {
        GraphSchema::new(
            self.node_schema,
            self.relationship_schema,
            self.graph_properties,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::{Direction, MutableNodeSchema, MutableRelationshipSchema, NodeLabel, RelationshipType};
    use crate::types::ValueType;

    #[test]
    fn empty_schema_has_no_entries() {
        let schema = GraphSchema::empty();
        assert!(schema.node_schema().is_empty());
        assert!(schema.relationship_schema().is_empty());
        assert!(schema.graph_properties().is_empty());
    }

    #[test]
    fn union_combines_all_parts() {
        let mut nodes = MutableNodeSchema::empty();
        nodes.add_property(NodeLabel::of("Person"), "name", ValueType::String);
        let left = GraphSchema::new(nodes.build(), RelationshipSchema::empty(), HashMap::new());

        let mut rels = MutableRelationshipSchema::empty();
        rels.get_or_create(RelationshipType::of("KNOWS"), Direction::Directed);
        let mut graph_props = HashMap::new();
        graph_props.insert(
            "revision".to_string(),
            PropertySchema::of("revision", ValueType::Long),
        );
        let right = GraphSchema::new(NodeSchema::empty(), rels.build(), graph_props);

        let merged = left.union(&right).unwrap();
        assert!(merged.node_schema().contains(&NodeLabel::of("Person")));
        assert!(merged
            .relationship_schema()
            .contains(&RelationshipType::of("KNOWS")));
        assert!(merged.graph_properties().contains_key("revision"));
    }
}
