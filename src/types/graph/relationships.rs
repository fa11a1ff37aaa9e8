//! Assembled relationships of a single type.

use crate::types::graph::RelationshipTopology;
use crate::types::properties::RelationshipPropertyValues;
use crate::types::schema::RelationshipSchemaEntry;
use std::collections::HashMap;
use std::sync::Arc;

/// Everything the build produced for one relationship type: the forward
/// topology, the optional inverse topology, and property columns aligned
/// with each.
#[derive(Clone, Debug)]
pub struct SingleTypeRelationships {
    topology: Arc<RelationshipTopology>,
    inverse_topology: Option<Arc<RelationshipTopology>>,
    properties: HashMap<String, Arc<RelationshipPropertyValues>>,
    inverse_properties: HashMap<String, Arc<RelationshipPropertyValues>>,
    schema_entry: RelationshipSchemaEntry,
}

impl SingleTypeRelationships {
    pub fn new(
        topology: RelationshipTopology,
        inverse_topology: Option<RelationshipTopology>,
        properties: HashMap<String, Arc<RelationshipPropertyValues>>,
        inverse_properties: HashMap<String, Arc<RelationshipPropertyValues>>,
        schema_entry: RelationshipSchemaEntry,
    ) -> Self {
        Self {
            topology: Arc::new(topology),
            inverse_topology: inverse_topology.map(Arc::new),
            properties,
            inverse_properties,
            schema_entry,
        }
    }

    pub fn topology(&self) -> &RelationshipTopology {
        &self.topology
    }

    pub fn inverse_topology(&self) -> Option<&RelationshipTopology> {
        self.inverse_topology.as_deref()
    }

    pub fn properties(&self) -> &HashMap<String, Arc<RelationshipPropertyValues>> {
        &self.properties
    }

    pub fn inverse_properties(&self) -> &HashMap<String, Arc<RelationshipPropertyValues>> {
        &self.inverse_properties
    }

    pub fn property(&self, key: &str) -> Option<&RelationshipPropertyValues> {
        self.properties.get(key).map(Arc::as_ref)
    }

    pub fn schema_entry(&self) -> &RelationshipSchemaEntry {
        &self.schema_entry
    }

    pub fn element_count(&self) -> usize {
        self.topology.element_count()
    }
}
