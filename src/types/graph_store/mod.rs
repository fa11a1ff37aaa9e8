//! The immutable, query-ready result of a build.

use crate::types::graph::{IdMap, RelationshipTopology, SingleTypeRelationships};
use crate::types::properties::{GraphPropertyValues, NodePropertyValues};
use crate::types::schema::{GraphSchema, NodeLabel, RelationshipType};
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// In-memory property graph assembled by the construction pipelines.
///
/// All components are frozen: the schema, the id map, the per-type
/// topologies, and every property column. Shared ownership is cheap since
/// the heavy parts sit behind `Arc`s.
#[derive(Clone, Debug)]
pub struct GraphStore {
    schema: GraphSchema,
    id_map: Arc<IdMap>,
    node_properties: HashMap<String, Arc<NodePropertyValues>>,
    node_properties_by_label: HashMap<NodeLabel, HashSet<String>>,
    relationships: HashMap<RelationshipType, SingleTypeRelationships>,
    graph_properties: HashMap<String, Arc<GraphPropertyValues>>,
    creation_time: DateTime<Utc>,
}

impl GraphStore {
    pub fn new(
        schema: GraphSchema,
        id_map: Arc<IdMap>,
        node_properties: HashMap<String, Arc<NodePropertyValues>>,
        node_properties_by_label: HashMap<NodeLabel, HashSet<String>>,
        relationships: HashMap<RelationshipType, SingleTypeRelationships>,
        graph_properties: HashMap<String, Arc<GraphPropertyValues>>,
    ) -> Self {
        Self {
            schema,
            id_map,
            node_properties,
            node_properties_by_label,
            relationships,
            graph_properties,
            creation_time: Utc::now(),
        }
    }

    /// A valid graph store over zero nodes and zero relationships.
    pub fn empty() -> Self {
        Self::new(
            GraphSchema::empty(),
            Arc::new(IdMap::empty()),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
            HashMap::new(),
        )
    }

    pub fn schema(&self) -> &GraphSchema {
        &self.schema
    }

    pub fn id_map(&self) -> &IdMap {
        &self.id_map
    }

    pub fn creation_time(&self) -> DateTime<Utc> {
        self.creation_time
    }

    pub fn node_count(&self) -> usize {
        self.id_map.node_count()
    }

    /// Total relationships across all types (forward topologies only).
    pub fn relationship_count(&self) -> usize {
        self.relationships
            .values()
            .map(|rels| rels.element_count())
            .sum()
    }

    pub fn relationship_count_for_type(&self, relationship_type: &RelationshipType) -> usize {
        self.relationships
            .get(relationship_type)
            .map(|rels| rels.element_count())
            .unwrap_or(0)
    }

    pub fn relationship_types(&self) -> HashSet<RelationshipType> {
        self.relationships.keys().cloned().collect()
    }

    pub fn relationships(
        &self,
        relationship_type: &RelationshipType,
    ) -> Option<&SingleTypeRelationships> {
        self.relationships.get(relationship_type)
    }

    pub fn topology(&self, relationship_type: &RelationshipType) -> Option<&RelationshipTopology> {
        self.relationships
            .get(relationship_type)
            .map(|rels| rels.topology())
    }

    pub fn inverse_topology(
        &self,
        relationship_type: &RelationshipType,
    ) -> Option<&RelationshipTopology> {
        self.relationships
            .get(relationship_type)
            .and_then(|rels| rels.inverse_topology())
    }

    pub fn node_property_keys(&self) -> HashSet<String> {
        self.node_properties.keys().cloned().collect()
    }

    pub fn node_property_keys_for_label(&self, label: &NodeLabel) -> HashSet<String> {
        self.node_properties_by_label
            .get(label)
            .cloned()
            .unwrap_or_default()
    }

    pub fn node_property_values(&self, key: &str) -> Option<&NodePropertyValues> {
        self.node_properties.get(key).map(Arc::as_ref)
    }

    pub fn graph_property_keys(&self) -> HashSet<String> {
        self.graph_properties.keys().cloned().collect()
    }

    pub fn graph_property_values(&self, key: &str) -> Option<&GraphPropertyValues> {
        self.graph_properties.get(key).map(Arc::as_ref)
    }
}
