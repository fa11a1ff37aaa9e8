use crate::types::schema::{
    Direction, RelationshipPropertySchema, RelationshipType, SchemaError, SchemaResult,
};
use crate::types::ValueType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// Schema entry for a relationship type with a fixed direction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RelationshipSchemaEntry {
    identifier: RelationshipType,
    direction: Direction,
    properties: HashMap<String, RelationshipPropertySchema>,
}

impl RelationshipSchemaEntry {
    pub fn new(
        identifier: RelationshipType,
        direction: Direction,
        properties: HashMap<String, RelationshipPropertySchema>,
    ) -> Self {
        Self {
            identifier,
            direction,
            properties,
        }
    }

    pub fn empty(identifier: RelationshipType, direction: Direction) -> Self {
        Self::new(identifier, direction, HashMap::new())
    }

    pub fn identifier(&self) -> &RelationshipType {
        &self.identifier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn is_undirected(&self) -> bool {
        self.direction.is_undirected()
    }

    pub fn properties(&self) -> &HashMap<String, RelationshipPropertySchema> {
        &self.properties
    }

    /// Creates a union of this entry with another entry.
    ///
    /// Entries for the same type must agree on directionality.
    pub fn union(&self, other: &RelationshipSchemaEntry) -> SchemaResult<RelationshipSchemaEntry> {
        if self.identifier != other.identifier {
            return Err(SchemaError::IdentifierMismatch {
                left: self.identifier.name().to_string(),
                right: other.identifier.name().to_string(),
            });
        }
        if self.direction != other.direction {
            return Err(SchemaError::DirectionalityConflict {
                relationship_type: self.identifier.name().to_string(),
            });
        }

        let union_properties = union_properties(&self.properties, &other.properties)?;
        Ok(RelationshipSchemaEntry::new(
            self.identifier.clone(),
            self.direction,
            union_properties,
        ))
    }
}

/// Mutable relationship schema entry.
#[derive(Clone, Debug)]
pub struct MutableRelationshipSchemaEntry {
    identifier: RelationshipType,
    direction: Direction,
    properties: HashMap<String, RelationshipPropertySchema>,
}

impl MutableRelationshipSchemaEntry {
    pub fn new(identifier: RelationshipType, direction: Direction) -> Self {
        Self {
            identifier,
            direction,
            properties: HashMap::new(),
        }
    }

    pub fn from_entry(entry: &RelationshipSchemaEntry) -> Self {
        Self {
            identifier: entry.identifier.clone(),
            direction: entry.direction,
            properties: entry.properties.clone(),
        }
    }

    pub fn identifier(&self) -> &RelationshipType {
        &self.identifier
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn properties(&self) -> &HashMap<String, RelationshipPropertySchema> {
        &self.properties
    }

    pub fn add_property(&mut self, key: impl Into<String>, value_type: ValueType) -> &mut Self {
        let key = key.into();
        self.properties
            .insert(key.clone(), RelationshipPropertySchema::of(key, value_type));
        self
    }

    pub fn add_property_schema(&mut self, schema: RelationshipPropertySchema) -> &mut Self {
        use crate::types::schema::PropertySchemaTrait;
        self.properties.insert(schema.key().to_string(), schema);
        self
    }

    pub fn build(self) -> RelationshipSchemaEntry {
        RelationshipSchemaEntry::new(self.identifier, self.direction, self.properties)
    }
}

/// Schema for relationships in a graph, keyed by relationship type.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RelationshipSchema {
    entries: HashMap<RelationshipType, RelationshipSchemaEntry>,
}

impl RelationshipSchema {
    pub fn new(entries: HashMap<RelationshipType, RelationshipSchemaEntry>) -> Self {
        Self { entries }
    }

    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &RelationshipSchemaEntry> {
        self.entries.values()
    }

    pub fn get(&self, relationship_type: &RelationshipType) -> Option<&RelationshipSchemaEntry> {
        self.entries.get(relationship_type)
    }

    pub fn contains(&self, relationship_type: &RelationshipType) -> bool {
        self.entries.contains_key(relationship_type)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn available_types(&self) -> HashSet<RelationshipType> {
        self.entries.keys().cloned().collect()
    }

    pub fn union(&self, other: &RelationshipSchema) -> SchemaResult<RelationshipSchema> {
        let mut result = self.entries.clone();

        for (relationship_type, other_entry) in &other.entries {
            if let Some(existing) = result.get(relationship_type) {
                let merged = existing.union(other_entry)?;
                result.insert(relationship_type.clone(), merged);
            } else {
                result.insert(relationship_type.clone(), other_entry.clone());
            }
        }

        Ok(RelationshipSchema::new(result))
    }
}

/// Mutable relationship schema accumulated during construction.
#[derive(Clone, Debug, Default)]
pub struct MutableRelationshipSchema {
    entries: HashMap<RelationshipType, MutableRelationshipSchemaEntry>,
}

impl MutableRelationshipSchema {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, relationship_type: &RelationshipType) -> Option<&MutableRelationshipSchemaEntry> {
        self.entries.get(relationship_type)
    }

    pub fn get_or_create(
        &mut self,
        relationship_type: RelationshipType,
        direction: Direction,
    ) -> &mut MutableRelationshipSchemaEntry {
        self.entries
            .entry(relationship_type.clone())
            .or_insert_with(|| MutableRelationshipSchemaEntry::new(relationship_type, direction))
    }

    pub fn add_entry(&mut self, entry: RelationshipSchemaEntry) -> &mut Self {
        self.entries.insert(
            entry.identifier().clone(),
            MutableRelationshipSchemaEntry::from_entry(&entry),
        );
        self
    }

    pub fn build(self) -> RelationshipSchema {
        let entries = self
            .entries
            .into_iter()
            .map(|(relationship_type, entry)| (relationship_type, entry.build()))
            .collect();
        RelationshipSchema::new(entries)
    }
}

fn union_properties(
    left: &HashMap<String, RelationshipPropertySchema>,
    right: &HashMap<String, RelationshipPropertySchema>,
) -> SchemaResult<HashMap<String, RelationshipPropertySchema>> {
    use crate::types::schema::PropertySchemaTrait;

    let mut result = left.clone();

    for (key, right_schema) in right {
        if let Some(left_schema) = result.get(key) {
            if left_schema.value_type() != right_schema.value_type() {
                return Err(SchemaError::PropertyTypeConflict {
                    key: key.clone(),
                    left: left_schema.value_type(),
                    right: right_schema.value_type(),
                });
            }
        } else {
            result.insert(key.clone(), right_schema.clone());
        }
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_union_merges_properties() {
        let knows = RelationshipType::of("KNOWS");

        let mut left = MutableRelationshipSchemaEntry::new(knows.clone(), Direction::Directed);
        left.add_property("since", ValueType::Long);

        let mut right = MutableRelationshipSchemaEntry::new(knows.clone(), Direction::Directed);
        right.add_property("weight", ValueType::Double);

        let merged = left.build().union(&right.build()).unwrap();
        assert_eq!(merged.properties().len(), 2);
        assert_eq!(merged.direction(), Direction::Directed);
    }

    #[test]
    fn entry_union_rejects_direction_conflict() {
        let knows = RelationshipType::of("KNOWS");

        let left = MutableRelationshipSchemaEntry::new(knows.clone(), Direction::Directed).build();
        let right = MutableRelationshipSchemaEntry::new(knows, Direction::Undirected).build();

        assert!(matches!(
            left.union(&right),
            Err(SchemaError::DirectionalityConflict { .. })
        ));
    }

    #[test]
    fn schema_union_collects_types() {
        let mut left = MutableRelationshipSchema::empty();
        left.get_or_create(RelationshipType::of("KNOWS"), Direction::Directed);

        let mut right = MutableRelationshipSchema::empty();
        right.get_or_create(RelationshipType::of("FRIEND"), Direction::Undirected);

        let merged = left.build().union(&right.build()).unwrap();
        assert_eq!(merged.available_types().len(), 2);
    }
}
