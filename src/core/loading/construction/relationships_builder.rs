//! Thread-safe assembly of one relationship type.

use crate::concurrency::Concurrency;
use crate::core::loading::construction::local_provider::{
    LocalBuilder, LocalBuilderProvider, DEFAULT_POOL_TIMEOUT,
};
use crate::core::loading::counters::ImportCounters;
use crate::core::loading::error::{ConfigError, ImportError, LoadResult, StructuralError};
use crate::core::loading::property_reader::BufferedPropertyReader;
use crate::core::loading::relationships_batch_buffer::{
    RelationshipsBatchBuffer, NO_PROPERTY_REF,
};
use crate::core::loading::single_type_relationship_importer::{
    ResolvedEdge, SingleTypeRelationshipImporter,
};
use crate::types::graph::{IdMap, SingleTypeRelationships};
use crate::types::properties::RelationshipPropertyValues;
use crate::types::schema::{
    Aggregation, Orientation, RelationshipPropertySchema, RelationshipSchemaEntry,
    RelationshipType, SchemaError,
};
use crate::types::{DefaultValue, PropertyState, ValueType};
use crate::values::PropertyValues;
use std::collections::HashMap;
use std::sync::Arc;

/// Configuration for one relationship property column.
#[derive(Debug, Clone)]
pub struct PropertyConfig {
    pub key: String,
    pub aggregation: Aggregation,
    pub default_value: DefaultValue,
    pub state: PropertyState,
}

impl PropertyConfig {
    pub fn of(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            aggregation: Aggregation::None,
            default_value: DefaultValue::of(ValueType::Double),
            state: PropertyState::Persistent,
        }
    }

    pub fn with_aggregation(key: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            key: key.into(),
            aggregation,
            default_value: DefaultValue::of(ValueType::Double),
            state: PropertyState::Persistent,
        }
    }

    pub fn default_value(mut self, default_value: DefaultValue) -> Self {
        self.default_value = default_value;
        self
    }

    pub fn state(mut self, state: PropertyState) -> Self {
        self.state = state;
        self
    }
}

/// Configuration of a [`RelationshipsBuilder`].
#[derive(Clone, Debug)]
pub struct RelationshipsBuilderConfig {
    pub relationship_type: RelationshipType,
    pub orientation: Orientation,
    pub properties: Vec<PropertyConfig>,
    pub index_inverse: bool,
    pub skip_dangling_relationships: bool,
    pub concurrency: Concurrency,
    pub batch_size: usize,
    pub use_pooled_builder_provider: bool,
    /// Parallel-edge policy when no properties are configured.
    pub aggregation: Aggregation,
}

impl RelationshipsBuilderConfig {
    pub fn builder(relationship_type: RelationshipType) -> RelationshipsBuilderConfigBuilder {
        RelationshipsBuilderConfigBuilder {
            config: Self {
                relationship_type,
                orientation: Orientation::Natural,
                properties: Vec::new(),
                index_inverse: false,
                skip_dangling_relationships: true,
                concurrency: Concurrency::default(),
                batch_size: RelationshipsBatchBuffer::DEFAULT_CAPACITY,
                use_pooled_builder_provider: false,
                aggregation: Aggregation::None,
            },
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::BadBatchSize);
        }
        if !self.concurrency.is_valid() {
            return Err(ConfigError::BadConcurrency);
        }
        if self.index_inverse && self.orientation == Orientation::Undirected {
            return Err(ConfigError::InverseIndexWithUndirected {
                relationship_type: self.relationship_type.name().to_string(),
            });
        }

        let resolved: Vec<Aggregation> = self
            .properties
            .iter()
            .map(|p| Aggregation::resolve(p.aggregation))
            .collect();
        let any_none = resolved.iter().any(|a| !a.reduces_parallel_edges());
        let any_reducing = resolved.iter().any(|a| a.reduces_parallel_edges());
        if any_none && any_reducing {
            return Err(ConfigError::AggregationConflict {
                relationship_type: self.relationship_type.name().to_string(),
            });
        }
        Ok(())
    }
}

/// Fluent builder for [`RelationshipsBuilderConfig`].
pub struct RelationshipsBuilderConfigBuilder {
    config: RelationshipsBuilderConfig,
}

impl RelationshipsBuilderConfigBuilder {
    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.config.orientation = orientation;
        self
    }

    pub fn add_property(mut self, property: PropertyConfig) -> Self {
        self.config.properties.push(property);
        self
    }

    pub fn index_inverse(mut self, index_inverse: bool) -> Self {
        self.config.index_inverse = index_inverse;
        self
    }

    pub fn skip_dangling_relationships(mut self, skip: bool) -> Self {
        self.config.skip_dangling_relationships = skip;
        self
    }

    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn use_pooled_builder_provider(mut self, pooled: bool) -> Self {
        self.config.use_pooled_builder_provider = pooled;
        self
    }

    pub fn aggregation(mut self, aggregation: Aggregation) -> Self {
        self.config.aggregation = aggregation;
        self
    }

    pub fn build(self) -> RelationshipsBuilderConfig {
        self.config
    }
}

struct RelationshipsBuilderInner {
    config: RelationshipsBuilderConfig,
    forward: SingleTypeRelationshipImporter,
    /// Present for undirected orientation or an explicit inverse index.
    reverse: Option<SingleTypeRelationshipImporter>,
    id_map: Arc<IdMap>,
    counters: Arc<ImportCounters>,
}

/// Coordinator for all relationships of one type.
pub struct RelationshipsBuilder {
    inner: Arc<RelationshipsBuilderInner>,
    provider: LocalBuilderProvider<LocalRelationshipsBuilder>,
}

impl RelationshipsBuilder {
    pub fn new(config: RelationshipsBuilderConfig, id_map: Arc<IdMap>) -> LoadResult<Self> {
        Self::with_counters(config, id_map, Arc::new(ImportCounters::new()))
    }

    pub fn with_counters(
        config: RelationshipsBuilderConfig,
        id_map: Arc<IdMap>,
        counters: Arc<ImportCounters>,
    ) -> LoadResult<Self> {
        config.validate()?;

        let aggregations: Vec<Aggregation> =
            config.properties.iter().map(|p| p.aggregation).collect();
        let shard_count = config.concurrency.value();
        let indexed = config.index_inverse || config.orientation == Orientation::Undirected;

        let forward = SingleTypeRelationshipImporter::new(
            aggregations.clone(),
            config.aggregation,
            shard_count,
        );
        let reverse = indexed.then(|| {
            SingleTypeRelationshipImporter::new(aggregations, config.aggregation, shard_count)
        });

        let inner = Arc::new(RelationshipsBuilderInner {
            config,
            forward,
            reverse,
            id_map,
            counters,
        });

        let factory = {
            let inner = Arc::clone(&inner);
            move || LocalRelationshipsBuilder::new(Arc::clone(&inner))
        };
        let provider = if inner.config.use_pooled_builder_provider {
            LocalBuilderProvider::pooled(
                inner.config.concurrency.value(),
                DEFAULT_POOL_TIMEOUT,
                factory,
            )
        } else {
            LocalBuilderProvider::thread_local(factory)
        };

        Ok(Self { inner, provider })
    }

    pub fn relationship_type(&self) -> &RelationshipType {
        &self.inner.config.relationship_type
    }

    pub fn counters(&self) -> Arc<ImportCounters> {
        Arc::clone(&self.inner.counters)
    }

    pub fn property_count(&self) -> usize {
        self.inner.config.properties.len()
    }

    /// Adds a relationship without properties.
    pub fn add_relationship(&self, source: i64, target: i64) -> LoadResult<()> {
        self.add(source, target, &[])
    }

    /// Adds a relationship with a single property value.
    pub fn add_relationship_with_property(
        &self,
        source: i64,
        target: i64,
        value: f64,
    ) -> LoadResult<()> {
        self.add(source, target, &[value])
    }

    /// Adds a relationship with a full property map; values are routed into
    /// the configured columns, missing keys take their defaults.
    pub fn add_relationship_with_values(
        &self,
        source: i64,
        target: i64,
        values: &PropertyValues,
    ) -> LoadResult<()> {
        let row = self.property_row(values)?;
        self.add(source, target, &row)
    }

    fn add(&self, source: i64, target: i64, properties: &[f64]) -> LoadResult<()> {
        debug_assert_eq!(properties.len(), self.inner.config.properties.len());
        let handle = self.provider.acquire()?;
        handle.with(|local| local.add_relationship(source, target, properties))
    }

    fn property_row(&self, values: &PropertyValues) -> LoadResult<Vec<f64>> {
        self.inner
            .config
            .properties
            .iter()
            .map(|config| match values.get(&config.key) {
                Some(value) => value.as_double().ok_or_else(|| {
                    ImportError::Schema(SchemaError::IncompatibleValueType {
                        key: config.key.clone(),
                        expected: ValueType::Double,
                        actual: value.value_type(),
                    })
                }),
                None => Ok(config.default_value.double_value()),
            })
            .collect()
    }

    /// Seals the builder into the per-type output: topology, optional inverse
    /// topology, and property columns aligned with each.
    pub fn build(self) -> LoadResult<SingleTypeRelationships> {
        self.provider.close()?;

        let node_count = self.inner.id_map.node_count();
        let config = &self.inner.config;

        let forward = self.inner.forward.build(node_count);
        let properties = Self::column_map(config, forward.property_columns);

        let (inverse_topology, inverse_properties) = match &self.inner.reverse {
            Some(reverse) => {
                let imported = reverse.build(node_count);
                (
                    Some(imported.topology),
                    Self::column_map(config, imported.property_columns),
                )
            }
            None => (None, HashMap::new()),
        };

        let mut schema_properties = HashMap::new();
        for property in &config.properties {
            schema_properties.insert(
                property.key.clone(),
                RelationshipPropertySchema::with_aggregation(
                    property.key.clone(),
                    ValueType::Double,
                    property.default_value.clone(),
                    property.state,
                    property.aggregation,
                ),
            );
        }
        let schema_entry = RelationshipSchemaEntry::new(
            config.relationship_type.clone(),
            config.orientation.direction(),
            schema_properties,
        );

        log::info!(
            "built relationships: type {}, {} forward elements, inverse {}",
            config.relationship_type,
            forward.topology.element_count(),
            inverse_topology.is_some()
        );

        Ok(SingleTypeRelationships::new(
            forward.topology,
            inverse_topology,
            properties,
            inverse_properties,
            schema_entry,
        ))
    }

    fn column_map(
        config: &RelationshipsBuilderConfig,
        columns: Vec<Vec<f64>>,
    ) -> HashMap<String, Arc<RelationshipPropertyValues>> {
        config
            .properties
            .iter()
            .zip(columns)
            .map(|(property, column)| {
                (
                    property.key.clone(),
                    Arc::new(RelationshipPropertyValues::new(
                        column,
                        property.default_value.double_value(),
                    )),
                )
            })
            .collect()
    }
}

/// Per-worker batching state for one relationship type.
///
/// For the indexed strategy both directions fill in lockstep and share one
/// buffered property reader, so a single capacity check drains both.
pub struct LocalRelationshipsBuilder {
    inner: Arc<RelationshipsBuilderInner>,
    forward_buffer: RelationshipsBatchBuffer,
    reverse_buffer: Option<RelationshipsBatchBuffer>,
    property_reader: Option<BufferedPropertyReader>,
}

impl LocalRelationshipsBuilder {
    fn new(inner: Arc<RelationshipsBuilderInner>) -> Self {
        let batch_size = inner.config.batch_size;
        let indexed = inner.reverse.is_some();
        let property_count = inner.config.properties.len();
        Self {
            inner,
            forward_buffer: RelationshipsBatchBuffer::new(batch_size),
            reverse_buffer: indexed.then(|| RelationshipsBatchBuffer::new(batch_size)),
            property_reader: (property_count >= 2)
                .then(|| BufferedPropertyReader::new(property_count)),
        }
    }

    fn add_relationship(
        &mut self,
        source: i64,
        target: i64,
        properties: &[f64],
    ) -> LoadResult<()> {
        let (source, target) = match self.inner.config.orientation {
            Orientation::Reverse => (target, source),
            _ => (source, target),
        };

        let property_ref = match properties.len() {
            0 => NO_PROPERTY_REF,
            1 => properties[0].to_bits() as i64,
            _ => self
                .property_reader
                .as_mut()
                .expect("buffered reader exists for multi-property types")
                .add_row(properties),
        };

        self.forward_buffer.add(source, target, property_ref);
        if let Some(reverse) = &mut self.reverse_buffer {
            reverse.add(target, source, property_ref);
        }

        if self.forward_buffer.is_full() {
            self.flush_buffers()?;
        }
        Ok(())
    }

    /// Drains both directions. The reverse half is always flushed, also when
    /// the forward half fails; the first error wins.
    fn flush_buffers(&mut self) -> LoadResult<()> {
        let forward_result = Self::drain_into(
            &self.inner,
            &mut self.forward_buffer,
            self.property_reader.as_ref(),
            &self.inner.forward,
            true,
        );

        let reverse_result = match (&mut self.reverse_buffer, &self.inner.reverse) {
            (Some(buffer), Some(importer)) => Self::drain_into(
                &self.inner,
                buffer,
                self.property_reader.as_ref(),
                importer,
                false,
            ),
            _ => Ok(()),
        };

        if let Some(reader) = &mut self.property_reader {
            reader.reset();
        }

        forward_result.and(reverse_result)
    }

    fn drain_into(
        inner: &RelationshipsBuilderInner,
        buffer: &mut RelationshipsBatchBuffer,
        reader: Option<&BufferedPropertyReader>,
        importer: &SingleTypeRelationshipImporter,
        count_stats: bool,
    ) -> LoadResult<()> {
        if buffer.is_empty() {
            return Ok(());
        }

        let (sources, targets, property_refs) = buffer.drain();
        let property_count = inner.config.properties.len();
        let mut edges = Vec::with_capacity(sources.len());

        for index in 0..sources.len() {
            let source = inner.id_map.to_internal(sources[index]);
            let target = inner.id_map.to_internal(targets[index]);
            let (source, target) = match (source, target) {
                (Some(source), Some(target)) => (source, target),
                (missing_source, _) => {
                    let offender = if missing_source.is_none() {
                        sources[index]
                    } else {
                        targets[index]
                    };
                    if inner.config.skip_dangling_relationships {
                        if count_stats {
                            inner.counters.increment_dangling_relationship();
                            log::debug!(
                                "dropped dangling relationship ({} -> {})",
                                sources[index],
                                targets[index]
                            );
                        }
                        continue;
                    }
                    return Err(ImportError::Structural(StructuralError::DanglingEndpoint {
                        original_id: offender,
                    }));
                }
            };

            let properties: Box<[f64]> = match property_count {
                0 => Box::new([]),
                1 => Box::new([f64::from_bits(property_refs[index] as u64)]),
                _ => reader
                    .expect("buffered reader exists for multi-property types")
                    .row(property_refs[index])
                    .into(),
            };
            edges.push(ResolvedEdge {
                source,
                target,
                properties,
            });
        }

        if count_stats {
            inner.counters.add_relationships_imported(edges.len() as u64);
        }
        importer.import_batch(edges);
        Ok(())
    }
}

impl LocalBuilder for LocalRelationshipsBuilder {
    fn flush_local(&mut self) -> LoadResult<()> {
        self.flush_buffers()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::graph::id_map::ForwardMappingBuilder;

    fn id_map_of(original_ids: &[i64]) -> Arc<IdMap> {
        let mut builder = ForwardMappingBuilder::dense(0);
        for (internal, &original) in original_ids.iter().enumerate() {
            builder.set(original, internal as u64);
        }
        Arc::new(IdMap::new(
            original_ids.to_vec(),
            builder.build(),
            HashMap::new(),
        ))
    }

    fn config(relationship_type: &str) -> RelationshipsBuilderConfigBuilder {
        RelationshipsBuilderConfig::builder(RelationshipType::of(relationship_type))
            .concurrency(Concurrency::single_threaded())
    }

    #[test]
    fn directed_topology_without_inverse() {
        let id_map = id_map_of(&[0, 1]);
        let builder =
            RelationshipsBuilder::new(config("FOLLOWS").build(), id_map).unwrap();

        builder.add_relationship(0, 1).unwrap();
        let relationships = builder.build().unwrap();

        assert_eq!(relationships.element_count(), 1);
        assert_eq!(relationships.topology().neighbors(0), &[1]);
        assert!(relationships.inverse_topology().is_none());
    }

    #[test]
    fn undirected_builds_both_directions() {
        let id_map = id_map_of(&[0, 1]);
        let builder = RelationshipsBuilder::new(
            config("FRIEND").orientation(Orientation::Undirected).build(),
            id_map,
        )
        .unwrap();

        builder.add_relationship(0, 1).unwrap();
        let relationships = builder.build().unwrap();

        let forward = relationships.topology();
        let inverse = relationships.inverse_topology().unwrap();
        assert_eq!(forward.element_count(), 1);
        assert_eq!(inverse.element_count(), 1);
        assert_eq!(forward.neighbors(0), &[1]);
        assert_eq!(inverse.neighbors(1), &[0]);
    }

    #[test]
    fn reverse_orientation_flips_edges() {
        let id_map = id_map_of(&[0, 1]);
        let builder = RelationshipsBuilder::new(
            config("CITES").orientation(Orientation::Reverse).build(),
            id_map,
        )
        .unwrap();

        builder.add_relationship(0, 1).unwrap();
        let relationships = builder.build().unwrap();
        assert_eq!(relationships.topology().neighbors(1), &[0]);
        assert_eq!(relationships.topology().degree(0), 0);
    }

    #[test]
    fn sum_aggregation_reduces_parallel_edges() {
        let id_map = id_map_of(&[0, 1]);
        let builder = RelationshipsBuilder::new(
            config("KNOWS")
                .add_property(PropertyConfig::with_aggregation(
                    "weight",
                    Aggregation::Sum,
                ))
                .build(),
            id_map,
        )
        .unwrap();

        builder.add_relationship_with_property(0, 1, 1.0).unwrap();
        builder.add_relationship_with_property(0, 1, 1.0).unwrap();

        let relationships = builder.build().unwrap();
        assert_eq!(relationships.element_count(), 1);
        let weights = relationships.property("weight").unwrap();
        let index = relationships.topology().relationship_index(0, 0);
        assert_eq!(weights.value_at(index), 2.0);
    }

    #[test]
    fn dangling_endpoints_are_skipped_and_counted() {
        let id_map = id_map_of(&[0]);
        let builder = RelationshipsBuilder::new(config("LINKS").build(), id_map).unwrap();

        builder.add_relationship(0, 99).unwrap();
        let counters = builder.counters();
        let relationships = builder.build().unwrap();

        assert_eq!(relationships.element_count(), 0);
        assert_eq!(counters.snapshot().relationships_skipped_dangling, 1);
    }

    #[test]
    fn dangling_endpoint_fails_when_not_skipped() {
        let id_map = id_map_of(&[0]);
        let builder = RelationshipsBuilder::new(
            config("LINKS").skip_dangling_relationships(false).build(),
            id_map,
        )
        .unwrap();

        builder.add_relationship(0, 99).unwrap();
        let result = builder.build();
        assert!(matches!(
            result,
            Err(ImportError::Structural(StructuralError::DanglingEndpoint {
                original_id: 99
            }))
        ));
    }

    #[test]
    fn multi_property_rows_survive_flush_cycles() {
        let id_map = id_map_of(&[0, 1, 2]);
        let builder = RelationshipsBuilder::new(
            config("ROADS")
                .batch_size(2)
                .add_property(PropertyConfig::of("distance"))
                .add_property(PropertyConfig::of("tolls"))
                .build(),
            id_map,
        )
        .unwrap();

        builder.add(0, 1, &[10.0, 1.0]).unwrap();
        builder.add(1, 2, &[20.0, 2.0]).unwrap();
        // Second flush: local edge ids restarted at zero.
        builder.add(2, 0, &[30.0, 3.0]).unwrap();

        let relationships = builder.build().unwrap();
        assert_eq!(relationships.element_count(), 3);

        let topology = relationships.topology();
        let distance = relationships.property("distance").unwrap();
        let tolls = relationships.property("tolls").unwrap();
        let index = topology.relationship_index(2, 0);
        assert_eq!(distance.value_at(index), 30.0);
        assert_eq!(tolls.value_at(index), 3.0);
    }

    #[test]
    fn aggregation_conflict_is_a_configuration_error() {
        let id_map = id_map_of(&[0]);
        let result = RelationshipsBuilder::new(
            config("MIXED")
                .add_property(PropertyConfig::with_aggregation("a", Aggregation::Sum))
                .add_property(PropertyConfig::with_aggregation("b", Aggregation::None))
                .build(),
            id_map,
        );
        assert!(matches!(
            result,
            Err(ImportError::Config(ConfigError::AggregationConflict { .. }))
        ));
    }

    #[test]
    fn inverse_index_with_undirected_is_rejected() {
        let id_map = id_map_of(&[0]);
        let result = RelationshipsBuilder::new(
            config("FRIEND")
                .orientation(Orientation::Undirected)
                .index_inverse(true)
                .build(),
            id_map,
        );
        assert!(matches!(
            result,
            Err(ImportError::Config(
                ConfigError::InverseIndexWithUndirected { .. }
            ))
        ));
    }
}
