//! File-to-graph-store orchestration.
//!
//! Drives a [`FileInput`] through three phases (nodes, relationships, graph
//! properties), fanning each phase out over a worker pool. Workers pull
//! chunks from the shared iterator and feed their visitor; the first error
//! stops the siblings at their next chunk boundary and no graph store is
//! returned.

use crate::concurrency::Concurrency;
use crate::core::loading::construction::{
    GraphPropertyBuilder, NodesBuilder, NodesBuilderConfig, PropertyConfig, RelationshipsBuilder,
    RelationshipsBuilderConfig,
};
use crate::core::loading::counters::{CountersSnapshot, ImportCounters};
use crate::core::loading::error::{
    ConfigError, ImportError, LoadResult, ResourceError, StructuralError,
};
use crate::core::loading::node_importer::IdMapBacking;
use crate::input::file_input::FileInput;
use crate::input::visitor::{
    ElementVisitor, GraphPropertyVisitor, NodeVisitor, RelationshipSink, RelationshipVisitor,
};
use crate::types::graph::{IdMap, SingleTypeRelationships};
use crate::types::graph_store::GraphStore;
use crate::types::schema::{
    Aggregation, GraphSchema, MutableRelationshipSchema, Orientation, PropertySchemaTrait,
    RelationshipSchema, RelationshipType, SchemaError,
};
use crate::values::PropertyValues;
use chrono::{DateTime, Duration, Utc};
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Core-relevant configuration of an import run.
#[derive(Clone, Debug)]
pub struct ImportConfig {
    pub concurrency: Concurrency,
    pub node_batch_size: usize,
    pub relationship_batch_size: usize,
    pub deduplicate_ids: bool,
    pub max_original_id: Option<i64>,
    pub id_map_backing: Option<IdMapBacking>,
    /// Direction policy for relationship types without a fixed schema entry.
    pub orientation: Orientation,
    pub index_inverse: bool,
    /// Aggregation for properties of relationship types discovered lazily.
    pub aggregation: Aggregation,
    pub skip_dangling_relationships: bool,
    pub use_pooled_builder_provider: bool,
    /// Reject types carrying more than one property column at assembly.
    pub single_relationship_property: bool,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            node_batch_size: crate::core::loading::construction::nodes_builder::DEFAULT_NODE_BATCH_SIZE,
            relationship_batch_size:
                crate::core::loading::RelationshipsBatchBuffer::DEFAULT_CAPACITY,
            deduplicate_ids: true,
            max_original_id: None,
            id_map_backing: None,
            orientation: Orientation::Natural,
            index_inverse: false,
            aggregation: Aggregation::None,
            skip_dangling_relationships: true,
            use_pooled_builder_provider: false,
            single_relationship_property: false,
        }
    }
}

impl ImportConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if !self.concurrency.is_valid() {
            return Err(ConfigError::BadConcurrency);
        }
        if self.node_batch_size == 0 || self.relationship_batch_size == 0 {
            return Err(ConfigError::BadBatchSize);
        }
        if self.deduplicate_ids && self.id_map_backing == Some(IdMapBacking::HighLimit) {
            return Err(ConfigError::DedupWithHighLimitIdMap);
        }
        Ok(())
    }
}

/// Wall-clock durations of the phases.
#[derive(Clone, Debug)]
pub struct ImportDurations {
    pub nodes: Duration,
    pub relationships: Duration,
    pub graph_properties: Duration,
    pub total: Duration,
}

/// Successful import: the graph store plus run diagnostics.
#[derive(Clone, Debug)]
pub struct ImportResult {
    pub graph_store: GraphStore,
    pub node_count: usize,
    pub relationship_counts: HashMap<RelationshipType, usize>,
    pub counters: CountersSnapshot,
    pub durations: ImportDurations,
}

/// Builds a [`GraphStore`] from a [`FileInput`].
pub struct GraphStoreImporter {
    config: ImportConfig,
    counters: Arc<ImportCounters>,
}

impl GraphStoreImporter {
    pub fn new(config: ImportConfig) -> LoadResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            counters: Arc::new(ImportCounters::new()),
        })
    }

    /// Counter snapshot; available for diagnostics also after a failed run.
    pub fn counters_snapshot(&self) -> CountersSnapshot {
        self.counters.snapshot()
    }

    pub fn run(&self, input: &dyn FileInput) -> LoadResult<ImportResult> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.concurrency.value())
            .build()
            .map_err(|error| {
                ImportError::Resource(ResourceError::WorkerPoolFailure {
                    message: error.to_string(),
                })
            })?;

        let total_start = Utc::now();

        let phase_start = Utc::now();
        let nodes = self.import_nodes(&pool, input)?;
        let nodes_duration = elapsed_since(phase_start);
        log::info!(
            "node phase finished: {} nodes in {}ms",
            nodes.id_map.node_count(),
            nodes_duration.num_milliseconds()
        );

        let phase_start = Utc::now();
        let relationships = self.import_relationships(&pool, input, Arc::clone(&nodes.id_map))?;
        let relationships_duration = elapsed_since(phase_start);
        log::info!(
            "relationship phase finished: {} types in {}ms",
            relationships.len(),
            relationships_duration.num_milliseconds()
        );

        let phase_start = Utc::now();
        let (graph_property_schemas, graph_property_values) =
            self.import_graph_properties(&pool, input)?;
        let graph_properties_duration = elapsed_since(phase_start);

        if self.config.single_relationship_property {
            for (relationship_type, rels) in &relationships {
                let count = rels.properties().len();
                if count > 1 {
                    return Err(ImportError::Structural(
                        StructuralError::MultipleRelationshipProperties {
                            relationship_type: relationship_type.name().to_string(),
                            count,
                        },
                    ));
                }
            }
        }

        let mut relationship_schema = MutableRelationshipSchema::empty();
        for rels in relationships.values() {
            relationship_schema.add_entry(rels.schema_entry().clone());
        }
        let relationship_schema = relationship_schema.build();
        if relationship_schema.is_empty() {
            log::warn!("relationship schema is empty");
            self.counters.increment_warning();
        }

        let schema = GraphSchema::new(
            nodes.schema.clone(),
            relationship_schema,
            graph_property_schemas,
        );

        let relationship_counts: HashMap<RelationshipType, usize> = relationships
            .iter()
            .map(|(relationship_type, rels)| (relationship_type.clone(), rels.element_count()))
            .collect();
        let node_count = nodes.id_map.node_count();

        let graph_store = GraphStore::new(
            schema,
            nodes.id_map,
            nodes.properties,
            nodes.properties_by_label,
            relationships,
            graph_property_values,
        );

        let total = elapsed_since(total_start);
        log::info!(
            "import finished: {} nodes, {} relationships in {}ms",
            node_count,
            relationship_counts.values().sum::<usize>(),
            total.num_milliseconds()
        );

        Ok(ImportResult {
            graph_store,
            node_count,
            relationship_counts,
            counters: self.counters.snapshot(),
            durations: ImportDurations {
                nodes: nodes_duration,
                relationships: relationships_duration,
                graph_properties: graph_properties_duration,
                total,
            },
        })
    }

    fn import_nodes(
        &self,
        pool: &rayon::ThreadPool,
        input: &dyn FileInput,
    ) -> LoadResult<crate::core::loading::construction::Nodes> {
        let mut builder_config = NodesBuilderConfig::builder()
            .concurrency(self.config.concurrency)
            .batch_size(self.config.node_batch_size)
            .deduplicate_ids(self.config.deduplicate_ids)
            .use_pooled_builder_provider(self.config.use_pooled_builder_provider);
        if let Some(max) = self.config.max_original_id {
            builder_config = builder_config.max_original_id(max);
        }
        if let Some(backing) = self.config.id_map_backing {
            builder_config = builder_config.id_map_backing(backing);
        }
        if let Some(schema) = input.node_schema() {
            builder_config = builder_config.schema(schema);
        }
        let builder =
            NodesBuilder::with_counters(builder_config.build(), Arc::clone(&self.counters))?;

        let chunks = input.nodes();
        self.drive(pool, |stop| {
            let mut visitor = NodeVisitor::new(&builder);
            while !stop.load(Ordering::Relaxed) {
                let Some(chunk) = chunks.next_chunk() else {
                    break;
                };
                for record in &chunk {
                    visitor.visit(record)?;
                }
            }
            visitor.close()
        })?;

        builder.build()
    }

    fn import_relationships(
        &self,
        pool: &rayon::ThreadPool,
        input: &dyn FileInput,
        id_map: Arc<IdMap>,
    ) -> LoadResult<HashMap<RelationshipType, SingleTypeRelationships>> {
        let registry = RelationshipBuildersRegistry {
            config: self.config.clone(),
            fixed_schema: input.relationship_schema(),
            id_map,
            counters: Arc::clone(&self.counters),
            builders: RwLock::new(HashMap::new()),
        };

        let chunks = input.relationships();
        self.drive(pool, |stop| {
            let mut visitor = RelationshipVisitor::new(&registry, Arc::clone(&self.counters));
            while !stop.load(Ordering::Relaxed) {
                let Some(chunk) = chunks.next_chunk() else {
                    break;
                };
                for record in &chunk {
                    visitor.visit(record)?;
                }
            }
            visitor.close()
        })?;

        registry.build_all()
    }

    #[allow(clippy::type_complexity)]
    fn import_graph_properties(
        &self,
        pool: &rayon::ThreadPool,
        input: &dyn FileInput,
    ) -> LoadResult<(
        HashMap<String, crate::types::schema::PropertySchema>,
        HashMap<String, Arc<crate::types::properties::GraphPropertyValues>>,
    )> {
        let builder = match input.graph_property_schema() {
            Some(schema) => GraphPropertyBuilder::fixed(schema, Arc::clone(&self.counters)),
            None => GraphPropertyBuilder::lazy(Arc::clone(&self.counters)),
        };

        let chunks = input.graph_properties();
        self.drive(pool, |stop| {
            let mut visitor = GraphPropertyVisitor::new(&builder, Arc::clone(&self.counters));
            while !stop.load(Ordering::Relaxed) {
                let Some(chunk) = chunks.next_chunk() else {
                    break;
                };
                for record in &chunk {
                    visitor.visit(record)?;
                }
            }
            visitor.close()
        })?;

        builder.build()
    }

    /// Runs `worker` on every pool thread. The first error wins; siblings
    /// observe the stop flag at their next chunk boundary.
    fn drive<F>(&self, pool: &rayon::ThreadPool, worker: F) -> LoadResult<()>
    where
        F: Fn(&AtomicBool) -> LoadResult<()> + Sync,
    {
        let first_error: Mutex<Option<ImportError>> = Mutex::new(None);
        let stop = AtomicBool::new(false);

        pool.scope(|scope| {
            for _ in 0..self.config.concurrency.value() {
                scope.spawn(|_| {
                    if let Err(error) = worker(&stop) {
                        stop.store(true, Ordering::SeqCst);
                        first_error.lock().get_or_insert(error);
                    }
                });
            }
        });

        match first_error.into_inner() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn elapsed_since(start: DateTime<Utc>) -> Duration {
    Utc::now() - start
}

/// Per-type relationship builders, created from the fixed schema or
/// discovered from the first record of each type.
struct RelationshipBuildersRegistry {
    config: ImportConfig,
    fixed_schema: Option<RelationshipSchema>,
    id_map: Arc<IdMap>,
    counters: Arc<ImportCounters>,
    builders: RwLock<HashMap<RelationshipType, Arc<RelationshipsBuilder>>>,
}

impl RelationshipBuildersRegistry {
    fn builder_for(
        &self,
        relationship_type: RelationshipType,
        properties: &PropertyValues,
    ) -> LoadResult<Arc<RelationshipsBuilder>> {
        if let Some(builder) = self.builders.read().get(&relationship_type) {
            return Ok(Arc::clone(builder));
        }

        let mut builders = self.builders.write();
        if let Some(builder) = builders.get(&relationship_type) {
            return Ok(Arc::clone(builder));
        }

        let config = match &self.fixed_schema {
            Some(schema) => {
                let entry = schema.get(&relationship_type).ok_or_else(|| {
                    ImportError::Schema(SchemaError::UnknownRelationshipType {
                        relationship_type: relationship_type.name().to_string(),
                    })
                })?;

                let orientation = if entry.is_undirected() {
                    Orientation::Undirected
                } else if self.config.orientation == Orientation::Reverse {
                    Orientation::Reverse
                } else {
                    Orientation::Natural
                };

                let mut keys: Vec<&String> = entry.properties().keys().collect();
                keys.sort();
                let mut builder_config =
                    RelationshipsBuilderConfig::builder(relationship_type.clone())
                        .orientation(orientation)
                        .index_inverse(
                            self.config.index_inverse && orientation != Orientation::Undirected,
                        );
                for key in keys {
                    let property = &entry.properties()[key];
                    builder_config = builder_config.add_property(
                        PropertyConfig::with_aggregation(key.clone(), property.aggregation())
                            .default_value(property.default_value().clone())
                            .state(property.state()),
                    );
                }
                builder_config
            }
            None => {
                // Lazy discovery: the first record of a type defines its
                // property columns.
                let mut keys: Vec<&str> = properties.keys().collect();
                keys.sort_unstable();
                let mut builder_config =
                    RelationshipsBuilderConfig::builder(relationship_type.clone())
                        .orientation(self.config.orientation)
                        .index_inverse(
                            self.config.index_inverse
                                && self.config.orientation != Orientation::Undirected,
                        );
                for key in keys {
                    builder_config = builder_config.add_property(PropertyConfig::with_aggregation(
                        key,
                        self.config.aggregation,
                    ));
                }
                builder_config
            }
        }
        .skip_dangling_relationships(self.config.skip_dangling_relationships)
        .concurrency(self.config.concurrency)
        .batch_size(self.config.relationship_batch_size)
        .use_pooled_builder_provider(self.config.use_pooled_builder_provider)
        .aggregation(self.config.aggregation)
        .build();

        let builder = Arc::new(RelationshipsBuilder::with_counters(
            config,
            Arc::clone(&self.id_map),
            Arc::clone(&self.counters),
        )?);
        builders.insert(relationship_type, Arc::clone(&builder));
        Ok(builder)
    }

    fn build_all(self) -> LoadResult<HashMap<RelationshipType, SingleTypeRelationships>> {
        let builders = self.builders.into_inner();
        let mut relationships = HashMap::with_capacity(builders.len());
        for (relationship_type, builder) in builders {
            let builder = Arc::into_inner(builder)
                .expect("all workers joined before the registry is sealed");
            relationships.insert(relationship_type, builder.build()?);
        }
        Ok(relationships)
    }
}

impl RelationshipSink for RelationshipBuildersRegistry {
    fn add_relationship(
        &self,
        relationship_type: &str,
        start_id: i64,
        end_id: i64,
        properties: &PropertyValues,
    ) -> LoadResult<()> {
        let builder = self.builder_for(RelationshipType::of(relationship_type), properties)?;
        if builder.property_count() == 0 {
            builder.add_relationship(start_id, end_id)
        } else {
            builder.add_relationship_with_values(start_id, end_id, properties)
        }
    }
}
