//! Thread-safe assembly of nodes: id mapping, labels, and property columns.

use crate::concurrency::Concurrency;
use crate::core::loading::construction::local_provider::{
    LocalBuilder, LocalBuilderProvider, DEFAULT_POOL_TIMEOUT,
};
use crate::core::loading::counters::ImportCounters;
use crate::core::loading::dedup::DedupPredicate;
use crate::core::loading::error::{ConfigError, ImportError, LoadResult};
use crate::core::loading::node_importer::{IdMapBacking, NodeImporter};
use crate::core::loading::node_property_builder::NodePropertyBuilders;
use crate::core::loading::nodes_batch_buffer::{NodesBatchBuffer, NO_PROPERTY_REF};
use crate::core::loading::token_table::{LabelToken, TokenToNodeLabels, ANY_LABEL_TOKEN};
use crate::types::graph::IdMap;
use crate::types::properties::NodePropertyValues;
use crate::types::schema::{MutableNodeSchema, NodeLabel, NodeSchema};
use crate::types::PropertyState;
use crate::values::PropertyValues;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Default per-worker node batch size.
pub const DEFAULT_NODE_BATCH_SIZE: usize = 10_000;

/// Configuration of a [`NodesBuilder`].
#[derive(Clone, Debug)]
pub struct NodesBuilderConfig {
    pub concurrency: Concurrency,
    pub batch_size: usize,
    pub deduplicate_ids: bool,
    pub max_original_id: Option<i64>,
    pub id_map_backing: Option<IdMapBacking>,
    pub use_pooled_builder_provider: bool,
    pub schema: Option<NodeSchema>,
    pub property_state: PropertyState,
}

impl Default for NodesBuilderConfig {
    fn default() -> Self {
        Self {
            concurrency: Concurrency::default(),
            batch_size: DEFAULT_NODE_BATCH_SIZE,
            deduplicate_ids: true,
            max_original_id: None,
            id_map_backing: None,
            use_pooled_builder_provider: false,
            schema: None,
            property_state: PropertyState::Persistent,
        }
    }
}

impl NodesBuilderConfig {
    pub fn builder() -> NodesBuilderConfigBuilder {
        NodesBuilderConfigBuilder {
            config: Self::default(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::BadBatchSize);
        }
        if !self.concurrency.is_valid() {
            return Err(ConfigError::BadConcurrency);
        }
        if self.deduplicate_ids && self.id_map_backing == Some(IdMapBacking::HighLimit) {
            return Err(ConfigError::DedupWithHighLimitIdMap);
        }
        Ok(())
    }
}

/// Fluent builder for [`NodesBuilderConfig`].
pub struct NodesBuilderConfigBuilder {
    config: NodesBuilderConfig,
}

impl NodesBuilderConfigBuilder {
    pub fn concurrency(mut self, concurrency: Concurrency) -> Self {
        self.config.concurrency = concurrency;
        self
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.config.batch_size = batch_size;
        self
    }

    pub fn deduplicate_ids(mut self, deduplicate_ids: bool) -> Self {
        self.config.deduplicate_ids = deduplicate_ids;
        self
    }

    pub fn max_original_id(mut self, max_original_id: i64) -> Self {
        self.config.max_original_id = Some(max_original_id);
        self
    }

    pub fn id_map_backing(mut self, backing: IdMapBacking) -> Self {
        self.config.id_map_backing = Some(backing);
        self
    }

    pub fn use_pooled_builder_provider(mut self, pooled: bool) -> Self {
        self.config.use_pooled_builder_provider = pooled;
        self
    }

    /// Seals the builder to a fixed schema; unknown labels and property keys
    /// are rejected instead of discovered.
    pub fn schema(mut self, schema: NodeSchema) -> Self {
        self.config.schema = Some(schema);
        self
    }

    pub fn property_state(mut self, state: PropertyState) -> Self {
        self.config.property_state = state;
        self
    }

    pub fn build(self) -> NodesBuilderConfig {
        self.config
    }
}

/// The finished node side of a graph: schema, id map, and property columns.
#[derive(Clone, Debug)]
pub struct Nodes {
    pub schema: NodeSchema,
    pub id_map: Arc<IdMap>,
    pub properties: HashMap<String, Arc<NodePropertyValues>>,
    pub properties_by_label: HashMap<NodeLabel, HashSet<String>>,
}

struct NodesBuilderInner {
    importer: NodeImporter,
    property_builders: NodePropertyBuilders,
    token_table: TokenToNodeLabels,
    dedup: DedupPredicate,
    counters: Arc<ImportCounters>,
    batch_size: usize,
    schema_observations: Mutex<HashMap<Vec<LabelToken>, HashSet<String>>>,
    fixed_schema: Option<NodeSchema>,
}

/// Top-level coordinator for node construction.
///
/// All insert methods take `&self` and may be called from any number of
/// threads; each call borrows the calling worker's local builder through the
/// provider and releases it when the call returns.
pub struct NodesBuilder {
    inner: Arc<NodesBuilderInner>,
    provider: LocalBuilderProvider<LocalNodesBuilder>,
}

impl NodesBuilder {
    pub fn new(config: NodesBuilderConfig) -> LoadResult<Self> {
        Self::with_counters(config, Arc::new(ImportCounters::new()))
    }

    pub fn with_counters(
        config: NodesBuilderConfig,
        counters: Arc<ImportCounters>,
    ) -> LoadResult<Self> {
        config.validate()?;

        let backing = config
            .id_map_backing
            .unwrap_or_else(|| IdMapBacking::for_hint(config.max_original_id));

        let token_table = match &config.schema {
            Some(schema) => TokenToNodeLabels::fixed(schema.available_labels()),
            None => TokenToNodeLabels::lazy(),
        };
        let property_builders = match &config.schema {
            Some(schema) => {
                NodePropertyBuilders::fixed(schema.union_properties(), config.property_state)
            }
            None => NodePropertyBuilders::lazy(config.property_state),
        };

        let inner = Arc::new(NodesBuilderInner {
            importer: NodeImporter::new(backing, config.max_original_id),
            property_builders,
            token_table,
            dedup: DedupPredicate::for_config(config.deduplicate_ids, config.max_original_id),
            counters,
            batch_size: config.batch_size,
            schema_observations: Mutex::new(HashMap::new()),
            fixed_schema: config.schema.clone(),
        });

        let factory = {
            let inner = Arc::clone(&inner);
            move || LocalNodesBuilder::new(Arc::clone(&inner))
        };
        let provider = if config.use_pooled_builder_provider {
            LocalBuilderProvider::pooled(config.concurrency.value(), DEFAULT_POOL_TIMEOUT, factory)
        } else {
            LocalBuilderProvider::thread_local(factory)
        };

        Ok(Self { inner, provider })
    }

    pub fn counters(&self) -> Arc<ImportCounters> {
        Arc::clone(&self.inner.counters)
    }

    pub fn add_node(&self, original_id: i64) -> LoadResult<()> {
        self.add(original_id, &[], None)
    }

    pub fn add_node_with_labels(&self, original_id: i64, labels: &[NodeLabel]) -> LoadResult<()> {
        self.add(original_id, labels, None)
    }

    pub fn add_node_with_properties(
        &self,
        original_id: i64,
        properties: PropertyValues,
    ) -> LoadResult<()> {
        self.add(original_id, &[], Some(properties))
    }

    pub fn add_node_full(
        &self,
        original_id: i64,
        labels: &[NodeLabel],
        properties: PropertyValues,
    ) -> LoadResult<()> {
        self.add(original_id, labels, Some(properties))
    }

    fn add(
        &self,
        original_id: i64,
        labels: &[NodeLabel],
        properties: Option<PropertyValues>,
    ) -> LoadResult<()> {
        let handle = self.provider.acquire()?;
        handle.with(|local| local.add_node(original_id, labels, properties))
    }

    /// Seals the builder: flushes every worker, finalizes the id map, and
    /// snapshots all property columns.
    pub fn build(self) -> LoadResult<Nodes> {
        self.provider.close()?;

        let node_count = self.inner.importer.node_count();
        let id_map = Arc::new(self.inner.importer.finalize(&self.inner.token_table));
        let columns = self
            .inner
            .property_builders
            .build(node_count)
            .map_err(ImportError::from)?;

        let schema = match &self.inner.fixed_schema {
            Some(schema) => schema.clone(),
            None => self.discovered_schema(&columns),
        };

        if schema.is_empty() && node_count == 0 {
            log::warn!("node schema is empty; building a zero-node graph");
            self.inner.counters.increment_warning();
        }

        let mut properties = HashMap::with_capacity(columns.len());
        for (key, (_, values)) in columns {
            properties.insert(key, Arc::new(values));
        }

        let mut properties_by_label: HashMap<NodeLabel, HashSet<String>> = HashMap::new();
        for entry in schema.entries() {
            properties_by_label.insert(
                entry.identifier().clone(),
                entry.properties().keys().cloned().collect(),
            );
        }

        log::info!(
            "built nodes: {} nodes, {} labels, {} property columns",
            node_count,
            schema.available_labels().len(),
            properties.len()
        );

        Ok(Nodes {
            schema,
            id_map,
            properties,
            properties_by_label,
        })
    }

    /// Lazy-mode schema: the union of every worker's label to property-key
    /// observations, typed by the column builders.
    fn discovered_schema(
        &self,
        columns: &HashMap<String, (crate::types::schema::PropertySchema, NodePropertyValues)>,
    ) -> NodeSchema {
        let observations = std::mem::take(&mut *self.inner.schema_observations.lock());
        let mut schema = MutableNodeSchema::empty();

        for (tokens, keys) in &observations {
            let mut labels: Vec<NodeLabel> = Vec::new();
            for &token in tokens {
                if token == ANY_LABEL_TOKEN {
                    labels.push(NodeLabel::all_nodes());
                } else {
                    labels.extend(self.inner.token_table.identifiers_of(token));
                }
            }
            for label in labels {
                let entry = schema.get_or_create_label(label);
                for key in keys {
                    if let Some((property_schema, _)) = columns.get(key) {
                        entry.add_property_schema(property_schema.clone());
                    }
                }
            }
        }

        schema.build()
    }
}

/// Single-producer view of the shared builder, owned by one worker at a time.
pub struct LocalNodesBuilder {
    inner: Arc<NodesBuilderInner>,
    buffer: NodesBatchBuffer,
    batch_properties: Vec<PropertyValues>,
    token_cache: HashMap<String, Arc<Vec<LabelToken>>>,
    no_label_tokens: Arc<Vec<LabelToken>>,
}

impl LocalNodesBuilder {
    fn new(inner: Arc<NodesBuilderInner>) -> Self {
        let batch_size = inner.batch_size;
        Self {
            inner,
            buffer: NodesBatchBuffer::new(batch_size),
            batch_properties: Vec::new(),
            token_cache: HashMap::new(),
            no_label_tokens: Arc::new(vec![ANY_LABEL_TOKEN]),
        }
    }

    fn add_node(
        &mut self,
        original_id: i64,
        labels: &[NodeLabel],
        properties: Option<PropertyValues>,
    ) -> LoadResult<()> {
        if self.inner.dedup.seen_before(original_id)? {
            self.inner.counters.increment_duplicate_node();
            return Ok(());
        }

        let tokens = self.tokens_for(labels)?;
        let property_ref = match properties {
            Some(values) if !values.is_empty() => {
                let reference = self.batch_properties.len() as i64;
                self.batch_properties.push(values);
                reference
            }
            _ => NO_PROPERTY_REF,
        };

        self.buffer.add(original_id, property_ref, tokens);
        if self.buffer.is_full() {
            self.flush_buffer()?;
        }
        Ok(())
    }

    /// Tokens for a label combination, cached per worker under the sorted
    /// label-set string.
    fn tokens_for(&mut self, labels: &[NodeLabel]) -> LoadResult<Arc<Vec<LabelToken>>> {
        if labels.is_empty() {
            return Ok(Arc::clone(&self.no_label_tokens));
        }

        let mut names: Vec<&str> = labels.iter().map(|label| label.name()).collect();
        names.sort_unstable();
        names.dedup();
        let cache_key = names.join("\u{0}");

        if let Some(tokens) = self.token_cache.get(&cache_key) {
            return Ok(Arc::clone(tokens));
        }

        let mut tokens = Vec::with_capacity(names.len());
        for name in &names {
            tokens.push(
                self.inner
                    .token_table
                    .token_of(&NodeLabel::of(name))
                    .map_err(ImportError::from)?,
            );
        }
        let tokens = Arc::new(tokens);
        self.token_cache.insert(cache_key, Arc::clone(&tokens));
        Ok(tokens)
    }

    /// Hands the batch to the shared importer and routes its properties.
    fn flush_buffer(&mut self) -> LoadResult<()> {
        if self.buffer.is_empty() {
            return Ok(());
        }

        let (original_ids, property_refs, label_tokens) = self.buffer.drain();
        let batch_properties = std::mem::take(&mut self.batch_properties);

        let start_id = self.inner.importer.import_nodes(&original_ids, &label_tokens);
        self.inner
            .counters
            .add_nodes_imported(original_ids.len() as u64);

        let mut observations: HashMap<Vec<LabelToken>, HashSet<String>> = HashMap::new();
        for index in 0..original_ids.len() {
            let internal = start_id + index as u64;
            let keys = observations
                .entry(label_tokens[index].as_ref().clone())
                .or_default();
            if property_refs[index] != NO_PROPERTY_REF {
                let values = &batch_properties[property_refs[index] as usize];
                for (key, value) in values.iter() {
                    self.inner
                        .property_builders
                        .set(internal, key, value)
                        .map_err(ImportError::from)?;
                    keys.insert(key.to_string());
                }
            }
        }

        let mut shared = self.inner.schema_observations.lock();
        for (tokens, keys) in observations {
            shared.entry(tokens).or_default().extend(keys);
        }
        drop(shared);

        log::debug!(
            "flushed node batch: {} nodes starting at internal id {}",
            original_ids.len(),
            start_id
        );
        Ok(())
    }
}

impl LocalBuilder for LocalNodesBuilder {
    fn flush_local(&mut self) -> LoadResult<()> {
        self.flush_buffer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::schema::MutableNodeSchema;
    use crate::types::ValueType;
    use crate::values::GdsValue;

    fn single_threaded_config() -> NodesBuilderConfig {
        NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .build()
    }

    #[test]
    fn builds_id_map_and_schema() {
        let builder = NodesBuilder::new(single_threaded_config()).unwrap();
        let person = NodeLabel::of("Person");

        builder.add_node_with_labels(0, &[person.clone()]).unwrap();
        builder.add_node_with_labels(1, &[person.clone()]).unwrap();

        let nodes = builder.build().unwrap();
        assert_eq!(nodes.id_map.node_count(), 2);
        assert!(nodes.schema.contains(&person));
        assert_eq!(nodes.id_map.node_count_for_label(&person), 2);
    }

    #[test]
    fn duplicate_ids_are_skipped_when_dedup_enabled() {
        let config = NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .deduplicate_ids(true)
            .max_original_id(10)
            .build();
        let builder = NodesBuilder::new(config).unwrap();

        builder.add_node(3).unwrap();
        builder.add_node(3).unwrap();
        builder.add_node(3).unwrap();

        let counters = builder.counters();
        let nodes = builder.build().unwrap();
        assert_eq!(nodes.id_map.node_count(), 1);
        assert_eq!(counters.snapshot().nodes_skipped_duplicate, 2);
    }

    #[test]
    fn exact_batch_capacity_triggers_single_flush() {
        let config = NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .batch_size(4)
            .build();
        let builder = NodesBuilder::new(config).unwrap();

        for id in 0..4 {
            builder.add_node(id).unwrap();
        }
        // The auto-flush already drained the buffer.
        assert_eq!(builder.counters().snapshot().nodes_imported, 4);

        let nodes = builder.build().unwrap();
        assert_eq!(nodes.id_map.node_count(), 4);
    }

    #[test]
    fn lazy_properties_become_typed_columns() {
        let builder = NodesBuilder::new(single_threaded_config()).unwrap();
        let person = NodeLabel::of("Person");

        let mut props = PropertyValues::new();
        props.put("age", GdsValue::Long(30));
        builder.add_node_full(0, &[person.clone()], props).unwrap();
        builder.add_node_with_labels(1, &[person.clone()]).unwrap();

        let nodes = builder.build().unwrap();
        let column = nodes.properties.get("age").unwrap();
        assert_eq!(column.element_count(), 2);
        let internal = nodes.id_map.to_internal(0).unwrap();
        assert_eq!(column.long_value(internal), Some(30));

        let entry = nodes.schema.get(&person).unwrap();
        assert_eq!(
            entry.properties().get("age").unwrap().value_type(),
            ValueType::Long
        );
    }

    #[test]
    fn fixed_schema_rejects_unknown_label_and_property() {
        let mut schema = MutableNodeSchema::empty();
        schema.add_property(NodeLabel::of("Person"), "name", ValueType::String);
        let config = NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .schema(schema.build())
            .build();
        let builder = NodesBuilder::new(config).unwrap();

        let unknown_label = builder.add_node_with_labels(0, &[NodeLabel::of("Robot")]);
        assert!(matches!(unknown_label, Err(ImportError::Schema(_))));

        let mut props = PropertyValues::new();
        props.put("name", GdsValue::from("x"));
        props.put("age", GdsValue::Long(30));
        let unknown_property =
            builder.add_node_full(1, &[NodeLabel::of("Person")], props);
        // The bad batch aborts at flush time; force it now.
        let result = unknown_property.and(builder.build().map(|_| ()));
        assert!(result.is_err());
    }

    #[test]
    fn dedup_with_high_limit_backing_is_rejected() {
        let config = NodesBuilderConfig::builder()
            .concurrency(Concurrency::single_threaded())
            .deduplicate_ids(true)
            .id_map_backing(IdMapBacking::HighLimit)
            .build();
        assert!(matches!(
            NodesBuilder::new(config),
            Err(ImportError::Config(ConfigError::DedupWithHighLimitIdMap))
        ));
    }

    #[test]
    fn nodes_without_labels_belong_to_all_nodes() {
        let builder = NodesBuilder::new(single_threaded_config()).unwrap();
        builder.add_node(0).unwrap();
        builder.add_node(1).unwrap();

        let nodes = builder.build().unwrap();
        assert_eq!(
            nodes.id_map.node_count_for_label(&NodeLabel::all_nodes()),
            2
        );
    }
}
