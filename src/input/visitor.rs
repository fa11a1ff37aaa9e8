//! Per-worker visitors bridging record streams and the builders.
//!
//! A visitor holds exactly one in-flight element; `end_of_entity` exports it
//! into the owning builder and resets the transient state. Raw values that
//! the engine cannot represent are dropped with a warning instead of
//! aborting the import.

use crate::core::loading::construction::{GraphPropertyBuilder, NodesBuilder};
use crate::core::loading::counters::ImportCounters;
use crate::core::loading::error::LoadResult;
use crate::input::file_input::{GraphPropertyRecord, NodeRecord, RelationshipRecord};
use crate::types::schema::NodeLabel;
use crate::values::{GdsValue, PrimitiveValues, PropertyValues};
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Common surface of the three element visitors.
pub trait ElementVisitor {
    fn property(&mut self, key: &str, raw: &JsonValue) -> LoadResult<()>;

    /// Exports the in-flight element and clears the per-element state.
    fn end_of_entity(&mut self) -> LoadResult<()>;

    fn reset(&mut self);

    /// Flushes worker-local accumulation at end of stream.
    fn close(&mut self) -> LoadResult<()> {
        Ok(())
    }
}

fn convert_raw(
    key: &str,
    raw: &JsonValue,
    counters: &ImportCounters,
) -> Option<GdsValue> {
    match PrimitiveValues::of(raw) {
        Some(value) => Some(value),
        None => {
            if !raw.is_null() {
                log::warn!("dropping unrepresentable value for property '{key}'");
                counters.increment_warning();
            }
            None
        }
    }
}

/// Drives node records into a [`NodesBuilder`].
pub struct NodeVisitor<'a> {
    builder: &'a NodesBuilder,
    counters: Arc<ImportCounters>,
    current_id: i64,
    labels: Vec<NodeLabel>,
    properties: PropertyValues,
    /// Interned label sets keyed by the sorted label-set string.
    label_cache: HashMap<String, Vec<NodeLabel>>,
}

impl<'a> NodeVisitor<'a> {
    pub fn new(builder: &'a NodesBuilder) -> Self {
        Self {
            counters: builder.counters(),
            builder,
            current_id: 0,
            labels: Vec::new(),
            properties: PropertyValues::new(),
            label_cache: HashMap::new(),
        }
    }

    pub fn id(&mut self, id: i64) {
        self.current_id = id;
    }

    pub fn labels(&mut self, labels: &[String]) {
        if labels.is_empty() {
            self.labels.clear();
            return;
        }

        let mut sorted: Vec<&str> = labels.iter().map(String::as_str).collect();
        sorted.sort_unstable();
        sorted.dedup();
        let cache_key = sorted.join("\u{0}");

        let interned = self
            .label_cache
            .entry(cache_key)
            .or_insert_with(|| sorted.iter().map(NodeLabel::of).collect());
        self.labels = interned.clone();
    }

    /// Convenience driver for one full record.
    pub fn visit(&mut self, record: &NodeRecord) -> LoadResult<()> {
        self.id(record.id);
        self.labels(&record.labels);
        for (key, raw) in &record.properties {
            self.property(key, raw)?;
        }
        self.end_of_entity()
    }
}

impl ElementVisitor for NodeVisitor<'_> {
    fn property(&mut self, key: &str, raw: &JsonValue) -> LoadResult<()> {
        if let Some(value) = convert_raw(key, raw, &self.counters) {
            self.properties.put(key, value);
        }
        Ok(())
    }

    fn end_of_entity(&mut self) -> LoadResult<()> {
        let properties = std::mem::take(&mut self.properties);
        let labels = std::mem::take(&mut self.labels);
        let result = self
            .builder
            .add_node_full(self.current_id, &labels, properties);
        self.reset();
        result
    }

    fn reset(&mut self) {
        self.current_id = 0;
        self.labels.clear();
        self.properties = PropertyValues::new();
    }
}

/// Receives resolved relationship rows; implemented by the per-type builder
/// registry of the orchestrator.
pub trait RelationshipSink: Sync {
    fn add_relationship(
        &self,
        relationship_type: &str,
        start_id: i64,
        end_id: i64,
        properties: &PropertyValues,
    ) -> LoadResult<()>;
}

/// Drives relationship records into a [`RelationshipSink`].
pub struct RelationshipVisitor<'a> {
    sink: &'a dyn RelationshipSink,
    counters: Arc<ImportCounters>,
    start_id: i64,
    end_id: i64,
    relationship_type: String,
    properties: PropertyValues,
}

impl<'a> RelationshipVisitor<'a> {
    pub fn new(sink: &'a dyn RelationshipSink, counters: Arc<ImportCounters>) -> Self {
        Self {
            sink,
            counters,
            start_id: 0,
            end_id: 0,
            relationship_type: String::new(),
            properties: PropertyValues::new(),
        }
    }

    pub fn start_id(&mut self, id: i64) {
        self.start_id = id;
    }

    pub fn end_id(&mut self, id: i64) {
        self.end_id = id;
    }

    pub fn relationship_type(&mut self, relationship_type: &str) {
        self.relationship_type.clear();
        self.relationship_type.push_str(relationship_type);
    }

    pub fn visit(&mut self, record: &RelationshipRecord) -> LoadResult<()> {
        self.start_id(record.start_id);
        self.end_id(record.end_id);
        self.relationship_type(&record.relationship_type);
        for (key, raw) in &record.properties {
            self.property(key, raw)?;
        }
        self.end_of_entity()
    }
}

impl ElementVisitor for RelationshipVisitor<'_> {
    fn property(&mut self, key: &str, raw: &JsonValue) -> LoadResult<()> {
        if let Some(value) = convert_raw(key, raw, &self.counters) {
            self.properties.put(key, value);
        }
        Ok(())
    }

    fn end_of_entity(&mut self) -> LoadResult<()> {
        let properties = std::mem::take(&mut self.properties);
        let result = self.sink.add_relationship(
            &self.relationship_type,
            self.start_id,
            self.end_id,
            &properties,
        );
        self.reset();
        result
    }

    fn reset(&mut self) {
        self.start_id = 0;
        self.end_id = 0;
        self.relationship_type.clear();
        self.properties = PropertyValues::new();
    }
}

/// Accumulates graph-property rows into worker-local stream fragments.
pub struct GraphPropertyVisitor<'a> {
    builder: &'a GraphPropertyBuilder,
    counters: Arc<ImportCounters>,
    in_flight: Option<(String, GdsValue)>,
    local_fragments: HashMap<String, Vec<GdsValue>>,
}

impl<'a> GraphPropertyVisitor<'a> {
    pub fn new(builder: &'a GraphPropertyBuilder, counters: Arc<ImportCounters>) -> Self {
        Self {
            builder,
            counters,
            in_flight: None,
            local_fragments: HashMap::new(),
        }
    }

    pub fn visit(&mut self, record: &GraphPropertyRecord) -> LoadResult<()> {
        self.property(&record.key, &record.value)?;
        self.end_of_entity()
    }
}

impl ElementVisitor for GraphPropertyVisitor<'_> {
    fn property(&mut self, key: &str, raw: &JsonValue) -> LoadResult<()> {
        if let Some(value) = convert_raw(key, raw, &self.counters) {
            self.in_flight = Some((key.to_string(), value));
        }
        Ok(())
    }

    fn end_of_entity(&mut self) -> LoadResult<()> {
        if let Some((key, value)) = self.in_flight.take() {
            self.local_fragments.entry(key).or_default().push(value);
        }
        Ok(())
    }

    fn reset(&mut self) {
        self.in_flight = None;
    }

    fn close(&mut self) -> LoadResult<()> {
        for (key, values) in std::mem::take(&mut self.local_fragments) {
            self.builder.add_fragment(&key, values);
        }
        Ok(())
    }
}
