//! Record streams supplied by file readers.

use crate::types::schema::{NodeSchema, PropertySchema, RelationshipSchema};
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use std::collections::HashMap;

/// One node row: external id, label names, raw property values.
#[derive(Clone, Debug)]
pub struct NodeRecord {
    pub id: i64,
    pub labels: Vec<String>,
    pub properties: Vec<(String, JsonValue)>,
}

/// One relationship row.
#[derive(Clone, Debug)]
pub struct RelationshipRecord {
    pub start_id: i64,
    pub end_id: i64,
    pub relationship_type: String,
    pub properties: Vec<(String, JsonValue)>,
}

/// One graph-property row.
#[derive(Clone, Debug)]
pub struct GraphPropertyRecord {
    pub key: String,
    pub value: JsonValue,
}

/// Single-producer multi-consumer chunk iterator.
///
/// Workers call [`next_chunk`](Self::next_chunk) concurrently; the underlying
/// reader iterator is advanced under a mutex, one chunk at a time.
pub struct InputChunks<R> {
    inner: Mutex<Box<dyn Iterator<Item = Vec<R>> + Send>>,
}

impl<R> InputChunks<R> {
    pub fn new(chunks: impl Iterator<Item = Vec<R>> + Send + 'static) -> Self {
        Self {
            inner: Mutex::new(Box::new(chunks)),
        }
    }

    pub fn from_chunks(chunks: Vec<Vec<R>>) -> Self
    where
        R: Send + 'static,
    {
        Self::new(chunks.into_iter())
    }

    /// Claims the next chunk, or `None` once the stream is exhausted.
    pub fn next_chunk(&self) -> Option<Vec<R>> {
        self.inner.lock().next()
    }
}

/// Contract the engine expects from a file reader.
///
/// Each stream method returns a fresh, restartable chunk iterator. Schema
/// methods return `Some` when the reader parsed an authoritative schema
/// (fixed mode) and `None` when the engine should discover it (lazy mode).
pub trait FileInput: Send + Sync {
    fn nodes(&self) -> InputChunks<NodeRecord>;
    fn relationships(&self) -> InputChunks<RelationshipRecord>;
    fn graph_properties(&self) -> InputChunks<GraphPropertyRecord>;

    fn node_schema(&self) -> Option<NodeSchema>;
    fn relationship_schema(&self) -> Option<RelationshipSchema>;
    fn graph_property_schema(&self) -> Option<HashMap<String, PropertySchema>>;
}

/// In-memory [`FileInput`] used by tests and demos.
#[derive(Default)]
pub struct InMemoryFileInput {
    nodes: Vec<NodeRecord>,
    relationships: Vec<RelationshipRecord>,
    graph_properties: Vec<GraphPropertyRecord>,
    chunk_size: usize,
    node_schema: Option<NodeSchema>,
    relationship_schema: Option<RelationshipSchema>,
    graph_property_schema: Option<HashMap<String, PropertySchema>>,
}

impl InMemoryFileInput {
    pub fn new() -> Self {
        Self {
            chunk_size: 1024,
            ..Self::default()
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn add_node(mut self, record: NodeRecord) -> Self {
        self.nodes.push(record);
        self
    }

    pub fn add_relationship(mut self, record: RelationshipRecord) -> Self {
        self.relationships.push(record);
        self
    }

    pub fn add_graph_property(mut self, record: GraphPropertyRecord) -> Self {
        self.graph_properties.push(record);
        self
    }

    pub fn node_schema(mut self, schema: NodeSchema) -> Self {
        self.node_schema = Some(schema);
        self
    }

    pub fn relationship_schema(mut self, schema: RelationshipSchema) -> Self {
        self.relationship_schema = Some(schema);
        self
    }

    pub fn graph_property_schema(mut self, schema: HashMap<String, PropertySchema>) -> Self {
        self.graph_property_schema = Some(schema);
        self
    }

    fn chunked<R: Clone + Send + 'static>(records: &[R], chunk_size: usize) -> InputChunks<R> {
        let chunks: Vec<Vec<R>> = records
            .chunks(chunk_size.max(1))
            .map(|chunk| chunk.to_vec())
            .collect();
        InputChunks::from_chunks(chunks)
    }
}

impl FileInput for InMemoryFileInput {
    fn nodes(&self) -> InputChunks<NodeRecord> {
        Self::chunked(&self.nodes, self.chunk_size)
    }

    fn relationships(&self) -> InputChunks<RelationshipRecord> {
        Self::chunked(&self.relationships, self.chunk_size)
    }

    fn graph_properties(&self) -> InputChunks<GraphPropertyRecord> {
        Self::chunked(&self.graph_properties, self.chunk_size)
    }

    fn node_schema(&self) -> Option<NodeSchema> {
        self.node_schema.clone()
    }

    fn relationship_schema(&self) -> Option<RelationshipSchema> {
        self.relationship_schema.clone()
    }

    fn graph_property_schema(&self) -> Option<HashMap<String, PropertySchema>> {
        self.graph_property_schema.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn chunk_iterator_is_exclusive_and_exhaustive() {
        let chunks = InputChunks::from_chunks(vec![vec![1, 2], vec![3], vec![4, 5]]);
        let mut seen = Vec::new();
        while let Some(chunk) = chunks.next_chunk() {
            seen.extend(chunk);
        }
        assert_eq!(seen, vec![1, 2, 3, 4, 5]);
        assert!(chunks.next_chunk().is_none());
    }

    #[test]
    fn in_memory_input_is_restartable() {
        let input = InMemoryFileInput::new().chunk_size(1).add_node(NodeRecord {
            id: 0,
            labels: vec!["Person".to_string()],
            properties: vec![("age".to_string(), json!(30))],
        });

        for _ in 0..2 {
            let stream = input.nodes();
            let chunk = stream.next_chunk().unwrap();
            assert_eq!(chunk.len(), 1);
            assert_eq!(chunk[0].id, 0);
            assert!(stream.next_chunk().is_none());
        }
    }

    #[test]
    fn concurrent_consumers_partition_the_chunks() {
        use std::sync::Arc;

        let chunks: Vec<Vec<u64>> = (0..100u64).map(|i| vec![i]).collect();
        let stream = Arc::new(InputChunks::from_chunks(chunks));
        let total = Arc::new(parking_lot::Mutex::new(Vec::new()));

        std::thread::scope(|s| {
            for _ in 0..4 {
                let stream = Arc::clone(&stream);
                let total = Arc::clone(&total);
                s.spawn(move || {
                    while let Some(chunk) = stream.next_chunk() {
                        total.lock().extend(chunk);
                    }
                });
            }
        });

        let mut seen = total.lock().clone();
        seen.sort_unstable();
        assert_eq!(seen, (0..100).collect::<Vec<_>>());
    }
}
