//! Accumulation of graph-level properties from worker-local fragments.

use crate::core::loading::counters::ImportCounters;
use crate::core::loading::error::{ImportError, LoadResult};
use crate::types::properties::GraphPropertyValues;
use crate::types::schema::{PropertySchema, SchemaError};
use crate::types::{PropertyState, ValueType};
use crate::values::GdsValue;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Collects per-key value streams for the whole graph.
///
/// Workers push fragments (their locally accumulated value runs); `build`
/// folds the fragments left to right per key. The fold is concatenation and
/// therefore associative: interleavings of worker fragments produce
/// equivalent streams for commutative consumers.
pub struct GraphPropertyBuilder {
    fixed_schema: Option<HashMap<String, PropertySchema>>,
    fragments: Mutex<HashMap<String, Vec<Vec<GdsValue>>>>,
    counters: Arc<ImportCounters>,
}

impl GraphPropertyBuilder {
    pub fn lazy(counters: Arc<ImportCounters>) -> Self {
        Self {
            fixed_schema: None,
            fragments: Mutex::new(HashMap::new()),
            counters,
        }
    }

    pub fn fixed(
        schema: HashMap<String, PropertySchema>,
        counters: Arc<ImportCounters>,
    ) -> Self {
        Self {
            fixed_schema: Some(schema),
            fragments: Mutex::new(HashMap::new()),
            counters,
        }
    }

    /// Merges one worker-local fragment. Keys not present in a fixed schema
    /// are dropped.
    pub fn add_fragment(&self, key: &str, values: Vec<GdsValue>) {
        if values.is_empty() {
            return;
        }
        if let Some(schema) = &self.fixed_schema {
            if !schema.contains_key(key) {
                log::debug!("dropping undeclared graph property '{key}'");
                return;
            }
        }
        self.counters.add_graph_property_values(values.len() as u64);
        self.fragments
            .lock()
            .entry(key.to_string())
            .or_default()
            .push(values);
    }

    /// Folds all fragments into typed value streams.
    #[allow(clippy::type_complexity)]
    pub fn build(
        self,
    ) -> LoadResult<(
        HashMap<String, PropertySchema>,
        HashMap<String, Arc<GraphPropertyValues>>,
    )> {
        let fragments = std::mem::take(&mut *self.fragments.lock());
        let mut schemas = HashMap::with_capacity(fragments.len());
        let mut values = HashMap::with_capacity(fragments.len());

        for (key, runs) in fragments {
            let flattened: Vec<GdsValue> = runs.into_iter().flatten().collect();
            let declared = self
                .fixed_schema
                .as_ref()
                .and_then(|schema| schema.get(&key))
                .map(|schema| schema.value_type());
            let folded = fold_values(&key, declared, flattened)?;

            schemas.insert(
                key.clone(),
                PropertySchema::new(
                    key.clone(),
                    folded.value_type(),
                    crate::types::DefaultValue::of(folded.value_type()),
                    PropertyState::Persistent,
                ),
            );
            values.insert(key, Arc::new(folded));
        }

        Ok((schemas, values))
    }
}

/// Concatenates a value stream into its typed representation.
///
/// Mixed Long and Double scalars widen to a double stream; any other mix is
/// a type mismatch.
fn fold_values(
    key: &str,
    declared: Option<ValueType>,
    values: Vec<GdsValue>,
) -> LoadResult<GraphPropertyValues> {
    let mismatch = |actual: ValueType, expected: ValueType| {
        ImportError::Schema(SchemaError::IncompatibleValueType {
            key: key.to_string(),
            expected,
            actual,
        })
    };

    let target = declared.unwrap_or_else(|| {
        let mut inferred = values[0].value_type();
        if inferred == ValueType::Long
            && values
                .iter()
                .any(|value| value.value_type() == ValueType::Double)
        {
            inferred = ValueType::Double;
        }
        inferred
    });

    match target {
        ValueType::Long => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                stream.push(
                    value
                        .as_long()
                        .ok_or_else(|| mismatch(value.value_type(), target))?,
                );
            }
            Ok(GraphPropertyValues::Longs(stream))
        }
        ValueType::Double | ValueType::Float => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                stream.push(
                    value
                        .as_double()
                        .ok_or_else(|| mismatch(value.value_type(), target))?,
                );
            }
            Ok(GraphPropertyValues::Doubles(stream))
        }
        ValueType::Boolean => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                stream.push(
                    value
                        .as_bool()
                        .ok_or_else(|| mismatch(value.value_type(), target))?,
                );
            }
            Ok(GraphPropertyValues::Booleans(stream))
        }
        ValueType::String => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                match value {
                    GdsValue::String(s) => stream.push(Arc::clone(s)),
                    other => return Err(mismatch(other.value_type(), target)),
                }
            }
            Ok(GraphPropertyValues::Strings(stream))
        }
        ValueType::LongArray => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                match value {
                    GdsValue::LongArray(array) => stream.push(Arc::clone(array)),
                    other => return Err(mismatch(other.value_type(), target)),
                }
            }
            Ok(GraphPropertyValues::LongArrays(stream))
        }
        ValueType::DoubleArray => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                match value {
                    GdsValue::DoubleArray(array) => stream.push(Arc::clone(array)),
                    GdsValue::LongArray(array) => {
                        stream.push(array.iter().map(|&x| x as f64).collect())
                    }
                    other => return Err(mismatch(other.value_type(), target)),
                }
            }
            Ok(GraphPropertyValues::DoubleArrays(stream))
        }
        ValueType::FloatArray => {
            let mut stream = Vec::with_capacity(values.len());
            for value in &values {
                match value {
                    GdsValue::FloatArray(array) => stream.push(Arc::clone(array)),
                    GdsValue::DoubleArray(array) => {
                        stream.push(array.iter().map(|&x| x as f32).collect())
                    }
                    GdsValue::LongArray(array) => {
                        stream.push(array.iter().map(|&x| x as f32).collect())
                    }
                    other => return Err(mismatch(other.value_type(), target)),
                }
            }
            Ok(GraphPropertyValues::FloatArrays(stream))
        }
        other => Err(mismatch(values[0].value_type(), other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn builder() -> GraphPropertyBuilder {
        GraphPropertyBuilder::lazy(Arc::new(ImportCounters::new()))
    }

    #[test]
    fn fragments_concatenate_in_merge_order() {
        let builder = builder();
        builder.add_fragment("ranks", vec![GdsValue::Double(1.0)]);
        builder.add_fragment("ranks", vec![GdsValue::Double(2.0), GdsValue::Double(3.0)]);

        let (schemas, values) = builder.build().unwrap();
        assert_eq!(schemas.get("ranks").unwrap().value_type(), ValueType::Double);
        match values.get("ranks").unwrap().as_ref() {
            GraphPropertyValues::Doubles(stream) => assert_eq!(stream, &vec![1.0, 2.0, 3.0]),
            other => panic!("unexpected values {other:?}"),
        }
    }

    #[test]
    fn mixed_scalars_widen_to_double() {
        let builder = builder();
        builder.add_fragment("xs", vec![GdsValue::Long(1), GdsValue::Double(2.5)]);

        let (_, values) = builder.build().unwrap();
        match values.get("xs").unwrap().as_ref() {
            GraphPropertyValues::Doubles(stream) => assert_eq!(stream, &vec![1.0, 2.5]),
            other => panic!("unexpected values {other:?}"),
        }
    }

    #[test]
    fn type_mismatch_is_rejected() {
        let builder = builder();
        builder.add_fragment("xs", vec![GdsValue::Long(1), GdsValue::from("two")]);

        assert!(builder.build().is_err());
    }

    #[test]
    fn fixed_schema_drops_undeclared_keys() {
        let mut schema = HashMap::new();
        schema.insert(
            "declared".to_string(),
            PropertySchema::of("declared", ValueType::Long),
        );
        let counters = Arc::new(ImportCounters::new());
        let builder = GraphPropertyBuilder::fixed(schema, counters);

        builder.add_fragment("declared", vec![GdsValue::Long(1)]);
        builder.add_fragment("undeclared", vec![GdsValue::Long(2)]);

        let (_, values) = builder.build().unwrap();
        assert!(values.contains_key("declared"));
        assert!(!values.contains_key("undeclared"));
    }
}
