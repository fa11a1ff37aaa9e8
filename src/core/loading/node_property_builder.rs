//! Columnar accumulators for node properties.
//!
//! One builder exists per property key across all workers. Builders are
//! created under a registry lock on first sight of a key; value writes from
//! a batch target distinct internal ids, so they only contend on the
//! column's own short-lived lock.

use crate::types::properties::NodePropertyValues;
use crate::types::schema::{PropertySchema, SchemaError, SchemaResult};
use crate::types::{DefaultValue, PropertyState, ValueType};
use crate::values::GdsValue;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::Arc;

enum ColumnData {
    Long(Vec<Option<i64>>),
    Double(Vec<Option<f64>>),
    Boolean(Vec<Option<bool>>),
    String(Vec<Option<Arc<str>>>),
    LongArray(Vec<Option<Arc<[i64]>>>),
    DoubleArray(Vec<Option<Arc<[f64]>>>),
    FloatArray(Vec<Option<Arc<[f32]>>>),
    StringArray(Vec<Option<Arc<[Arc<str>]>>>),
    BooleanArray(Vec<Option<Arc<[bool]>>>),
}

impl ColumnData {
    fn for_type(key: &str, value_type: ValueType) -> SchemaResult<ColumnData> {
        let data = match value_type {
            ValueType::Long => ColumnData::Long(Vec::new()),
            // Scalar floats are stored widened to double.
            ValueType::Double | ValueType::Float => ColumnData::Double(Vec::new()),
            ValueType::Boolean => ColumnData::Boolean(Vec::new()),
            ValueType::String => ColumnData::String(Vec::new()),
            ValueType::LongArray => ColumnData::LongArray(Vec::new()),
            ValueType::DoubleArray => ColumnData::DoubleArray(Vec::new()),
            ValueType::FloatArray => ColumnData::FloatArray(Vec::new()),
            ValueType::StringArray => ColumnData::StringArray(Vec::new()),
            ValueType::BooleanArray => ColumnData::BooleanArray(Vec::new()),
            ValueType::Unknown => {
                return Err(SchemaError::InvalidOperation {
                    message: format!("property '{key}' cannot use the UNKNOWN value type"),
                })
            }
        };
        Ok(data)
    }
}

fn place<T>(slots: &mut Vec<Option<T>>, index: usize, value: T) {
    if index >= slots.len() {
        slots.resize_with(index + 1, || None);
    }
    slots[index] = Some(value);
}

/// Accumulates one property column during the insert phase.
pub struct NodePropertyColumnBuilder {
    key: String,
    value_type: ValueType,
    default_value: DefaultValue,
    state: PropertyState,
    data: Mutex<ColumnData>,
}

impl NodePropertyColumnBuilder {
    pub fn new(
        key: impl Into<String>,
        value_type: ValueType,
        default_value: DefaultValue,
        state: PropertyState,
    ) -> SchemaResult<Self> {
        let key = key.into();
        let data = ColumnData::for_type(&key, value_type)?;
        Ok(Self {
            key,
            value_type,
            default_value,
            state,
            data: Mutex::new(data),
        })
    }

    pub fn from_schema(schema: &PropertySchema) -> SchemaResult<Self> {
        Self::new(
            schema.key(),
            schema.value_type(),
            schema.default_value().clone(),
            schema.state(),
        )
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    fn mismatch(&self, actual: ValueType) -> SchemaError {
        SchemaError::IncompatibleValueType {
            key: self.key.clone(),
            expected: self.value_type,
            actual,
        }
    }

    /// Writes `value` at `internal_id`, coercing compatible types.
    pub fn set(&self, internal_id: u64, value: &GdsValue) -> SchemaResult<()> {
        let index = internal_id as usize;
        let mut data = self.data.lock();
        match (&mut *data, value) {
            (ColumnData::Long(slots), GdsValue::Long(v)) => place(slots, index, *v),
            (ColumnData::Double(slots), GdsValue::Double(v)) => place(slots, index, *v),
            (ColumnData::Double(slots), GdsValue::Long(v)) => place(slots, index, *v as f64),
            (ColumnData::Boolean(slots), GdsValue::Boolean(v)) => place(slots, index, *v),
            (ColumnData::String(slots), GdsValue::String(v)) => {
                place(slots, index, Arc::clone(v))
            }
            (ColumnData::LongArray(slots), GdsValue::LongArray(v)) => {
                place(slots, index, Arc::clone(v))
            }
            (ColumnData::DoubleArray(slots), GdsValue::DoubleArray(v)) => {
                place(slots, index, Arc::clone(v))
            }
            (ColumnData::DoubleArray(slots), GdsValue::LongArray(v)) => {
                let widened: Arc<[f64]> = v.iter().map(|&x| x as f64).collect();
                place(slots, index, widened)
            }
            (ColumnData::DoubleArray(slots), GdsValue::FloatArray(v)) => {
                let widened: Arc<[f64]> = v.iter().map(|&x| x as f64).collect();
                place(slots, index, widened)
            }
            (ColumnData::FloatArray(slots), GdsValue::FloatArray(v)) => {
                place(slots, index, Arc::clone(v))
            }
            (ColumnData::FloatArray(slots), GdsValue::DoubleArray(v)) => {
                let narrowed: Arc<[f32]> = v.iter().map(|&x| x as f32).collect();
                place(slots, index, narrowed)
            }
            (ColumnData::FloatArray(slots), GdsValue::LongArray(v)) => {
                let narrowed: Arc<[f32]> = v.iter().map(|&x| x as f32).collect();
                place(slots, index, narrowed)
            }
            (ColumnData::StringArray(slots), GdsValue::StringArray(v)) => {
                place(slots, index, Arc::clone(v))
            }
            (ColumnData::BooleanArray(slots), GdsValue::BooleanArray(v)) => {
                place(slots, index, Arc::clone(v))
            }
            _ => return Err(self.mismatch(value.value_type())),
        }
        Ok(())
    }

    /// Snapshots the accumulated column into an immutable, default-filled
    /// array of length `node_count`.
    pub fn build(&self, node_count: usize) -> (PropertySchema, NodePropertyValues) {
        let data = std::mem::replace(
            &mut *self.data.lock(),
            ColumnData::Long(Vec::new()),
        );
        let default = &self.default_value;

        fn fill<T: Clone>(
            mut slots: Vec<Option<T>>,
            node_count: usize,
            default: T,
        ) -> Vec<T> {
            slots.resize_with(node_count, || None);
            slots
                .into_iter()
                .map(|slot| slot.unwrap_or_else(|| default.clone()))
                .collect()
        }

        let values = match data {
            ColumnData::Long(slots) => {
                NodePropertyValues::Long(fill(slots, node_count, default.long_value()))
            }
            ColumnData::Double(slots) => {
                NodePropertyValues::Double(fill(slots, node_count, default.double_value()))
            }
            ColumnData::Boolean(slots) => {
                NodePropertyValues::Boolean(fill(slots, node_count, default.bool_value()))
            }
            ColumnData::String(slots) => {
                NodePropertyValues::String(fill(slots, node_count, default.string_value()))
            }
            ColumnData::LongArray(slots) => NodePropertyValues::LongArray(fill(
                slots,
                node_count,
                default.long_array_value(),
            )),
            ColumnData::DoubleArray(slots) => NodePropertyValues::DoubleArray(fill(
                slots,
                node_count,
                default.double_array_value(),
            )),
            ColumnData::FloatArray(slots) => NodePropertyValues::FloatArray(fill(
                slots,
                node_count,
                default.float_array_value(),
            )),
            ColumnData::StringArray(slots) => NodePropertyValues::StringArray(fill(
                slots,
                node_count,
                Arc::from([] as [Arc<str>; 0]),
            )),
            ColumnData::BooleanArray(slots) => NodePropertyValues::BooleanArray(fill(
                slots,
                node_count,
                Arc::from([] as [bool; 0]),
            )),
        };

        let schema = PropertySchema::new(
            self.key.clone(),
            self.value_type,
            self.default_value.clone(),
            self.state,
        );
        (schema, values)
    }
}

/// Registry of column builders, one per property key.
pub struct NodePropertyBuilders {
    fixed_schema: Option<HashMap<String, PropertySchema>>,
    builders: RwLock<HashMap<String, Arc<NodePropertyColumnBuilder>>>,
    property_state: PropertyState,
}

impl NodePropertyBuilders {
    /// Lazy mode: the first observation of a key defines its column type.
    pub fn lazy(property_state: PropertyState) -> Self {
        Self {
            fixed_schema: None,
            builders: RwLock::new(HashMap::new()),
            property_state,
        }
    }

    /// Fixed mode: keys must appear in `schema` (the union of all per-label
    /// property schemas) and columns take their declared types.
    pub fn fixed(schema: HashMap<String, PropertySchema>, property_state: PropertyState) -> Self {
        Self {
            fixed_schema: Some(schema),
            builders: RwLock::new(HashMap::new()),
            property_state,
        }
    }

    pub fn is_fixed(&self) -> bool {
        self.fixed_schema.is_some()
    }

    fn builder_for(&self, key: &str, value: &GdsValue) -> SchemaResult<Arc<NodePropertyColumnBuilder>> {
        if let Some(builder) = self.builders.read().get(key) {
            return Ok(Arc::clone(builder));
        }

        let mut builders = self.builders.write();
        if let Some(builder) = builders.get(key) {
            return Ok(Arc::clone(builder));
        }

        let builder = match &self.fixed_schema {
            Some(schema) => {
                let declared = schema.get(key).ok_or_else(|| SchemaError::UnknownProperty {
                    key: key.to_string(),
                    element: "node".to_string(),
                })?;
                Arc::new(NodePropertyColumnBuilder::from_schema(declared)?)
            }
            None => {
                let value_type = value.value_type();
                Arc::new(NodePropertyColumnBuilder::new(
                    key,
                    value_type,
                    DefaultValue::of(value_type),
                    self.property_state,
                )?)
            }
        };
        builders.insert(key.to_string(), Arc::clone(&builder));
        Ok(builder)
    }

    /// Routes one value into its column.
    pub fn set(&self, internal_id: u64, key: &str, value: &GdsValue) -> SchemaResult<()> {
        self.builder_for(key, value)?.set(internal_id, value)
    }

    /// Column type for `key`, if a column exists already.
    pub fn value_type_of(&self, key: &str) -> Option<ValueType> {
        self.builders.read().get(key).map(|b| b.value_type())
    }

    /// Builds every column at `node_count` length.
    ///
    /// In fixed mode, schema keys that were never observed in the data fail
    /// with a missing-properties error listing each key.
    pub fn build(
        &self,
        node_count: usize,
    ) -> SchemaResult<HashMap<String, (PropertySchema, NodePropertyValues)>> {
        let builders = std::mem::take(&mut *self.builders.write());

        if let Some(schema) = &self.fixed_schema {
            let mut missing: Vec<String> = schema
                .keys()
                .filter(|key| !builders.contains_key(*key))
                .cloned()
                .collect();
            if !missing.is_empty() {
                missing.sort();
                return Err(SchemaError::MissingProperties { keys: missing });
            }
        }

        Ok(builders
            .into_iter()
            .map(|(key, builder)| (key, builder.build(node_count)))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lazy_columns_infer_type_from_first_value() {
        let builders = NodePropertyBuilders::lazy(PropertyState::Persistent);
        builders.set(0, "age", &GdsValue::Long(30)).unwrap();
        builders.set(1, "age", &GdsValue::Long(31)).unwrap();

        assert_eq!(builders.value_type_of("age"), Some(ValueType::Long));

        let mut columns = builders.build(3).unwrap();
        let (schema, values) = columns.remove("age").unwrap();
        assert_eq!(schema.value_type(), ValueType::Long);
        assert_eq!(values.element_count(), 3);
        assert_eq!(values.long_value(1), Some(31));
        // Unset slot filled with the type default.
        assert_eq!(values.long_value(2), Some(0));
    }

    #[test]
    fn long_values_widen_into_double_columns() {
        let builders = NodePropertyBuilders::lazy(PropertyState::Persistent);
        builders.set(0, "score", &GdsValue::Double(1.5)).unwrap();
        builders.set(1, "score", &GdsValue::Long(2)).unwrap();

        let mut columns = builders.build(2).unwrap();
        let (_, values) = columns.remove("score").unwrap();
        assert_eq!(values.double_value(1), Some(2.0));
    }

    #[test]
    fn incompatible_value_aborts_the_row() {
        let builders = NodePropertyBuilders::lazy(PropertyState::Persistent);
        builders.set(0, "age", &GdsValue::Long(30)).unwrap();

        let result = builders.set(1, "age", &GdsValue::from("thirty"));
        assert!(matches!(
            result,
            Err(SchemaError::IncompatibleValueType { .. })
        ));
    }

    #[test]
    fn fixed_mode_rejects_unknown_keys() {
        let mut schema = HashMap::new();
        schema.insert(
            "name".to_string(),
            PropertySchema::of("name", ValueType::String),
        );
        let builders = NodePropertyBuilders::fixed(schema, PropertyState::Persistent);

        builders.set(0, "name", &GdsValue::from("x")).unwrap();
        let result = builders.set(0, "age", &GdsValue::Long(30));
        assert!(matches!(result, Err(SchemaError::UnknownProperty { key, .. }) if key == "age"));
    }

    #[test]
    fn unknown_typed_schema_is_rejected_at_column_creation() {
        let mut schema = HashMap::new();
        schema.insert(
            "mystery".to_string(),
            PropertySchema::of("mystery", ValueType::Unknown),
        );
        let builders = NodePropertyBuilders::fixed(schema, PropertyState::Persistent);

        let result = builders.set(0, "mystery", &GdsValue::Long(1));
        assert!(matches!(result, Err(SchemaError::InvalidOperation { .. })));
    }

    #[test]
    fn fixed_mode_reports_missing_properties_at_build() {
        let mut schema = HashMap::new();
        schema.insert(
            "name".to_string(),
            PropertySchema::of("name", ValueType::String),
        );
        schema.insert(
            "age".to_string(),
            PropertySchema::of("age", ValueType::Long),
        );
        let builders = NodePropertyBuilders::fixed(schema, PropertyState::Persistent);
        builders.set(0, "name", &GdsValue::from("x")).unwrap();

        let result = builders.build(1);
        assert!(
            matches!(result, Err(SchemaError::MissingProperties { keys }) if keys == vec!["age".to_string()])
        );
    }

    #[test]
    fn array_columns_fill_defaults_with_empty_arrays() {
        let builders = NodePropertyBuilders::lazy(PropertyState::Persistent);
        builders
            .set(0, "embedding", &GdsValue::from(vec![1.0, 2.0]))
            .unwrap();

        let mut columns = builders.build(2).unwrap();
        let (_, values) = columns.remove("embedding").unwrap();
        match values.value_at(1) {
            GdsValue::DoubleArray(arr) => assert!(arr.is_empty()),
            other => panic!("unexpected value {other:?}"),
        }
    }
}
