//! Immutable columnar node property storage.

use crate::types::ValueType;
use crate::values::GdsValue;
use std::sync::Arc;

/// One property's values for every node, as a typed dense column.
///
/// The column length always equals the node count of the graph it was built
/// for; unset slots were filled with the property's default value at build
/// time.
#[derive(Clone, Debug)]
pub enum NodePropertyValues {
    Long(Vec<i64>),
    Double(Vec<f64>),
    Boolean(Vec<bool>),
    String(Vec<Arc<str>>),
    LongArray(Vec<Arc<[i64]>>),
    DoubleArray(Vec<Arc<[f64]>>),
    FloatArray(Vec<Arc<[f32]>>),
    StringArray(Vec<Arc<[Arc<str>]>>),
    BooleanArray(Vec<Arc<[bool]>>),
}

impl NodePropertyValues {
    pub fn value_type(&self) -> ValueType {
        match self {
            NodePropertyValues::Long(_) => ValueType::Long,
            NodePropertyValues::Double(_) => ValueType::Double,
            NodePropertyValues::Boolean(_) => ValueType::Boolean,
            NodePropertyValues::String(_) => ValueType::String,
            NodePropertyValues::LongArray(_) => ValueType::LongArray,
            NodePropertyValues::DoubleArray(_) => ValueType::DoubleArray,
            NodePropertyValues::FloatArray(_) => ValueType::FloatArray,
            NodePropertyValues::StringArray(_) => ValueType::StringArray,
            NodePropertyValues::BooleanArray(_) => ValueType::BooleanArray,
        }
    }

    pub fn element_count(&self) -> usize {
        match self {
            NodePropertyValues::Long(v) => v.len(),
            NodePropertyValues::Double(v) => v.len(),
            NodePropertyValues::Boolean(v) => v.len(),
            NodePropertyValues::String(v) => v.len(),
            NodePropertyValues::LongArray(v) => v.len(),
            NodePropertyValues::DoubleArray(v) => v.len(),
            NodePropertyValues::FloatArray(v) => v.len(),
            NodePropertyValues::StringArray(v) => v.len(),
            NodePropertyValues::BooleanArray(v) => v.len(),
        }
    }

    /// Value at `internal_id`, boxed into the runtime value enum.
    pub fn value_at(&self, internal_id: u64) -> GdsValue {
        let index = internal_id as usize;
        match self {
            NodePropertyValues::Long(v) => GdsValue::Long(v[index]),
            NodePropertyValues::Double(v) => GdsValue::Double(v[index]),
            NodePropertyValues::Boolean(v) => GdsValue::Boolean(v[index]),
            NodePropertyValues::String(v) => GdsValue::String(Arc::clone(&v[index])),
            NodePropertyValues::LongArray(v) => GdsValue::LongArray(Arc::clone(&v[index])),
            NodePropertyValues::DoubleArray(v) => GdsValue::DoubleArray(Arc::clone(&v[index])),
            NodePropertyValues::FloatArray(v) => GdsValue::FloatArray(Arc::clone(&v[index])),
            NodePropertyValues::StringArray(v) => GdsValue::StringArray(Arc::clone(&v[index])),
            NodePropertyValues::BooleanArray(v) => GdsValue::BooleanArray(Arc::clone(&v[index])),
        }
    }

    pub fn long_value(&self, internal_id: u64) -> Option<i64> {
        match self {
            NodePropertyValues::Long(v) => Some(v[internal_id as usize]),
            _ => None,
        }
    }

    pub fn double_value(&self, internal_id: u64) -> Option<f64> {
        match self {
            NodePropertyValues::Double(v) => Some(v[internal_id as usize]),
            NodePropertyValues::Long(v) => Some(v[internal_id as usize] as f64),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_access() {
        let column = NodePropertyValues::Long(vec![1, 2, 3]);
        assert_eq!(column.value_type(), ValueType::Long);
        assert_eq!(column.element_count(), 3);
        assert_eq!(column.long_value(1), Some(2));
        assert_eq!(column.double_value(1), Some(2.0));
        assert_eq!(column.value_at(2), GdsValue::Long(3));
    }

    #[test]
    fn double_column_rejects_long_access() {
        let column = NodePropertyValues::Double(vec![1.5]);
        assert_eq!(column.long_value(0), None);
        assert_eq!(column.double_value(0), Some(1.5));
    }
}
