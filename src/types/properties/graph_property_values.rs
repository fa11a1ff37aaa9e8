//! Graph-level property storage.

use crate::types::ValueType;
use crate::values::GdsValue;
use std::sync::Arc;

/// All values observed for one graph property key, in merge order.
///
/// A graph property is a stream of values rather than a single scalar: every
/// input row contributes one value, and worker-local fragments are folded
/// left to right at build time.
#[derive(Clone, Debug)]
pub enum GraphPropertyValues {
    Longs(Vec<i64>),
    Doubles(Vec<f64>),
    Booleans(Vec<bool>),
    Strings(Vec<Arc<str>>),
    LongArrays(Vec<Arc<[i64]>>),
    DoubleArrays(Vec<Arc<[f64]>>),
    FloatArrays(Vec<Arc<[f32]>>),
}

impl GraphPropertyValues {
    pub fn value_type(&self) -> ValueType {
        match self {
            GraphPropertyValues::Longs(_) => ValueType::Long,
            GraphPropertyValues::Doubles(_) => ValueType::Double,
            GraphPropertyValues::Booleans(_) => ValueType::Boolean,
            GraphPropertyValues::Strings(_) => ValueType::String,
            GraphPropertyValues::LongArrays(_) => ValueType::LongArray,
            GraphPropertyValues::DoubleArrays(_) => ValueType::DoubleArray,
            GraphPropertyValues::FloatArrays(_) => ValueType::FloatArray,
        }
    }

    pub fn value_count(&self) -> usize {
        match self {
            GraphPropertyValues::Longs(v) => v.len(),
            GraphPropertyValues::Doubles(v) => v.len(),
            GraphPropertyValues::Booleans(v) => v.len(),
            GraphPropertyValues::Strings(v) => v.len(),
            GraphPropertyValues::LongArrays(v) => v.len(),
            GraphPropertyValues::DoubleArrays(v) => v.len(),
            GraphPropertyValues::FloatArrays(v) => v.len(),
        }
    }

    pub fn values(&self) -> Vec<GdsValue> {
        match self {
            GraphPropertyValues::Longs(v) => v.iter().map(|&x| GdsValue::Long(x)).collect(),
            GraphPropertyValues::Doubles(v) => v.iter().map(|&x| GdsValue::Double(x)).collect(),
            GraphPropertyValues::Booleans(v) => v.iter().map(|&x| GdsValue::Boolean(x)).collect(),
            GraphPropertyValues::Strings(v) => v
                .iter()
                .map(|x| GdsValue::String(Arc::clone(x)))
                .collect(),
            GraphPropertyValues::LongArrays(v) => v
                .iter()
                .map(|x| GdsValue::LongArray(Arc::clone(x)))
                .collect(),
            GraphPropertyValues::DoubleArrays(v) => v
                .iter()
                .map(|x| GdsValue::DoubleArray(Arc::clone(x)))
                .collect(),
            GraphPropertyValues::FloatArrays(v) => v
                .iter()
                .map(|x| GdsValue::FloatArray(Arc::clone(x)))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_streams() {
        let values = GraphPropertyValues::Doubles(vec![1.0, 2.0]);
        assert_eq!(values.value_type(), ValueType::Double);
        assert_eq!(values.value_count(), 2);
        assert_eq!(
            values.values(),
            vec![GdsValue::Double(1.0), GdsValue::Double(2.0)]
        );
    }
}
