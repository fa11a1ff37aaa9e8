use crate::types::ValueType;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// A single typed property value.
///
/// Array payloads are reference counted so values can be shared between the
/// per-worker buffers and the final columns without copying.
#[derive(Clone, Debug, PartialEq)]
pub enum GdsValue {
    Long(i64),
    Double(f64),
    Boolean(bool),
    String(Arc<str>),
    LongArray(Arc<[i64]>),
    DoubleArray(Arc<[f64]>),
    FloatArray(Arc<[f32]>),
    StringArray(Arc<[Arc<str>]>),
    BooleanArray(Arc<[bool]>),
}

impl GdsValue {
    pub fn value_type(&self) -> ValueType {
        match self {
            GdsValue::Long(_) => ValueType::Long,
            GdsValue::Double(_) => ValueType::Double,
            GdsValue::Boolean(_) => ValueType::Boolean,
            GdsValue::String(_) => ValueType::String,
            GdsValue::LongArray(_) => ValueType::LongArray,
            GdsValue::DoubleArray(_) => ValueType::DoubleArray,
            GdsValue::FloatArray(_) => ValueType::FloatArray,
            GdsValue::StringArray(_) => ValueType::StringArray,
            GdsValue::BooleanArray(_) => ValueType::BooleanArray,
        }
    }

    /// The numeric value as a long, when this is an integral value.
    pub fn as_long(&self) -> Option<i64> {
        match self {
            GdsValue::Long(v) => Some(*v),
            _ => None,
        }
    }

    /// The numeric value widened to a double.
    pub fn as_double(&self) -> Option<f64> {
        match self {
            GdsValue::Double(v) => Some(*v),
            GdsValue::Long(v) => Some(*v as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            GdsValue::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            GdsValue::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_json(&self) -> JsonValue {
        match self {
            GdsValue::Long(v) => JsonValue::from(*v),
            GdsValue::Double(v) => JsonValue::from(*v),
            GdsValue::Boolean(v) => JsonValue::from(*v),
            GdsValue::String(v) => JsonValue::from(v.to_string()),
            GdsValue::LongArray(v) => JsonValue::from(v.to_vec()),
            GdsValue::DoubleArray(v) => JsonValue::from(v.to_vec()),
            GdsValue::FloatArray(v) => JsonValue::from(v.to_vec()),
            GdsValue::StringArray(v) => {
                JsonValue::from(v.iter().map(|s| s.to_string()).collect::<Vec<_>>())
            }
            GdsValue::BooleanArray(v) => JsonValue::from(v.to_vec()),
        }
    }
}

impl From<i64> for GdsValue {
    fn from(value: i64) -> Self {
        GdsValue::Long(value)
    }
}

impl From<f64> for GdsValue {
    fn from(value: f64) -> Self {
        GdsValue::Double(value)
    }
}

impl From<bool> for GdsValue {
    fn from(value: bool) -> Self {
        GdsValue::Boolean(value)
    }
}

impl From<&str> for GdsValue {
    fn from(value: &str) -> Self {
        GdsValue::String(Arc::from(value))
    }
}

impl From<Vec<i64>> for GdsValue {
    fn from(value: Vec<i64>) -> Self {
        GdsValue::LongArray(Arc::from(value.as_slice()))
    }
}

impl From<Vec<f64>> for GdsValue {
    fn from(value: Vec<f64>) -> Self {
        GdsValue::DoubleArray(Arc::from(value.as_slice()))
    }
}

impl std::fmt::Display for GdsValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_types_match_variants() {
        assert_eq!(GdsValue::Long(1).value_type(), ValueType::Long);
        assert_eq!(GdsValue::from(1.5).value_type(), ValueType::Double);
        assert_eq!(GdsValue::from("x").value_type(), ValueType::String);
        assert_eq!(
            GdsValue::from(vec![1i64, 2]).value_type(),
            ValueType::LongArray
        );
    }

    #[test]
    fn numeric_widening() {
        assert_eq!(GdsValue::Long(3).as_double(), Some(3.0));
        assert_eq!(GdsValue::Double(3.5).as_long(), None);
        assert_eq!(GdsValue::from("x").as_double(), None);
    }
}
