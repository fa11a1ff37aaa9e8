//! Fallback values used to fill unset column slots.

use crate::types::value_type::ValueType;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default value for a property when no value is present.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum DefaultValue {
    Null,
    Long(i64),
    Double(f64),
    Bool(bool),
    String(String),
    LongArray(Vec<i64>),
    DoubleArray(Vec<f64>),
    FloatArray(Vec<f32>),
}

impl DefaultValue {
    /// Creates a default value appropriate for the given value type.
    pub fn of(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Long => DefaultValue::Long(0),
            ValueType::Double | ValueType::Float => DefaultValue::Double(f64::NAN),
            ValueType::String => DefaultValue::String(String::new()),
            ValueType::Boolean => DefaultValue::Bool(false),
            ValueType::LongArray
            | ValueType::DoubleArray
            | ValueType::FloatArray
            | ValueType::StringArray
            | ValueType::BooleanArray
            | ValueType::Unknown => DefaultValue::Null,
        }
    }

    pub fn null() -> Self {
        DefaultValue::Null
    }

    pub fn long(value: i64) -> Self {
        DefaultValue::Long(value)
    }

    pub fn double(value: f64) -> Self {
        DefaultValue::Double(value)
    }

    pub fn long_value(&self) -> i64 {
        match self {
            DefaultValue::Long(v) => *v,
            DefaultValue::Double(v) if v.is_finite() => *v as i64,
            _ => 0,
        }
    }

    pub fn double_value(&self) -> f64 {
        match self {
            DefaultValue::Double(v) => *v,
            DefaultValue::Long(v) => *v as f64,
            _ => f64::NAN,
        }
    }

    pub fn bool_value(&self) -> bool {
        matches!(self, DefaultValue::Bool(true))
    }

    pub fn string_value(&self) -> Arc<str> {
        match self {
            DefaultValue::String(v) => Arc::from(v.as_str()),
            _ => Arc::from(""),
        }
    }

    pub fn long_array_value(&self) -> Arc<[i64]> {
        match self {
            DefaultValue::LongArray(v) => Arc::from(v.as_slice()),
            _ => Arc::from([] as [i64; 0]),
        }
    }

    pub fn double_array_value(&self) -> Arc<[f64]> {
        match self {
            DefaultValue::DoubleArray(v) => Arc::from(v.as_slice()),
            _ => Arc::from([] as [f64; 0]),
        }
    }

    pub fn float_array_value(&self) -> Arc<[f32]> {
        match self {
            DefaultValue::FloatArray(v) => Arc::from(v.as_slice()),
            _ => Arc::from([] as [f32; 0]),
        }
    }
}

impl std::fmt::Display for DefaultValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefaultValue::Null => write!(f, "null"),
            DefaultValue::Long(v) => write!(f, "{}", v),
            DefaultValue::Double(v) => write!(f, "{}", v),
            DefaultValue::Bool(v) => write!(f, "{}", v),
            DefaultValue::String(v) => write!(f, "\"{}\"", v),
            DefaultValue::LongArray(v) => write!(f, "{:?}", v),
            DefaultValue::DoubleArray(v) => write!(f, "{:?}", v),
            DefaultValue::FloatArray(v) => write!(f, "{:?}", v),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn of_matches_value_type() {
        assert_eq!(DefaultValue::of(ValueType::Long), DefaultValue::Long(0));
        assert!(matches!(
            DefaultValue::of(ValueType::Double),
            DefaultValue::Double(v) if v.is_nan()
        ));
        assert_eq!(
            DefaultValue::of(ValueType::Boolean),
            DefaultValue::Bool(false)
        );
        assert_eq!(DefaultValue::of(ValueType::LongArray), DefaultValue::Null);
    }

    #[test]
    fn numeric_accessors_coerce() {
        assert_eq!(DefaultValue::Long(7).double_value(), 7.0);
        assert_eq!(DefaultValue::Double(2.0).long_value(), 2);
        assert_eq!(DefaultValue::Null.long_value(), 0);
    }
}
