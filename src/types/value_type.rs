//! Closed set of property value types supported by the construction engine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Represents the data types that can be used for properties.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Long,
    Double,
    Float,
    String,
    Boolean,
    LongArray,
    DoubleArray,
    FloatArray,
    StringArray,
    BooleanArray,
    Unknown,
}

impl ValueType {
    pub fn name(self) -> &'static str {
        match self {
            ValueType::Long => "LONG",
            ValueType::Double => "DOUBLE",
            ValueType::Float => "FLOAT",
            ValueType::String => "STRING",
            ValueType::Boolean => "BOOLEAN",
            ValueType::LongArray => "LONG_ARRAY",
            ValueType::DoubleArray => "DOUBLE_ARRAY",
            ValueType::FloatArray => "FLOAT_ARRAY",
            ValueType::StringArray => "STRING_ARRAY",
            ValueType::BooleanArray => "BOOLEAN_ARRAY",
            ValueType::Unknown => "UNKNOWN",
        }
    }

    /// The token used for this type in file headers.
    pub fn csv_name(self) -> Option<&'static str> {
        match self {
            ValueType::Long => Some("long"),
            ValueType::Double => Some("double"),
            ValueType::Float => Some("float"),
            ValueType::String => Some("string"),
            ValueType::Boolean => Some("boolean"),
            ValueType::LongArray => Some("long[]"),
            ValueType::DoubleArray => Some("double[]"),
            ValueType::FloatArray => Some("float[]"),
            ValueType::StringArray => Some("string[]"),
            ValueType::BooleanArray => Some("boolean[]"),
            ValueType::Unknown => None,
        }
    }

    /// Parses a header value-type token. Unrecognized tokens yield `None`;
    /// callers surface that as an invalid-token schema error.
    pub fn from_csv_name(token: &str) -> Option<ValueType> {
        match token {
            "long" => Some(ValueType::Long),
            "double" => Some(ValueType::Double),
            "float" => Some(ValueType::Float),
            "string" => Some(ValueType::String),
            "boolean" => Some(ValueType::Boolean),
            "long[]" => Some(ValueType::LongArray),
            "double[]" => Some(ValueType::DoubleArray),
            "float[]" => Some(ValueType::FloatArray),
            "string[]" => Some(ValueType::StringArray),
            "boolean[]" => Some(ValueType::BooleanArray),
            _ => None,
        }
    }

    pub fn is_array(self) -> bool {
        matches!(
            self,
            ValueType::LongArray
                | ValueType::DoubleArray
                | ValueType::FloatArray
                | ValueType::StringArray
                | ValueType::BooleanArray
        )
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, ValueType::Long | ValueType::Double | ValueType::Float)
    }

    /// Whether a value of this type can be stored in a column of `column`.
    ///
    /// Widening conversions are allowed: integral values fit double columns,
    /// floats are stored as doubles, and long arrays fit double-array columns.
    pub fn is_compatible_with(self, column: ValueType) -> bool {
        if self == column {
            return true;
        }
        match (self, column) {
            (ValueType::Long, ValueType::Double) => true,
            (ValueType::Float, ValueType::Double) => true,
            (ValueType::Long, ValueType::Float) => true,
            (ValueType::LongArray, ValueType::DoubleArray) => true,
            (ValueType::FloatArray, ValueType::DoubleArray) => true,
            _ => false,
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_round_trip() {
        for value_type in [
            ValueType::Long,
            ValueType::Double,
            ValueType::Float,
            ValueType::String,
            ValueType::Boolean,
            ValueType::LongArray,
            ValueType::DoubleArray,
            ValueType::FloatArray,
            ValueType::StringArray,
            ValueType::BooleanArray,
        ] {
            let token = value_type.csv_name().unwrap();
            assert_eq!(ValueType::from_csv_name(token), Some(value_type));
        }
    }

    #[test]
    fn unknown_token_is_rejected() {
        assert_eq!(ValueType::from_csv_name("decimal"), None);
        assert_eq!(ValueType::from_csv_name(""), None);
        assert!(ValueType::Unknown.csv_name().is_none());
    }

    #[test]
    fn widening_compatibility() {
        assert!(ValueType::Long.is_compatible_with(ValueType::Double));
        assert!(ValueType::LongArray.is_compatible_with(ValueType::DoubleArray));
        assert!(!ValueType::String.is_compatible_with(ValueType::Long));
        assert!(!ValueType::Double.is_compatible_with(ValueType::Long));
    }
}
