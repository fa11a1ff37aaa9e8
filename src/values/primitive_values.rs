use crate::values::GdsValue;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Factory turning raw boundary values into typed [`GdsValue`]s.
///
/// Numbers infer the tightest variant: integral values become `Long`,
/// everything else `Double`. Homogeneous arrays infer the matching array
/// variant; an integer mixed into a float array widens the whole array to
/// `DoubleArray`.
pub struct PrimitiveValues;

impl PrimitiveValues {
    /// Non-panicking conversion; returns `None` for values the engine cannot
    /// represent (nulls, objects, heterogeneous arrays).
    pub fn of(input: &JsonValue) -> Option<GdsValue> {
        match input {
            JsonValue::Bool(b) => Some(GdsValue::Boolean(*b)),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(GdsValue::Long(i))
                } else {
                    n.as_f64().map(GdsValue::Double)
                }
            }
            JsonValue::String(s) => Some(GdsValue::String(Arc::from(s.as_str()))),
            JsonValue::Array(items) => Self::array_of(items),
            JsonValue::Null | JsonValue::Object(_) => None,
        }
    }

    fn array_of(items: &[JsonValue]) -> Option<GdsValue> {
        if items.is_empty() {
            return Some(GdsValue::LongArray(Arc::from([] as [i64; 0])));
        }

        match &items[0] {
            JsonValue::Number(_) => Self::numeric_array_of(items),
            JsonValue::Bool(_) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(item.as_bool()?);
                }
                Some(GdsValue::BooleanArray(Arc::from(values.as_slice())))
            }
            JsonValue::String(_) => {
                let mut values: Vec<Arc<str>> = Vec::with_capacity(items.len());
                for item in items {
                    values.push(Arc::from(item.as_str()?));
                }
                Some(GdsValue::StringArray(Arc::from(values.as_slice())))
            }
            _ => None,
        }
    }

    fn numeric_array_of(items: &[JsonValue]) -> Option<GdsValue> {
        let mut all_integral = true;
        for item in items {
            match item {
                JsonValue::Number(n) => {
                    if n.as_i64().is_none() {
                        all_integral = false;
                    }
                }
                _ => return None,
            }
        }

        if all_integral {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(item.as_i64()?);
            }
            Some(GdsValue::LongArray(Arc::from(values.as_slice())))
        } else {
            let mut values = Vec::with_capacity(items.len());
            for item in items {
                values.push(item.as_f64()?);
            }
            Some(GdsValue::DoubleArray(Arc::from(values.as_slice())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalars_infer_tightest_variant() {
        assert_eq!(PrimitiveValues::of(&json!(42)), Some(GdsValue::Long(42)));
        assert_eq!(
            PrimitiveValues::of(&json!(1.5)),
            Some(GdsValue::Double(1.5))
        );
        assert_eq!(
            PrimitiveValues::of(&json!(true)),
            Some(GdsValue::Boolean(true))
        );
        assert_eq!(PrimitiveValues::of(&json!("a")), Some(GdsValue::from("a")));
    }

    #[test]
    fn integral_arrays_become_long_arrays() {
        let value = PrimitiveValues::of(&json!([1, 2, 3])).unwrap();
        assert_eq!(value, GdsValue::from(vec![1i64, 2, 3]));
    }

    #[test]
    fn mixed_numeric_arrays_widen_to_double() {
        let value = PrimitiveValues::of(&json!([1, 2.5])).unwrap();
        assert_eq!(value, GdsValue::from(vec![1.0, 2.5]));
    }

    #[test]
    fn unsupported_values_are_rejected() {
        assert_eq!(PrimitiveValues::of(&json!(null)), None);
        assert_eq!(PrimitiveValues::of(&json!({"a": 1})), None);
        assert_eq!(PrimitiveValues::of(&json!([1, "x"])), None);
    }
}
