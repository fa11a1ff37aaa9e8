//! Runtime property values.
//!
//! The engine works with a small closed set of value variants. Raw input
//! values arrive as `serde_json::Value` at the file boundary and are
//! converted once by [`PrimitiveValues`]; everything downstream is typed.

mod gds_value;
mod primitive_values;
mod property_values;

pub use gds_value::GdsValue;
pub use primitive_values::PrimitiveValues;
pub use property_values::PropertyValues;
