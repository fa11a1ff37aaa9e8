pub mod default_value;
pub mod graph;
pub mod graph_store;
pub mod properties;
pub mod property_state;
pub mod schema;
pub mod value_type;

pub use default_value::DefaultValue;
pub use property_state::PropertyState;
pub use value_type::ValueType;
