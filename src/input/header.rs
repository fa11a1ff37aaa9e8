//! Reference header conventions for node, relationship, and graph-property
//! files.
//!
//! Readers usually parse headers themselves and hand the engine a finished
//! schema; these helpers implement the shared `name:valueType` conventions
//! so all readers reject malformed headers the same way.

use crate::core::loading::error::{ImportError, LoadResult, StructuralError};
use crate::types::schema::SchemaError;
use crate::types::ValueType;

pub const ID_COLUMN: &str = ":ID";
pub const START_ID_COLUMN: &str = ":START_ID";
pub const END_ID_COLUMN: &str = ":END_ID";
pub const LABEL_COLUMN: &str = ":LABEL";

/// A `name:valueType` data column.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropertyColumn {
    pub name: String,
    pub value_type: ValueType,
}

/// Parsed node-file header.
#[derive(Clone, Debug)]
pub struct NodeHeader {
    pub property_columns: Vec<PropertyColumn>,
    pub has_label_column: bool,
}

/// Parsed relationship-file header.
#[derive(Clone, Debug)]
pub struct RelationshipHeader {
    pub property_columns: Vec<PropertyColumn>,
}

fn parse_property_column(column: &str) -> LoadResult<PropertyColumn> {
    let (name, type_token) = column.split_once(':').ok_or_else(|| {
        ImportError::Schema(SchemaError::InvalidValueTypeToken {
            token: column.to_string(),
        })
    })?;
    let value_type = ValueType::from_csv_name(type_token).ok_or_else(|| {
        ImportError::Schema(SchemaError::InvalidValueTypeToken {
            token: type_token.to_string(),
        })
    })?;
    Ok(PropertyColumn {
        name: name.to_string(),
        value_type,
    })
}

fn expect_column(columns: &[&str], index: usize, expected: &str) -> LoadResult<()> {
    let found = columns.get(index).copied().unwrap_or("");
    if found != expected {
        return Err(ImportError::Structural(StructuralError::InvalidHeader {
            expected: expected.to_string(),
            found: found.to_string(),
        }));
    }
    Ok(())
}

/// Node header: `:ID` first, data columns, optionally a trailing `:LABEL`.
pub fn parse_node_header(columns: &[&str]) -> LoadResult<NodeHeader> {
    expect_column(columns, 0, ID_COLUMN)?;

    let mut property_columns = Vec::new();
    let mut has_label_column = false;
    for column in &columns[1..] {
        if *column == LABEL_COLUMN {
            has_label_column = true;
            continue;
        }
        property_columns.push(parse_property_column(column)?);
    }
    Ok(NodeHeader {
        property_columns,
        has_label_column,
    })
}

/// Relationship header: `:START_ID`, `:END_ID`, then data columns.
pub fn parse_relationship_header(columns: &[&str]) -> LoadResult<RelationshipHeader> {
    expect_column(columns, 0, START_ID_COLUMN)?;
    expect_column(columns, 1, END_ID_COLUMN)?;

    let property_columns = columns[2..]
        .iter()
        .map(|column| parse_property_column(column))
        .collect::<LoadResult<Vec<_>>>()?;
    Ok(RelationshipHeader { property_columns })
}

/// Graph-property header: a single `name:valueType` column.
pub fn parse_graph_property_header(column: &str) -> LoadResult<PropertyColumn> {
    parse_property_column(column)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_header_with_properties_and_labels() {
        let header =
            parse_node_header(&[":ID", "name:string", "age:long", ":LABEL"]).unwrap();
        assert!(header.has_label_column);
        assert_eq!(
            header.property_columns,
            vec![
                PropertyColumn {
                    name: "name".to_string(),
                    value_type: ValueType::String
                },
                PropertyColumn {
                    name: "age".to_string(),
                    value_type: ValueType::Long
                },
            ]
        );
    }

    #[test]
    fn node_header_requires_id_first() {
        let result = parse_node_header(&["name:string", ":ID"]);
        assert!(matches!(
            result,
            Err(ImportError::Structural(StructuralError::InvalidHeader { .. }))
        ));
    }

    #[test]
    fn relationship_header_requires_start_and_end() {
        assert!(parse_relationship_header(&[":START_ID", ":END_ID", "weight:double"]).is_ok());
        assert!(parse_relationship_header(&[":END_ID", ":START_ID"]).is_err());
        assert!(parse_relationship_header(&[":START_ID"]).is_err());
    }

    #[test]
    fn unknown_value_type_token_is_rejected() {
        let result = parse_node_header(&[":ID", "age:decimal"]);
        assert!(matches!(
            result,
            Err(ImportError::Schema(SchemaError::InvalidValueTypeToken { token })) if token == "decimal"
        ));
    }

    #[test]
    fn array_tokens_parse() {
        let column = parse_graph_property_header("embedding:double[]").unwrap();
        assert_eq!(column.value_type, ValueType::DoubleArray);
        assert_eq!(column.name, "embedding");
    }
}
