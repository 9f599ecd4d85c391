//! Loading an edge list from CSV into a [`MemorySourceBuilder`].

use std::io;

use ::csv::{ReaderBuilder, StringRecord};
use tracing::info;

use super::{MemorySourceBuilder, PropValue};
use crate::types::{GraphError, PropId, Result, TypeId};

/// Column layout of an edge CSV file.
#[derive(Clone, Debug)]
pub struct CsvEdgeColumns {
    /// Header of the start-node column.
    pub src_column: String,
    /// Header of the end-node column.
    pub dst_column: String,
    /// Optional header of a numeric relationship type column.
    pub type_column: Option<String>,
    /// Type assigned when no type column is configured.
    pub default_type: TypeId,
    /// Property columns and the property key each one maps to.
    pub prop_columns: Vec<(String, PropId)>,
}

impl Default for CsvEdgeColumns {
    fn default() -> Self {
        Self {
            src_column: "src".into(),
            dst_column: "dst".into(),
            type_column: None,
            default_type: TypeId(0),
            prop_columns: Vec::new(),
        }
    }
}

/// Appends every edge row of `reader` to `builder`, returning the number of rows read.
pub fn load_edges<R: io::Read>(
    reader: R,
    columns: &CsvEdgeColumns,
    builder: &mut MemorySourceBuilder,
) -> Result<u64> {
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);
    let headers = reader.headers()?.clone();
    let src_index = find_column(&headers, &columns.src_column)?;
    let dst_index = find_column(&headers, &columns.dst_column)?;
    let ty_index = match &columns.type_column {
        Some(col) => Some(find_column(&headers, col)?),
        None => None,
    };
    let prop_indices = columns
        .prop_columns
        .iter()
        .map(|(name, prop)| Ok((find_column(&headers, name)?, *prop)))
        .collect::<Result<Vec<_>>>()?;

    let mut imported = 0u64;
    for result in reader.records() {
        let record = result?;
        let src = parse_node(get_required(&record, src_index)?)?;
        let dst = parse_node(get_required(&record, dst_index)?)?;
        let ty = match ty_index {
            Some(idx) => TypeId(
                get_required(&record, idx)?
                    .parse::<u32>()
                    .map_err(|_| GraphError::Invalid("edge type column is not a u32"))?,
            ),
            None => columns.default_type,
        };
        let props = prop_indices
            .iter()
            .filter_map(|(idx, prop)| record.get(*idx).map(|raw| (*prop, parse_value(raw))))
            .collect();
        builder.add_relationship(src, dst, ty, props);
        imported += 1;
    }
    info!(edges = imported, "source.csv.loaded");
    Ok(imported)
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or(GraphError::Invalid("column missing from CSV header"))
}

fn get_required(record: &StringRecord, idx: usize) -> Result<&str> {
    record
        .get(idx)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(GraphError::Invalid("required CSV column is empty"))
}

fn parse_node(raw: &str) -> Result<u64> {
    raw.parse::<u64>()
        .map_err(|_| GraphError::Invalid("node id column is not a u64"))
}

fn parse_value(raw: &str) -> PropValue {
    let raw = raw.trim();
    let lower = raw.to_ascii_lowercase();
    if lower == "null" {
        return PropValue::Null;
    }
    if lower == "true" {
        return PropValue::Bool(true);
    }
    if lower == "false" {
        return PropValue::Bool(false);
    }
    if let Ok(int_val) = raw.parse::<i64>() {
        return PropValue::Int(int_val);
    }
    if let Ok(float_val) = raw.parse::<f64>() {
        return PropValue::Float(float_val);
    }
    PropValue::Str(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{Dir, RelationshipSource};
    use crate::types::RelationshipId;

    const EDGES: &str = "\
src,dst,kind,weight
1,2,0,1.5
2,3,1,heavy
3,1,0,
";

    #[test]
    fn loads_rows_with_types_and_properties() {
        let columns = CsvEdgeColumns {
            type_column: Some("kind".into()),
            prop_columns: vec![("weight".into(), PropId(7))],
            ..CsvEdgeColumns::default()
        };
        let mut builder = MemorySourceBuilder::new();
        let rows = load_edges(EDGES.as_bytes(), &columns, &mut builder).unwrap();
        assert_eq!(rows, 3);
        let source = builder.build();
        assert_eq!(source.node_ids(), &[1, 2, 3]);
        assert_eq!(source.degree(1, Dir::Out, Some(TypeId(0))).unwrap(), 1);
        assert_eq!(source.degree(2, Dir::Out, Some(TypeId(0))).unwrap(), 0);
        assert_eq!(
            source.property(RelationshipId(0), PropId(7)).unwrap(),
            Some(PropValue::Float(1.5))
        );
        assert_eq!(
            source.property(RelationshipId(1), PropId(7)).unwrap(),
            Some(PropValue::Str("heavy".into()))
        );
        assert_eq!(
            source.property(RelationshipId(2), PropId(7)).unwrap(),
            Some(PropValue::Str(String::new()))
        );
    }

    #[test]
    fn missing_column_is_rejected() {
        let columns = CsvEdgeColumns {
            src_column: "from".into(),
            ..CsvEdgeColumns::default()
        };
        let mut builder = MemorySourceBuilder::new();
        assert!(matches!(
            load_edges(EDGES.as_bytes(), &columns, &mut builder),
            Err(GraphError::Invalid(_))
        ));
    }

    #[test]
    fn value_parsing_prefers_narrow_types() {
        assert_eq!(parse_value("NULL"), PropValue::Null);
        assert_eq!(parse_value("true"), PropValue::Bool(true));
        assert_eq!(parse_value("42"), PropValue::Int(42));
        assert_eq!(parse_value("0.5"), PropValue::Float(0.5));
        assert_eq!(parse_value("x"), PropValue::Str("x".into()));
    }
}
