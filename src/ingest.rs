//! Row-oriented bulk upsert of the fund graph. Rows are processed
//! independently: a failing row stops the call but never rolls back the rows
//! already committed, and the error carries the row position so the caller
//! can resubmit just the remainder.

use std::io::Read;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::{
    catalog::{EntityKind, LinkEnd},
    errors::FundGraphError,
    graph::GraphStore,
};

pub type Row = Map<String, Value>;

/// Self-describing tabular source with named columns.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Row>,
}

impl Table {
    pub fn from_rows(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Parses headered CSV. Cells become JSON strings; empty cells become
    /// null so an absent parent reference stays distinguishable from an
    /// empty one.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, FundGraphError> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers = csv_reader
            .headers()
            .map_err(|e| FundGraphError::invalid_input(e.to_string()))?
            .clone();
        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record.map_err(|e| FundGraphError::invalid_input(e.to_string()))?;
            let mut row = Row::new();
            for (header, cell) in headers.iter().zip(record.iter()) {
                let value = if cell.is_empty() {
                    Value::Null
                } else {
                    Value::String(cell.to_string())
                };
                row.insert(header.to_string(), value);
            }
            rows.push(row);
        }
        Ok(Self { rows })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub entity: EntityKind,
    pub rows: usize,
    /// Parent edges established; lower than `rows` when references dangled
    /// or rows carried no reference.
    pub linked: usize,
}

/// Upserts one node per row and re-establishes its parent relationship per
/// the catalogue. A reference to a parent that does not exist yet leaves the
/// node disconnected; re-ingesting the row after the parent arrives repairs
/// the link.
pub fn ingest_rows(
    store: &GraphStore,
    entity: EntityKind,
    rows: &[Row],
) -> Result<IngestSummary, FundGraphError> {
    let conn = store.session();
    let mut linked = 0;
    for (index, row) in rows.iter().enumerate() {
        let key = row_key(entity, row, index)?;
        GraphStore::upsert_node_in(&conn, entity, &key, row)
            .map_err(|e| FundGraphError::ingestion(entity.label(), index, e.to_string()))?;
        let Some(link) = entity.parent_link() else {
            continue;
        };
        let Some(parent_key) = row.get(link.column).and_then(scalar_key) else {
            continue;
        };
        let mut resolved = false;
        for &parent in link.parents {
            resolved = match link.end {
                LinkEnd::ChildIsSource => {
                    GraphStore::upsert_edge_in(&conn, entity, &key, link.rel, parent, &parent_key)
                }
                LinkEnd::ParentIsSource => {
                    GraphStore::upsert_edge_in(&conn, parent, &parent_key, link.rel, entity, &key)
                }
            }
            .map_err(|e| FundGraphError::ingestion(entity.label(), index, e.to_string()))?;
            if resolved {
                break;
            }
        }
        if resolved {
            linked += 1;
        } else {
            debug!(
                entity = entity.label(),
                key = %key,
                parent = %parent_key,
                "parent reference did not resolve"
            );
        }
    }
    info!(
        entity = entity.label(),
        rows = rows.len(),
        linked,
        "ingested rows"
    );
    Ok(IngestSummary {
        entity,
        rows: rows.len(),
        linked,
    })
}

pub fn ingest_table(
    store: &GraphStore,
    entity: EntityKind,
    table: &Table,
) -> Result<IngestSummary, FundGraphError> {
    ingest_rows(store, entity, &table.rows)
}

fn row_key(entity: EntityKind, row: &Row, index: usize) -> Result<String, FundGraphError> {
    let column = entity.key_column();
    row.get(column).and_then(scalar_key).ok_or_else(|| {
        FundGraphError::ingestion(
            entity.label(),
            index,
            format!("missing key column `{column}`"),
        )
    })
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
