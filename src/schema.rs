use rusqlite::Connection;

use crate::{catalog::EntityKind, errors::FundGraphError};

pub fn ensure_schema(conn: &Connection) -> Result<(), FundGraphError> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS graph_nodes (
            id         INTEGER PRIMARY KEY AUTOINCREMENT,
            label      TEXT NOT NULL,
            node_key   TEXT NOT NULL,
            properties TEXT NOT NULL
        );
        CREATE TABLE IF NOT EXISTS graph_edges (
            id        INTEGER PRIMARY KEY AUTOINCREMENT,
            from_id   INTEGER NOT NULL,
            to_id     INTEGER NOT NULL,
            edge_type TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_nodes_label_key ON graph_nodes(label, node_key);
        CREATE INDEX IF NOT EXISTS idx_edges_from ON graph_edges(from_id, edge_type);
        CREATE INDEX IF NOT EXISTS idx_edges_to ON graph_edges(to_id, edge_type);
        "#,
    )
    .map_err(|e| FundGraphError::schema(e.to_string()))?;
    Ok(())
}

/// Declares per-type key uniqueness as a partial unique index. Safe to call
/// repeatedly; the label text comes from the fixed catalogue, never from
/// caller input.
pub fn declare_unique_constraint(
    conn: &Connection,
    kind: EntityKind,
) -> Result<(), FundGraphError> {
    let label = kind.label();
    let sql = format!(
        "CREATE UNIQUE INDEX IF NOT EXISTS uniq_{} ON graph_nodes(node_key) WHERE label = '{label}'",
        label.to_ascii_lowercase()
    );
    conn.execute_batch(&sql)
        .map_err(|e| FundGraphError::schema(e.to_string()))?;
    Ok(())
}
