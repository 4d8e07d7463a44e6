use std::path::Path;

use parking_lot::{Mutex, MutexGuard};
use rusqlite::{Connection, OptionalExtension, params};
use serde_json::{Map, Value};
use tracing::debug;

use crate::{
    catalog::{EntityKind, RelKind},
    errors::FundGraphError,
    schema::{declare_unique_constraint, ensure_schema},
};

/// Scalar property bag of a node, imported verbatim from source rows.
pub type Properties = Map<String, Value>;

/// Embedded property graph over SQLite. Nodes are addressed by
/// `(label, node_key)`; edges are typed and directed. All mutation goes
/// through upserts so repeated ingestion never duplicates graph elements.
pub struct GraphStore {
    conn: Mutex<Connection>,
}

impl GraphStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, FundGraphError> {
        let conn =
            Connection::open(path).map_err(|e| FundGraphError::connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, FundGraphError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| FundGraphError::connection(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, FundGraphError> {
        ensure_schema(&conn)?;
        for kind in EntityKind::ALL {
            declare_unique_constraint(&conn, kind)?;
        }
        debug!("graph store ready");
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// One logical session per public operation. The guard releases the
    /// connection on every exit path, including early returns on error.
    pub(crate) fn session(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock()
    }

    /// Creates the node if absent, else merges `properties` onto the stored
    /// bag: named keys overwrite, unnamed stored keys survive.
    pub fn upsert_node(
        &self,
        kind: EntityKind,
        key: &str,
        properties: &Properties,
    ) -> Result<i64, FundGraphError> {
        let conn = self.session();
        Self::upsert_node_in(&conn, kind, key, properties)
    }

    pub(crate) fn upsert_node_in(
        conn: &Connection,
        kind: EntityKind,
        key: &str,
        properties: &Properties,
    ) -> Result<i64, FundGraphError> {
        if key.trim().is_empty() {
            return Err(FundGraphError::invalid_input("node key must not be empty"));
        }
        let existing: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, properties FROM graph_nodes WHERE label=?1 AND node_key=?2",
                params![kind.label(), key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        match existing {
            Some((id, stored)) => {
                let mut merged = parse_properties(&stored)?;
                for (name, value) in properties {
                    merged.insert(name.clone(), value.clone());
                }
                let data = serde_json::to_string(&merged)
                    .map_err(|e| FundGraphError::invalid_input(e.to_string()))?;
                conn.execute(
                    "UPDATE graph_nodes SET properties=?1 WHERE id=?2",
                    params![data, id],
                )
                .map_err(|e| FundGraphError::query(e.to_string()))?;
                Ok(id)
            }
            None => {
                let data = serde_json::to_string(properties)
                    .map_err(|e| FundGraphError::invalid_input(e.to_string()))?;
                conn.execute(
                    "INSERT INTO graph_nodes(label, node_key, properties) VALUES(?1, ?2, ?3)",
                    params![kind.label(), key, data],
                )
                .map_err(|e| FundGraphError::query(e.to_string()))?;
                Ok(conn.last_insert_rowid())
            }
        }
    }

    /// Ensures exactly one `rel` edge between the two nodes. Returns `false`
    /// without raising when either endpoint is missing, so ingestion of a
    /// dangling reference degrades to a disconnected node.
    pub fn upsert_edge(
        &self,
        from: EntityKind,
        from_key: &str,
        rel: RelKind,
        to: EntityKind,
        to_key: &str,
    ) -> Result<bool, FundGraphError> {
        let conn = self.session();
        Self::upsert_edge_in(&conn, from, from_key, rel, to, to_key)
    }

    pub(crate) fn upsert_edge_in(
        conn: &Connection,
        from: EntityKind,
        from_key: &str,
        rel: RelKind,
        to: EntityKind,
        to_key: &str,
    ) -> Result<bool, FundGraphError> {
        let Some(from_id) = Self::node_id_in(conn, from, from_key)? else {
            return Ok(false);
        };
        let Some(to_id) = Self::node_id_in(conn, to, to_key)? else {
            return Ok(false);
        };
        let exists: Option<i64> = conn
            .query_row(
                "SELECT id FROM graph_edges WHERE from_id=?1 AND to_id=?2 AND edge_type=?3",
                params![from_id, to_id, rel.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        if exists.is_none() {
            conn.execute(
                "INSERT INTO graph_edges(from_id, to_id, edge_type) VALUES(?1, ?2, ?3)",
                params![from_id, to_id, rel.as_str()],
            )
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        }
        Ok(true)
    }

    /// Read-only point lookup by node key.
    pub fn node_by_key(
        &self,
        kind: EntityKind,
        key: &str,
    ) -> Result<Option<Properties>, FundGraphError> {
        let conn = self.session();
        Ok(Self::node_by_key_in(&conn, kind, key)?.map(|(_, props)| props))
    }
}

impl GraphStore {
    pub(crate) fn node_id_in(
        conn: &Connection,
        kind: EntityKind,
        key: &str,
    ) -> Result<Option<i64>, FundGraphError> {
        conn.query_row(
            "SELECT id FROM graph_nodes WHERE label=?1 AND node_key=?2",
            params![kind.label(), key],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| FundGraphError::query(e.to_string()))
    }

    pub(crate) fn node_by_key_in(
        conn: &Connection,
        kind: EntityKind,
        key: &str,
    ) -> Result<Option<(i64, Properties)>, FundGraphError> {
        let row: Option<(i64, String)> = conn
            .query_row(
                "SELECT id, properties FROM graph_nodes WHERE label=?1 AND node_key=?2",
                params![kind.label(), key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        match row {
            Some((id, data)) => Ok(Some((id, parse_properties(&data)?))),
            None => Ok(None),
        }
    }

    /// First node of `kind` whose JSON property equals `value`, in key order.
    /// `property` must come from the fixed filter/catalogue vocabulary.
    pub(crate) fn first_by_property_in(
        conn: &Connection,
        kind: EntityKind,
        property: &str,
        value: &str,
    ) -> Result<Option<(i64, Properties)>, FundGraphError> {
        let sql = format!(
            "SELECT id, properties FROM graph_nodes \
             WHERE label=?1 AND json_extract(properties, '$.{property}')=?2 \
             ORDER BY node_key LIMIT 1"
        );
        let row: Option<(i64, String)> = conn
            .query_row(&sql, params![kind.label(), value], |row| {
                Ok((row.get(0)?, row.get(1)?))
            })
            .optional()
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        match row {
            Some((id, data)) => Ok(Some((id, parse_properties(&data)?))),
            None => Ok(None),
        }
    }

    /// Single optional relation: the first `rel` target in key order, or None.
    pub(crate) fn out_neighbor_in(
        conn: &Connection,
        from_id: i64,
        rel: RelKind,
    ) -> Result<Option<Properties>, FundGraphError> {
        let data: Option<String> = conn
            .query_row(
                "SELECT n.properties FROM graph_edges e \
                 JOIN graph_nodes n ON n.id = e.to_id \
                 WHERE e.from_id=?1 AND e.edge_type=?2 \
                 ORDER BY n.node_key LIMIT 1",
                params![from_id, rel.as_str()],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        match data {
            Some(data) => Ok(Some(parse_properties(&data)?)),
            None => Ok(None),
        }
    }

    pub(crate) fn out_neighbors_in(
        conn: &Connection,
        from_id: i64,
        rel: RelKind,
    ) -> Result<Vec<Properties>, FundGraphError> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT n.properties FROM graph_edges e \
                 JOIN graph_nodes n ON n.id = e.to_id \
                 WHERE e.from_id=?1 AND e.edge_type=?2 \
                 ORDER BY n.node_key, n.id",
            )
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params![from_id, rel.as_str()], |row| {
                row.get::<_, String>(0)
            })
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        let mut result = Vec::new();
        for data in rows {
            let data = data.map_err(|e| FundGraphError::query(e.to_string()))?;
            result.push(parse_properties(&data)?);
        }
        Ok(result)
    }

    /// Edge sources of `rel` pointing at `to_id`, restricted to `kind` nodes,
    /// with key and internal id for further traversal.
    pub(crate) fn in_neighbors_in(
        conn: &Connection,
        to_id: i64,
        rel: RelKind,
        kind: EntityKind,
    ) -> Result<Vec<(i64, String, Properties)>, FundGraphError> {
        let mut stmt = conn
            .prepare_cached(
                "SELECT n.id, n.node_key, n.properties FROM graph_edges e \
                 JOIN graph_nodes n ON n.id = e.from_id \
                 WHERE e.to_id=?1 AND e.edge_type=?2 AND n.label=?3 \
                 ORDER BY n.node_key, n.id",
            )
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        let rows = stmt
            .query_map(params![to_id, rel.as_str(), kind.label()], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(|e| FundGraphError::query(e.to_string()))?;
        let mut result = Vec::new();
        for row in rows {
            let (id, key, data) = row.map_err(|e| FundGraphError::query(e.to_string()))?;
            result.push((id, key, parse_properties(&data)?));
        }
        Ok(result)
    }
}

pub(crate) fn parse_properties(data: &str) -> Result<Properties, FundGraphError> {
    serde_json::from_str(data).map_err(|e| FundGraphError::query(e.to_string()))
}
