use rusqlite::{Connection, params_from_iter, types::Value as SqlValue};
use tracing::debug;

use crate::{
    assemble::{
        self, FundDetail, FundPage, FundStatistics, FundSummary, HierarchyView, TypeCount,
    },
    catalog::{EntityKind, RelKind},
    errors::FundGraphError,
    filter::{FieldFilter, fold_predicates},
    graph::{GraphStore, Properties, parse_properties},
    hierarchy,
};

pub const MAX_PAGE_SIZE: u32 = 100;

/// Read-only query surface over the fund graph. Every call takes a single
/// session against the store and releases it on completion or failure.
pub struct FundQuery<'a> {
    store: &'a GraphStore,
}

impl<'a> FundQuery<'a> {
    pub fn new(store: &'a GraphStore) -> Self {
        Self { store }
    }

    /// Filtered, paginated search ordered by fund key ascending. Each item
    /// carries its optionally-present management entity.
    pub fn search_funds(
        &self,
        filters: &[FieldFilter],
        page: u32,
        page_size: u32,
    ) -> Result<FundPage, FundGraphError> {
        if page < 1 {
            return Err(FundGraphError::invalid_input("page must be >= 1"));
        }
        if page_size < 1 || page_size > MAX_PAGE_SIZE {
            return Err(FundGraphError::invalid_input(format!(
                "page_size must be between 1 and {MAX_PAGE_SIZE}"
            )));
        }
        let (clause, values) = fold_predicates(filters);
        let conn = self.store.session();
        let total = count_funds(&conn, &clause, &values)?;
        let offset = i64::from(page - 1) * i64::from(page_size);
        let funds = fund_page(&conn, &clause, &values, i64::from(page_size), offset)?;
        let mut items = Vec::with_capacity(funds.len());
        for (id, properties) in funds {
            let management = GraphStore::out_neighbor_in(&conn, id, RelKind::ManagedBy)?;
            items.push(assemble::fund_summary(properties, management));
        }
        debug!(total, page, page_size, "fund search");
        Ok(FundPage {
            items,
            total,
            page,
            page_size,
            total_pages: total.div_ceil(u64::from(page_size)),
        })
    }

    /// Unfiltered slice in fund key order, same item shape as search.
    pub fn list_funds(&self, offset: u32, limit: u32) -> Result<Vec<FundSummary>, FundGraphError> {
        let conn = self.store.session();
        let funds = fund_page(&conn, "", &[], i64::from(limit), i64::from(offset))?;
        let mut items = Vec::with_capacity(funds.len());
        for (id, properties) in funds {
            let management = GraphStore::out_neighbor_in(&conn, id, RelKind::ManagedBy)?;
            items.push(assemble::fund_summary(properties, management));
        }
        Ok(items)
    }

    pub fn fund_by_id(&self, fund_id: &str) -> Result<FundDetail, FundGraphError> {
        let conn = self.store.session();
        let Some((id, properties)) = GraphStore::node_by_key_in(&conn, EntityKind::Fund, fund_id)?
        else {
            return Err(FundGraphError::not_found(format!("fund {fund_id}")));
        };
        detail(&conn, id, properties)
    }

    pub fn fund_by_code(&self, fund_code: &str) -> Result<FundDetail, FundGraphError> {
        let conn = self.store.session();
        let Some((id, properties)) =
            GraphStore::first_by_property_in(&conn, EntityKind::Fund, "fund_code", fund_code)?
        else {
            return Err(FundGraphError::not_found(format!(
                "fund with code {fund_code}"
            )));
        };
        detail(&conn, id, properties)
    }

    /// Aggregate fund counts: total, the ACTIVE/other split, the unreduced
    /// per-status breakdown, and per-type counts in descending order.
    pub fn statistics(&self) -> Result<FundStatistics, FundGraphError> {
        let conn = self.store.session();
        let total = count_funds(&conn, "", &[])?;
        let mut by_status = std::collections::BTreeMap::new();
        for (status, count) in grouped_counts(&conn, "status")? {
            by_status.insert(status, count);
        }
        let active = by_status.get("ACTIVE").copied().unwrap_or(0);
        let inactive = by_status
            .iter()
            .filter(|(status, _)| status.as_str() != "ACTIVE")
            .map(|(_, count)| count)
            .sum();
        let by_type = grouped_counts(&conn, "fund_type")?
            .into_iter()
            .map(|(name, value)| TypeCount { name, value })
            .collect();
        Ok(FundStatistics {
            total,
            active,
            inactive,
            by_status,
            by_type,
        })
    }

    /// Depth-bounded subfund tree under the given fund, children annotated
    /// with the hop count at which they were found.
    pub fn hierarchy_children(
        &self,
        fund_id: &str,
        depth: u32,
    ) -> Result<HierarchyView, FundGraphError> {
        if depth < 1 {
            return Err(FundGraphError::invalid_input("depth must be >= 1"));
        }
        let conn = self.store.session();
        let Some((root_id, root)) = GraphStore::node_by_key_in(&conn, EntityKind::Fund, fund_id)?
        else {
            return Err(FundGraphError::not_found(format!("fund {fund_id}")));
        };
        let children = hierarchy::descend(&conn, root_id, depth)?;
        let share_classes = GraphStore::out_neighbors_in(&conn, root_id, RelKind::HasShareClass)?;
        Ok(assemble::hierarchy_view(root, share_classes, children, depth))
    }
}

impl GraphStore {
    pub fn query(&self) -> FundQuery<'_> {
        FundQuery::new(self)
    }
}

fn detail(conn: &Connection, id: i64, properties: Properties) -> Result<FundDetail, FundGraphError> {
    let management = GraphStore::out_neighbor_in(conn, id, RelKind::ManagedBy)?;
    let legal = GraphStore::out_neighbor_in(conn, id, RelKind::HasLegalEntity)?;
    let share_classes = GraphStore::out_neighbors_in(conn, id, RelKind::HasShareClass)?;
    let subfunds =
        GraphStore::in_neighbors_in(conn, id, RelKind::ParentFund, EntityKind::SubFund)?
            .into_iter()
            .map(|(_, _, props)| props)
            .collect();
    Ok(assemble::fund_detail(
        properties,
        management,
        legal,
        share_classes,
        subfunds,
    ))
}

fn count_funds(
    conn: &Connection,
    clause: &str,
    values: &[SqlValue],
) -> Result<u64, FundGraphError> {
    let sql = format!("SELECT count(*) FROM graph_nodes WHERE label = 'Fund'{clause}");
    let count: i64 = conn
        .query_row(&sql, params_from_iter(values.iter().cloned()), |row| {
            row.get(0)
        })
        .map_err(|e| FundGraphError::query(e.to_string()))?;
    Ok(count as u64)
}

fn fund_page(
    conn: &Connection,
    clause: &str,
    values: &[SqlValue],
    limit: i64,
    offset: i64,
) -> Result<Vec<(i64, Properties)>, FundGraphError> {
    let sql = format!(
        "SELECT id, properties FROM graph_nodes WHERE label = 'Fund'{clause} \
         ORDER BY node_key LIMIT ? OFFSET ?"
    );
    let mut params: Vec<SqlValue> = values.to_vec();
    params.push(SqlValue::Integer(limit));
    params.push(SqlValue::Integer(offset));
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| FundGraphError::query(e.to_string()))?;
    let rows = stmt
        .query_map(params_from_iter(params), |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })
        .map_err(|e| FundGraphError::query(e.to_string()))?;
    let mut funds = Vec::new();
    for row in rows {
        let (id, data) = row.map_err(|e| FundGraphError::query(e.to_string()))?;
        funds.push((id, parse_properties(&data)?));
    }
    Ok(funds)
}

/// Counts funds grouped by one catalogue property; funds without the
/// property fall into an UNKNOWN bucket. Ordered by descending count, then
/// name, for deterministic output.
fn grouped_counts(conn: &Connection, property: &str) -> Result<Vec<(String, u64)>, FundGraphError> {
    let sql = format!(
        "SELECT coalesce(json_extract(properties, '$.{property}'), 'UNKNOWN') AS bucket, \
         count(*) AS n FROM graph_nodes WHERE label = 'Fund' \
         GROUP BY bucket ORDER BY n DESC, bucket"
    );
    let mut stmt = conn
        .prepare(&sql)
        .map_err(|e| FundGraphError::query(e.to_string()))?;
    let rows = stmt
        .query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })
        .map_err(|e| FundGraphError::query(e.to_string()))?;
    let mut counts = Vec::new();
    for row in rows {
        let (bucket, count) = row.map_err(|e| FundGraphError::query(e.to_string()))?;
        counts.push((bucket, count as u64));
    }
    Ok(counts)
}
