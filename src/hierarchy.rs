use ahash::AHashSet;
use rusqlite::Connection;

use crate::{
    assemble::HierarchyNode,
    catalog::{EntityKind, RelKind},
    errors::FundGraphError,
    graph::GraphStore,
};

/// Walks `PARENT_FUND` edges child-ward from the root, level by level up to
/// `depth` hops. Each (subfund, level) pair is reported once: a subfund
/// reachable through several paths of the same length appears once, while a
/// subfund reachable at two distinct path lengths appears once per length.
pub(crate) fn descend(
    conn: &Connection,
    root_id: i64,
    depth: u32,
) -> Result<Vec<HierarchyNode>, FundGraphError> {
    let mut seen: AHashSet<(i64, u32)> = AHashSet::new();
    let mut frontier = vec![root_id];
    let mut found: Vec<(u32, String, HierarchyNode)> = Vec::new();
    for level in 1..=depth {
        let mut next = Vec::new();
        for &parent in &frontier {
            let children =
                GraphStore::in_neighbors_in(conn, parent, RelKind::ParentFund, EntityKind::SubFund)?;
            for (child_id, key, properties) in children {
                if seen.insert((child_id, level)) {
                    found.push((
                        level,
                        key,
                        HierarchyNode {
                            properties,
                            depth: level,
                        },
                    ));
                    next.push(child_id);
                }
            }
        }
        if next.is_empty() {
            break;
        }
        next.sort_unstable();
        next.dedup();
        frontier = next;
    }
    found.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
    Ok(found.into_iter().map(|(_, _, node)| node).collect())
}
