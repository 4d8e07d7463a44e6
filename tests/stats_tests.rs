use fundgraph::catalog::EntityKind;
use fundgraph::{GraphStore, Row, ingest_rows};
use serde_json::json;

fn fund(fund_id: &str, fund_type: Option<&str>, status: Option<&str>) -> Row {
    let mut row = Row::new();
    row.insert("fund_id".to_string(), json!(fund_id));
    if let Some(fund_type) = fund_type {
        row.insert("fund_type".to_string(), json!(fund_type));
    }
    if let Some(status) = status {
        row.insert("status".to_string(), json!(status));
    }
    row
}

#[test]
fn test_active_and_inactive_status_buckets() {
    let store = GraphStore::open_in_memory().expect("store");
    ingest_rows(
        &store,
        EntityKind::Fund,
        &[
            fund("F1", Some("EQUITY"), Some("ACTIVE")),
            fund("F2", Some("EQUITY"), Some("ACTIVE")),
            fund("F3", Some("BOND"), Some("SUSPENDED")),
        ],
    )
    .expect("funds");

    let stats = store.query().statistics().expect("statistics");
    assert_eq!(stats.total, 3);
    assert_eq!(stats.active, 2);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.by_status.get("ACTIVE"), Some(&2));
    assert_eq!(stats.by_status.get("SUSPENDED"), Some(&1));
    assert_eq!(stats.by_status.len(), 2);
}

#[test]
fn test_missing_status_counts_as_unknown_and_inactive() {
    let store = GraphStore::open_in_memory().expect("store");
    ingest_rows(
        &store,
        EntityKind::Fund,
        &[
            fund("F1", Some("EQUITY"), Some("ACTIVE")),
            fund("F2", Some("EQUITY"), None),
        ],
    )
    .expect("funds");

    let stats = store.query().statistics().expect("statistics");
    assert_eq!(stats.active, 1);
    assert_eq!(stats.inactive, 1);
    assert_eq!(stats.by_status.get("UNKNOWN"), Some(&1));
}

#[test]
fn test_type_breakdown_orders_by_descending_count() {
    let store = GraphStore::open_in_memory().expect("store");
    ingest_rows(
        &store,
        EntityKind::Fund,
        &[
            fund("F1", Some("EQUITY"), Some("ACTIVE")),
            fund("F2", Some("EQUITY"), Some("ACTIVE")),
            fund("F3", Some("EQUITY"), Some("CLOSED")),
            fund("F4", Some("MONEY_MARKET"), Some("ACTIVE")),
            fund("F5", Some("BOND"), Some("ACTIVE")),
        ],
    )
    .expect("funds");

    let stats = store.query().statistics().expect("statistics");
    let breakdown: Vec<(&str, u64)> = stats
        .by_type
        .iter()
        .map(|entry| (entry.name.as_str(), entry.value))
        .collect();
    assert_eq!(
        breakdown,
        vec![("EQUITY", 3), ("BOND", 1), ("MONEY_MARKET", 1)]
    );
}

#[test]
fn test_empty_store_statistics_are_zero() {
    let store = GraphStore::open_in_memory().expect("store");
    let stats = store.query().statistics().expect("statistics");
    assert_eq!(stats.total, 0);
    assert_eq!(stats.active, 0);
    assert_eq!(stats.inactive, 0);
    assert!(stats.by_status.is_empty());
    assert!(stats.by_type.is_empty());
}

#[test]
fn test_statistics_count_only_fund_nodes() {
    let store = GraphStore::open_in_memory().expect("store");
    ingest_rows(&store, EntityKind::Fund, &[fund("F1", None, Some("ACTIVE"))]).expect("fund");
    ingest_rows(
        &store,
        EntityKind::SubFund,
        &[{
            let mut row = Row::new();
            row.insert("id".to_string(), json!("SF1"));
            row.insert("status".to_string(), json!("ACTIVE"));
            row.insert("master_fund_id".to_string(), json!("F1"));
            row
        }],
    )
    .expect("subfund");

    let stats = store.query().statistics().expect("statistics");
    assert_eq!(stats.total, 1);
    assert_eq!(stats.active, 1);
}
