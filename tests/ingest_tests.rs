use fundgraph::catalog::EntityKind;
use fundgraph::{FundGraphError, GraphStore, Row, Table, ingest_rows, ingest_table};
use serde_json::json;

fn row(pairs: &[(&str, &str)]) -> Row {
    let mut row = Row::new();
    for (column, value) in pairs {
        row.insert(column.to_string(), json!(value));
    }
    row
}

fn store() -> GraphStore {
    GraphStore::open_in_memory().expect("store")
}

#[test]
fn test_reingesting_same_fund_row_is_idempotent() {
    let store = store();
    ingest_rows(
        &store,
        EntityKind::ManagementEntity,
        &[row(&[("id", "M1"), ("name", "Acme Asset Management")])],
    )
    .expect("mgmt");
    let fund = row(&[
        ("fund_id", "F1"),
        ("fund_code", "EQ-GLOBAL-01"),
        ("status", "ACTIVE"),
        ("management_entity_id", "M1"),
    ]);
    ingest_rows(&store, EntityKind::Fund, std::slice::from_ref(&fund)).expect("first ingest");
    ingest_rows(&store, EntityKind::Fund, std::slice::from_ref(&fund)).expect("second ingest");

    let page = store.query().search_funds(&[], 1, 10).expect("search");
    assert_eq!(page.total, 1);
    let detail = store.query().fund_by_id("F1").expect("fund");
    assert!(detail.management_entity.is_some());
}

#[test]
fn test_reingesting_subfund_never_duplicates_parent_edge() {
    let store = store();
    ingest_rows(&store, EntityKind::Fund, &[row(&[("fund_id", "F1")])]).expect("fund");
    let subfund = row(&[("id", "SF1"), ("master_fund_id", "F1")]);
    let first =
        ingest_rows(&store, EntityKind::SubFund, std::slice::from_ref(&subfund)).expect("first");
    let second =
        ingest_rows(&store, EntityKind::SubFund, std::slice::from_ref(&subfund)).expect("second");
    assert_eq!(first.linked, 1);
    assert_eq!(second.linked, 1);

    let detail = store.query().fund_by_id("F1").expect("fund");
    assert_eq!(detail.subfunds.len(), 1);
}

#[test]
fn test_property_merge_preserves_columns_absent_from_update() {
    let store = store();
    ingest_rows(
        &store,
        EntityKind::Fund,
        &[row(&[("fund_id", "F1"), ("fund_code", "EQ-GLOBAL-01")])],
    )
    .expect("initial");
    ingest_rows(
        &store,
        EntityKind::Fund,
        &[row(&[("fund_id", "F1"), ("status", "SUSPENDED")])],
    )
    .expect("update");

    let detail = store.query().fund_by_id("F1").expect("fund");
    assert_eq!(detail.properties.get("fund_code"), Some(&json!("EQ-GLOBAL-01")));
    assert_eq!(detail.properties.get("status"), Some(&json!("SUSPENDED")));
}

#[test]
fn test_missing_key_column_reports_row_position() {
    let store = store();
    let rows = vec![
        row(&[("fund_id", "F1")]),
        row(&[("fund_code", "EQ-NO-KEY")]),
    ];
    let err = ingest_rows(&store, EntityKind::Fund, &rows).expect_err("missing key");
    match err {
        FundGraphError::Ingestion { entity, row, cause } => {
            assert_eq!(entity, "Fund");
            assert_eq!(row, 1);
            assert!(cause.contains("fund_id"));
        }
        other => panic!("expected Ingestion, got {other:?}"),
    }
    // The first row stays committed.
    assert!(store
        .node_by_key(EntityKind::Fund, "F1")
        .expect("lookup")
        .is_some());
}

#[test]
fn test_unknown_dataset_name_is_rejected() {
    let err = EntityKind::parse("portfolios").expect_err("unsupported");
    match err {
        FundGraphError::InvalidInput(_) => {}
        other => panic!("expected InvalidInput, got {other:?}"),
    }
    assert_eq!(
        EntityKind::parse("master_funds").expect("known"),
        EntityKind::Fund
    );
}

#[test]
fn test_dangling_parent_reference_leaves_node_disconnected_then_repairs() {
    let store = store();
    let subfund = row(&[("id", "SF1"), ("master_fund_id", "F1")]);
    let summary =
        ingest_rows(&store, EntityKind::SubFund, std::slice::from_ref(&subfund)).expect("ingest");
    assert_eq!(summary.rows, 1);
    assert_eq!(summary.linked, 0);
    assert!(store
        .node_by_key(EntityKind::SubFund, "SF1")
        .expect("lookup")
        .is_some());

    ingest_rows(&store, EntityKind::Fund, &[row(&[("fund_id", "F1")])]).expect("fund");
    let repaired =
        ingest_rows(&store, EntityKind::SubFund, std::slice::from_ref(&subfund)).expect("repair");
    assert_eq!(repaired.linked, 1);
    let detail = store.query().fund_by_id("F1").expect("fund");
    assert_eq!(detail.subfunds.len(), 1);
}

#[test]
fn test_legal_entity_and_share_class_link_to_their_fund() {
    let store = store();
    ingest_rows(&store, EntityKind::Fund, &[row(&[("fund_id", "F1")])]).expect("fund");
    ingest_rows(
        &store,
        EntityKind::LegalEntity,
        &[row(&[("id", "L1"), ("fund_id", "F1")])],
    )
    .expect("legal");
    ingest_rows(
        &store,
        EntityKind::ShareClass,
        &[
            row(&[("id", "SC1"), ("fund_id", "F1")]),
            row(&[("id", "SC2"), ("fund_id", "F1")]),
        ],
    )
    .expect("share classes");

    let detail = store.query().fund_by_id("F1").expect("fund");
    assert!(detail.legal_entity.is_some());
    assert_eq!(detail.share_classes.len(), 2);
}

#[test]
fn test_csv_table_parses_headers_and_empty_cells() {
    let csv = "id,name,master_fund_id\nSF1,Alpha Feeder,\nSF2,Beta Feeder,F1\n";
    let table = Table::from_csv_reader(csv.as_bytes()).expect("csv");
    assert_eq!(table.rows.len(), 2);
    assert_eq!(table.rows[0].get("master_fund_id"), Some(&json!(null)));
    assert_eq!(table.rows[1].get("master_fund_id"), Some(&json!("F1")));

    let store = store();
    let summary = ingest_table(&store, EntityKind::SubFund, &table).expect("ingest");
    assert_eq!(summary.rows, 2);
    // F1 does not exist, and SF1 carries no reference at all.
    assert_eq!(summary.linked, 0);
}
