//! Typed search predicates. Field names come from a closed set so caller
//! input never reaches the generated SQL; values are always bound parameters.

use rusqlite::types::Value as SqlValue;
use serde::{Deserialize, Serialize};

/// Searchable Fund properties.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterField {
    FundId,
    FundCode,
    Isin,
    FundType,
    Status,
    ManagementId,
}

impl FilterField {
    pub fn property(self) -> &'static str {
        match self {
            FilterField::FundId => "fund_id",
            FilterField::FundCode => "fund_code",
            FilterField::Isin => "isin_master",
            FilterField::FundType => "fund_type",
            FilterField::Status => "status",
            FilterField::ManagementId => "mgmt_id",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchMode {
    Exact,
    /// Case-sensitive containment (byte comparison, SQLite `instr`).
    Contains,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldFilter {
    pub field: FilterField,
    pub mode: MatchMode,
    pub value: String,
}

impl FieldFilter {
    pub fn exact<T: Into<String>>(field: FilterField, value: T) -> Self {
        Self {
            field,
            mode: MatchMode::Exact,
            value: value.into(),
        }
    }

    pub fn contains<T: Into<String>>(field: FilterField, value: T) -> Self {
        Self {
            field,
            mode: MatchMode::Contains,
            value: value.into(),
        }
    }
}

/// Folds the matchers into one AND predicate over the JSON property bag.
/// Zero matchers fold to the empty fragment, i.e. match all.
pub(crate) fn fold_predicates(filters: &[FieldFilter]) -> (String, Vec<SqlValue>) {
    let mut clauses = Vec::with_capacity(filters.len());
    let mut values = Vec::with_capacity(filters.len());
    for filter in filters {
        let path = filter.field.property();
        match filter.mode {
            MatchMode::Exact => {
                clauses.push(format!("json_extract(properties, '$.{path}') = ?"));
            }
            MatchMode::Contains => {
                clauses.push(format!(
                    "instr(json_extract(properties, '$.{path}'), ?) > 0"
                ));
            }
        }
        values.push(SqlValue::Text(filter.value.clone()));
    }
    if clauses.is_empty() {
        (String::new(), values)
    } else {
        (format!(" AND {}", clauses.join(" AND ")), values)
    }
}
