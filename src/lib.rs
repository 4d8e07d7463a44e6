//! SQLite-backed reference graph of investment funds and their
//! organisational relationships: management entities, legal entities,
//! share classes, and nested subfund hierarchies.

pub mod assemble;
pub mod catalog;
pub mod errors;
pub mod filter;
pub mod graph;
mod hierarchy;
pub mod ingest;
pub mod query;
pub mod schema;

pub use crate::assemble::{
    FundDetail, FundPage, FundStatistics, FundSummary, HierarchyNode, HierarchyRoot,
    HierarchyView, TypeCount,
};
pub use crate::catalog::{EntityKind, LinkEnd, ParentLink, RelKind};
pub use crate::errors::FundGraphError;
pub use crate::filter::{FieldFilter, FilterField, MatchMode};
pub use crate::graph::{GraphStore, Properties};
pub use crate::ingest::{IngestSummary, Row, Table, ingest_rows, ingest_table};
pub use crate::query::{FundQuery, MAX_PAGE_SIZE};
