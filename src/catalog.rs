//! Fixed catalogue of node labels, unique key columns, and the relationship
//! that links each entity type to its parent. Ingestion and querying both
//! consult this module so the two paths can never disagree on an edge type.

use serde::{Deserialize, Serialize};

use crate::errors::FundGraphError;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum RelKind {
    ManagedBy,
    ParentFund,
    HasLegalEntity,
    HasShareClass,
}

impl RelKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RelKind::ManagedBy => "MANAGED_BY",
            RelKind::ParentFund => "PARENT_FUND",
            RelKind::HasLegalEntity => "HAS_LEGAL_ENTITY",
            RelKind::HasShareClass => "HAS_SHARE_CLASS",
        }
    }
}

/// Which endpoint of the parent edge the ingested row's own node occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LinkEnd {
    ChildIsSource,
    ParentIsSource,
}

/// How an entity type references its parent in tabular input.
#[derive(Clone, Copy, Debug)]
pub struct ParentLink {
    pub column: &'static str,
    pub rel: RelKind,
    /// Candidate parent types, tried in order until the reference resolves.
    /// SubFunds may nest, so a subfund's parent can be a Fund or a SubFund.
    pub parents: &'static [EntityKind],
    pub end: LinkEnd,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    ManagementEntity,
    Fund,
    SubFund,
    LegalEntity,
    ShareClass,
}

impl EntityKind {
    pub const ALL: [EntityKind; 5] = [
        EntityKind::ManagementEntity,
        EntityKind::Fund,
        EntityKind::SubFund,
        EntityKind::LegalEntity,
        EntityKind::ShareClass,
    ];

    pub fn label(self) -> &'static str {
        match self {
            EntityKind::ManagementEntity => "ManagementEntity",
            EntityKind::Fund => "Fund",
            EntityKind::SubFund => "SubFund",
            EntityKind::LegalEntity => "LegalEntity",
            EntityKind::ShareClass => "ShareClass",
        }
    }

    /// Column that carries the unique node key in tabular input.
    pub fn key_column(self) -> &'static str {
        match self {
            EntityKind::Fund => "fund_id",
            _ => "id",
        }
    }

    pub fn parent_link(self) -> Option<ParentLink> {
        match self {
            EntityKind::ManagementEntity => None,
            EntityKind::Fund => Some(ParentLink {
                column: "management_entity_id",
                rel: RelKind::ManagedBy,
                parents: &[EntityKind::ManagementEntity],
                end: LinkEnd::ChildIsSource,
            }),
            EntityKind::SubFund => Some(ParentLink {
                column: "master_fund_id",
                rel: RelKind::ParentFund,
                parents: &[EntityKind::Fund, EntityKind::SubFund],
                end: LinkEnd::ChildIsSource,
            }),
            EntityKind::LegalEntity => Some(ParentLink {
                column: "fund_id",
                rel: RelKind::HasLegalEntity,
                parents: &[EntityKind::Fund],
                end: LinkEnd::ParentIsSource,
            }),
            EntityKind::ShareClass => Some(ParentLink {
                column: "fund_id",
                rel: RelKind::HasShareClass,
                parents: &[EntityKind::Fund],
                end: LinkEnd::ParentIsSource,
            }),
        }
    }

    /// Parses the dataset names accepted for tabular uploads.
    pub fn parse(name: &str) -> Result<EntityKind, FundGraphError> {
        match name {
            "management_entities" => Ok(EntityKind::ManagementEntity),
            "master_funds" => Ok(EntityKind::Fund),
            "subfunds" => Ok(EntityKind::SubFund),
            "legal_entities" => Ok(EntityKind::LegalEntity),
            "share_classes" => Ok(EntityKind::ShareClass),
            other => Err(FundGraphError::invalid_input(format!(
                "unsupported entity type: {other}"
            ))),
        }
    }
}
