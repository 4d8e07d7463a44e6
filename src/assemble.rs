//! Response shapes and the normalisation rules for raw store rows: property
//! bags pass through verbatim, an absent optional relation becomes `None`,
//! an absent collection becomes an empty vec, never null.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::graph::Properties;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundSummary {
    #[serde(flatten)]
    pub properties: Properties,
    pub management_entity: Option<Properties>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundDetail {
    #[serde(flatten)]
    pub properties: Properties,
    pub management_entity: Option<Properties>,
    pub legal_entity: Option<Properties>,
    pub share_classes: Vec<Properties>,
    pub subfunds: Vec<Properties>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundPage {
    pub items: Vec<FundSummary>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: u64,
}

/// Subfund discovered by the hierarchy traversal, annotated with the hop
/// count at which it was found (1 = direct child).
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HierarchyNode {
    #[serde(flatten)]
    pub properties: Properties,
    pub depth: u32,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HierarchyRoot {
    #[serde(flatten)]
    pub properties: Properties,
    pub share_classes: Vec<Properties>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HierarchyView {
    pub root: HierarchyRoot,
    pub children: Vec<HierarchyNode>,
    pub depth: u32,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub name: String,
    pub value: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FundStatistics {
    pub total: u64,
    pub active: u64,
    pub inactive: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_type: Vec<TypeCount>,
}

pub(crate) fn fund_summary(
    properties: Properties,
    management_entity: Option<Properties>,
) -> FundSummary {
    FundSummary {
        properties,
        management_entity,
    }
}

pub(crate) fn fund_detail(
    properties: Properties,
    management_entity: Option<Properties>,
    legal_entity: Option<Properties>,
    share_classes: Vec<Properties>,
    subfunds: Vec<Properties>,
) -> FundDetail {
    FundDetail {
        properties,
        management_entity,
        legal_entity,
        share_classes,
        subfunds,
    }
}

pub(crate) fn hierarchy_view(
    root: Properties,
    share_classes: Vec<Properties>,
    children: Vec<HierarchyNode>,
    depth: u32,
) -> HierarchyView {
    HierarchyView {
        root: HierarchyRoot {
            properties: root,
            share_classes,
        },
        children,
        depth,
    }
}
