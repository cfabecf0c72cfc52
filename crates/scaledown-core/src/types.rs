//! Core domain types for the resource graph.

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ── Tenant ────────────────────────────────────────────────────────

/// Every resource in the store belongs to a tenant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TenantId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

// ── Node Layers ──────────────────────────────────────────────────

/// Which of the two logically disjoint graphs sharing the store a query targets.
///
/// Resource nodes exist twice: the normalized *abstracted* layer that
/// scale-down reads and prunes, and the untouched *original* provenance layer
/// carrying the `Original` label. Every store helper takes a layer explicitly.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeLayer {
    #[default]
    Abstracted,
    Original,
}

impl NodeLayer {
    /// Cypher predicate selecting this layer for the node bound to `var`.
    pub fn predicate(&self, var: &str) -> String {
        match self {
            Self::Abstracted => format!("NOT {var}:Original"),
            Self::Original => format!("{var}:Original"),
        }
    }

    /// Whether a node with the given `Original` label flag belongs to this layer.
    pub fn contains(&self, is_original: bool) -> bool {
        match self {
            Self::Abstracted => !is_original,
            Self::Original => is_original,
        }
    }
}

/// Relationship linking abstracted nodes to their original counterparts.
/// Never part of the sampled topology.
pub const LINEAGE_RELATIONSHIP: &str = "SCAN_SOURCE_NODE";

// ── Properties ───────────────────────────────────────────────────

/// Attributes of a single node or relationship.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Node id → node attributes, populated once at extraction.
pub type PropertyMap = HashMap<String, Properties>;
