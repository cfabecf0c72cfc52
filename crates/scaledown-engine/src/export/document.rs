//! The document shape shared by YAML and JSON exports.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use scaledown_core::{Properties, PropertyMap};

use crate::graph::ResourceGraph;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportMetadata {
    pub format: String,
    pub node_count: usize,
    pub relationship_count: usize,
    pub generated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportNode {
    pub id: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRelationship {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub rel_type: String,
    #[serde(default)]
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportDocument {
    pub metadata: ExportMetadata,
    pub nodes: Vec<ExportNode>,
    pub relationships: Vec<ExportRelationship>,
}

impl ExportDocument {
    /// Nodes sorted by id; relationships sorted by (source, target, type).
    pub fn build(
        format: &str,
        node_ids: &BTreeSet<String>,
        properties: &PropertyMap,
        subgraph: &ResourceGraph,
        generated_at: DateTime<Utc>,
    ) -> Self {
        let nodes: Vec<ExportNode> = node_ids
            .iter()
            .map(|id| ExportNode {
                id: id.clone(),
                properties: properties.get(id).cloned().unwrap_or_default(),
            })
            .collect();

        let mut relationships: Vec<ExportRelationship> = subgraph
            .edges()
            .map(|(src, edge)| ExportRelationship {
                source: subgraph.id(src).to_string(),
                target: subgraph.id(edge.target_index).to_string(),
                rel_type: edge.rel_type.clone(),
                properties: edge.properties.clone(),
            })
            .collect();
        relationships.sort_by(|a, b| {
            (&a.source, &a.target, &a.rel_type).cmp(&(&b.source, &b.target, &b.rel_type))
        });

        Self {
            metadata: ExportMetadata {
                format: format.to_string(),
                node_count: nodes.len(),
                relationship_count: relationships.len(),
                generated_at,
            },
            nodes,
            relationships,
        }
    }
}
