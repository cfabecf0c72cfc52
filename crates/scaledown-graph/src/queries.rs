//! Read operations against the resource graph.
//!
//! Pages are ordered so that consecutive SKIP/LIMIT reads over an unchanged
//! store are stable.

use neo4rs::query;

use scaledown_core::{NodeLayer, Properties, TenantId};

use crate::client::{decode_count, GraphClient, GraphError};
use crate::predicate::PropertyPredicate;

/// A resource node with its full property map.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct NodeRecord {
    pub id: String,
    pub properties: Properties,
}

/// A directed relationship between two resource nodes.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeRecord {
    pub source_id: String,
    pub target_id: String,
    pub rel_type: String,
    pub properties: Properties,
}

impl GraphClient {
    /// Whether the tenant node exists.
    pub async fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, GraphError> {
        let q = query(
            "MATCH (t:Tenant {id: $tenant_id})
             RETURN count(t) AS cnt",
        )
        .param("tenant_id", tenant_id.to_string());

        match self.query_one(q).await? {
            Some(row) => Ok(decode_count(row.get::<i64>("cnt"), "cnt")? > 0),
            None => Ok(false),
        }
    }

    /// Read one page of resource nodes in the given layer.
    pub async fn fetch_node_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        let cypher = format!(
            "MATCH (r:Resource)
             WHERE {} AND r.tenant_id = $tenant_id
             RETURN r.id AS id, apoc.convert.toJson(properties(r)) AS props
             ORDER BY r.id
             SKIP $skip LIMIT $limit",
            layer.predicate("r")
        );

        let q = query(&cypher)
            .param("tenant_id", tenant_id.to_string())
            .param("skip", skip as i64)
            .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id").map_err(|e| {
                GraphError::Serialization(format!("Failed to read node id: {e}"))
            })?;
            let props: String = row.get("props").unwrap_or_default();
            results.push(NodeRecord {
                properties: parse_properties(&props)?,
                id,
            });
        }
        Ok(results)
    }

    /// Read one page of relationships whose endpoints are both in `layer`,
    /// excluding relationships of type `excluded_rel_type`.
    pub async fn fetch_edge_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        excluded_rel_type: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EdgeRecord>, GraphError> {
        let cypher = edge_page_cypher(layer);
        let q = query(&cypher)
            .param("tenant_id", tenant_id.to_string())
            .param("excluded", excluded_rel_type.to_string())
            .param("skip", skip as i64)
            .param("limit", limit as i64);

        let rows = self.query_rows(q).await?;
        let mut results = Vec::with_capacity(rows.len());
        for row in rows {
            let source_id: String = row.get("source_id").map_err(|e| {
                GraphError::Serialization(format!("Failed to read edge source: {e}"))
            })?;
            let target_id: String = row.get("target_id").map_err(|e| {
                GraphError::Serialization(format!("Failed to read edge target: {e}"))
            })?;
            let rel_type: String = row.get("rel_type").map_err(|e| {
                GraphError::Serialization(format!("Failed to read edge type: {e}"))
            })?;
            let props: String = row.get("props").unwrap_or_default();
            results.push(EdgeRecord {
                source_id,
                target_id,
                rel_type,
                properties: parse_properties(&props)?,
            });
        }
        Ok(results)
    }

    /// Ids of nodes in `layer` satisfying every clause of `predicate`.
    pub async fn find_matching(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<String>, GraphError> {
        let (fragment, params) = predicate.to_cypher("r");
        let cypher = format!(
            "MATCH (r:Resource)
             WHERE {} AND r.tenant_id = $tenant_id AND {fragment}
             RETURN r.id AS id
             ORDER BY r.id",
            layer.predicate("r")
        );

        let mut q = query(&cypher).param("tenant_id", tenant_id.to_string());
        for (name, value) in params {
            q = q.param(&name, value);
        }

        let rows = self.query_rows(q).await?;
        let mut ids = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.get("id").map_err(|e| {
                GraphError::Serialization(format!("Failed to read matched id: {e}"))
            })?;
            ids.push(id);
        }
        Ok(ids)
    }
}

/// Relationships are ordered by endpoints and type, then by element id so
/// parallel relationships of the same type keep a fixed position across pages.
fn edge_page_cypher(layer: NodeLayer) -> String {
    format!(
        "MATCH (a:Resource)-[rel]->(b:Resource)
         WHERE {} AND {} AND a.tenant_id = $tenant_id
           AND type(rel) <> $excluded
         RETURN a.id AS source_id, b.id AS target_id, type(rel) AS rel_type,
                apoc.convert.toJson(properties(rel)) AS props,
                elementId(rel) AS rel_key
         ORDER BY source_id, target_id, rel_type, rel_key
         SKIP $skip LIMIT $limit",
        layer.predicate("a"),
        layer.predicate("b")
    )
}

/// Parse a JSON-encoded property map as produced by `apoc.convert.toJson`.
fn parse_properties(json: &str) -> Result<Properties, GraphError> {
    if json.is_empty() {
        return Ok(Properties::new());
    }
    match serde_json::from_str::<serde_json::Value>(json) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(serde_json::Value::Null) => Ok(Properties::new()),
        Ok(other) => Err(GraphError::Serialization(format!(
            "expected a property object, got {other}"
        ))),
        Err(e) => Err(GraphError::Serialization(format!(
            "Failed to parse properties: {e}"
        ))),
    }
}
