//! Write operations against the resource graph.
//!
//! Pruning is issued as a single statement so the store applies it
//! all-or-nothing.

use neo4rs::query;

use scaledown_core::{NodeLayer, TenantId};

use crate::client::{decode_count, GraphClient, GraphError};

impl GraphClient {
    /// Detach-delete every node in `layer` whose id is not in `keep_ids`.
    /// Returns the count of deleted nodes.
    pub async fn delete_excluding(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        keep_ids: &[String],
    ) -> Result<u64, GraphError> {
        let cypher = format!(
            "MATCH (r:Resource)
             WHERE {} AND r.tenant_id = $tenant_id AND NOT r.id IN $keep_ids
             DETACH DELETE r
             RETURN count(r) AS cnt",
            layer.predicate("r")
        );

        let q = query(&cypher)
            .param("tenant_id", tenant_id.to_string())
            .param("keep_ids", keep_ids.to_vec());

        match self.query_one(q).await? {
            Some(row) => Ok(decode_count(row.get::<i64>("cnt"), "cnt")?.max(0) as u64),
            None => Ok(0),
        }
    }
}
