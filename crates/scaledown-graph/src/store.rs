//! The store contract used by extraction, pattern sampling, and pruning.
//!
//! | Backend | Module | Description |
//! |---------|--------|-------------|
//! | `GraphClient` | `client` | External Neo4j via Bolt |
//! | `MemoryStore` | `memory` | In-process, for tests and offline runs |

use async_trait::async_trait;

use scaledown_core::{NodeLayer, TenantId};

use crate::client::{GraphClient, GraphError};
use crate::predicate::PropertyPredicate;
use crate::queries::{EdgeRecord, NodeRecord};

#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Whether the tenant is known to the store.
    async fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, GraphError>;

    /// One page of nodes in `layer`, ordered by id.
    async fn fetch_node_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, GraphError>;

    /// One page of edges with both endpoints in `layer`, never of type
    /// `excluded_rel_type`.
    async fn fetch_edge_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        excluded_rel_type: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EdgeRecord>, GraphError>;

    /// Ids of nodes in `layer` matching a validated predicate.
    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<String>, GraphError>;

    /// Detach-delete every node in `layer` not in `keep_ids`, as one mutation.
    async fn delete_excluding(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        keep_ids: &[String],
    ) -> Result<u64, GraphError>;
}

#[async_trait]
impl GraphStore for GraphClient {
    async fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, GraphError> {
        GraphClient::tenant_exists(self, tenant_id).await
    }

    async fn fetch_node_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        GraphClient::fetch_node_page(self, tenant_id, layer, skip, limit).await
    }

    async fn fetch_edge_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        excluded_rel_type: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EdgeRecord>, GraphError> {
        GraphClient::fetch_edge_page(self, tenant_id, layer, excluded_rel_type, skip, limit).await
    }

    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<String>, GraphError> {
        GraphClient::find_matching(self, tenant_id, layer, predicate).await
    }

    async fn delete_excluding(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        keep_ids: &[String],
    ) -> Result<u64, GraphError> {
        GraphClient::delete_excluding(self, tenant_id, layer, keep_ids).await
    }
}
