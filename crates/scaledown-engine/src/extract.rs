//! Streaming extraction of a tenant's abstracted layer into memory.
//!
//! Nodes and edges are read page by page (SKIP/LIMIT) until an empty page
//! comes back, so memory held per round trip is bounded by the batch size.

use scaledown_core::progress::{report, ProgressObserver};
use scaledown_core::{NodeLayer, PropertyMap, TenantId, LINEAGE_RELATIONSHIP};
use scaledown_graph::GraphStore;

use crate::error::{Phase, Result, ScaleDownError};
use crate::graph::ResourceGraph;

/// Default page size for node and edge reads.
pub const DEFAULT_BATCH_SIZE: usize = 5000;

/// Loads the abstracted layer of a tenant's graph.
pub struct GraphExtractor<'s, S: GraphStore + ?Sized> {
    store: &'s S,
    batch_size: usize,
}

impl<'s, S: GraphStore + ?Sized> GraphExtractor<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self {
            store,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Override the page size.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        self
    }

    /// Extract the tenant's abstracted graph and per-node properties.
    ///
    /// Edges of the lineage relationship type are never loaded; edges whose
    /// endpoints were not loaded are dropped.
    pub async fn extract(
        &self,
        tenant_id: &TenantId,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<(ResourceGraph, PropertyMap)> {
        if self.batch_size == 0 {
            return Err(ScaleDownError::InvalidArgument(
                "batch_size must be positive".to_string(),
            ));
        }

        let known = self
            .store
            .tenant_exists(tenant_id)
            .await
            .map_err(ScaleDownError::store(Phase::Extract, tenant_id))?;
        if !known {
            return Err(ScaleDownError::NotFound {
                tenant_id: tenant_id.to_string(),
            });
        }

        let mut graph = ResourceGraph::new();
        let mut properties = PropertyMap::new();

        // ── Nodes ────────────────────────────────────────────────
        let mut skip = 0;
        loop {
            let page = self
                .store
                .fetch_node_page(tenant_id, NodeLayer::Abstracted, skip, self.batch_size)
                .await
                .map_err(ScaleDownError::store(Phase::Extract, tenant_id))?;
            if page.is_empty() {
                break;
            }
            skip += page.len();
            for record in page {
                graph.add_node(&record.id);
                properties.insert(record.id, record.properties);
            }
            let loaded = graph.node_count();
            report(progress, "nodes", loaded, loaded);
        }

        if graph.is_empty() {
            return Err(ScaleDownError::NoData {
                tenant_id: tenant_id.to_string(),
            });
        }

        // ── Edges ────────────────────────────────────────────────
        let mut skip = 0;
        let mut dropped = 0usize;
        loop {
            let page = self
                .store
                .fetch_edge_page(
                    tenant_id,
                    NodeLayer::Abstracted,
                    LINEAGE_RELATIONSHIP,
                    skip,
                    self.batch_size,
                )
                .await
                .map_err(ScaleDownError::store(Phase::Extract, tenant_id))?;
            if page.is_empty() {
                break;
            }
            skip += page.len();
            for edge in page {
                if !graph.add_edge(&edge.source_id, &edge.target_id, &edge.rel_type, edge.properties)
                {
                    dropped += 1;
                }
            }
            let loaded = graph.edge_count();
            report(progress, "edges", loaded, loaded);
        }

        if dropped > 0 {
            tracing::debug!(
                tenant_id = %tenant_id,
                dropped,
                "Dropped edges with endpoints outside the loaded node set"
            );
        }

        tracing::info!(
            tenant_id = %tenant_id,
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Extraction complete"
        );

        Ok((graph, properties))
    }
}
