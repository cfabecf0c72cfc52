//! In-process [`GraphStore`] backend.
//!
//! Mirrors the Neo4j query semantics (tenant scoping, layer selection,
//! lineage exclusion, ordered paging) over plain vectors. Edges may reference
//! ids absent from the node table, which reproduces writes racing an
//! extraction. Read and mutation counters let callers assert which store
//! calls a pipeline actually issued.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use scaledown_core::{NodeLayer, Properties, TenantId};

use crate::client::GraphError;
use crate::predicate::PropertyPredicate;
use crate::queries::{EdgeRecord, NodeRecord};
use crate::store::GraphStore;

#[derive(Debug, Clone)]
struct StoredNode {
    tenant_id: TenantId,
    original: bool,
    record: NodeRecord,
}

#[derive(Debug, Clone)]
struct StoredEdge {
    tenant_id: TenantId,
    record: EdgeRecord,
}

#[derive(Debug, Default)]
struct MemoryState {
    tenants: HashSet<TenantId>,
    nodes: Vec<StoredNode>,
    edges: Vec<StoredEdge>,
}

impl MemoryState {
    fn is_original(&self, tenant_id: &TenantId, id: &str) -> bool {
        self.nodes
            .iter()
            .any(|n| n.original && &n.tenant_id == tenant_id && n.record.id == id)
    }
}

/// An in-memory resource graph store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: RwLock<MemoryState>,
    reads: AtomicUsize,
    mutations: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, MemoryState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, MemoryState> {
        self.state.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a tenant.
    pub fn add_tenant(&self, tenant_id: &TenantId) {
        self.write().tenants.insert(tenant_id.clone());
    }

    /// Insert an abstracted-layer resource node.
    pub fn insert_node(&self, tenant_id: &TenantId, id: &str, properties: Properties) {
        self.insert(tenant_id, id, properties, false);
    }

    /// Insert an original-layer (provenance) resource node.
    pub fn insert_original_node(&self, tenant_id: &TenantId, id: &str, properties: Properties) {
        self.insert(tenant_id, id, properties, true);
    }

    fn insert(&self, tenant_id: &TenantId, id: &str, properties: Properties, original: bool) {
        self.write().nodes.push(StoredNode {
            tenant_id: tenant_id.clone(),
            original,
            record: NodeRecord {
                id: id.to_string(),
                properties,
            },
        });
    }

    /// Insert a directed relationship.
    pub fn insert_edge(
        &self,
        tenant_id: &TenantId,
        source_id: &str,
        target_id: &str,
        rel_type: &str,
        properties: Properties,
    ) {
        self.write().edges.push(StoredEdge {
            tenant_id: tenant_id.clone(),
            record: EdgeRecord {
                source_id: source_id.to_string(),
                target_id: target_id.to_string(),
                rel_type: rel_type.to_string(),
                properties,
            },
        });
    }

    /// Ids of every stored node in `layer` for a tenant.
    pub fn node_ids(&self, tenant_id: &TenantId, layer: NodeLayer) -> Vec<String> {
        let mut ids: Vec<String> = self
            .read()
            .nodes
            .iter()
            .filter(|n| &n.tenant_id == tenant_id && layer.contains(n.original))
            .map(|n| n.record.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Number of edges currently stored for a tenant.
    pub fn edge_count(&self, tenant_id: &TenantId) -> usize {
        self.read()
            .edges
            .iter()
            .filter(|e| &e.tenant_id == tenant_id)
            .count()
    }

    /// Number of read queries served so far.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of mutations applied so far.
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GraphStore for MemoryStore {
    async fn tenant_exists(&self, tenant_id: &TenantId) -> Result<bool, GraphError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.read().tenants.contains(tenant_id))
    }

    async fn fetch_node_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<NodeRecord>, GraphError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.read();
        let mut page: Vec<&StoredNode> = state
            .nodes
            .iter()
            .filter(|n| &n.tenant_id == tenant_id && layer.contains(n.original))
            .collect();
        page.sort_by(|a, b| a.record.id.cmp(&b.record.id));
        Ok(page
            .into_iter()
            .skip(skip)
            .take(limit)
            .map(|n| n.record.clone())
            .collect())
    }

    async fn fetch_edge_page(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        excluded_rel_type: &str,
        skip: usize,
        limit: usize,
    ) -> Result<Vec<EdgeRecord>, GraphError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let state = self.read();
        let mut page: Vec<&EdgeRecord> = state
            .edges
            .iter()
            .filter(|e| &e.tenant_id == tenant_id && e.record.rel_type != excluded_rel_type)
            .filter(|e| {
                layer.contains(state.is_original(tenant_id, &e.record.source_id))
                    && layer.contains(state.is_original(tenant_id, &e.record.target_id))
            })
            .map(|e| &e.record)
            .collect();
        page.sort_by(|a, b| {
            (&a.source_id, &a.target_id, &a.rel_type).cmp(&(&b.source_id, &b.target_id, &b.rel_type))
        });
        Ok(page.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn find_matching(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        predicate: &PropertyPredicate,
    ) -> Result<Vec<String>, GraphError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut ids: Vec<String> = self
            .read()
            .nodes
            .iter()
            .filter(|n| &n.tenant_id == tenant_id && layer.contains(n.original))
            .filter(|n| predicate.matches(&n.record.properties))
            .map(|n| n.record.id.clone())
            .collect();
        ids.sort();
        Ok(ids)
    }

    async fn delete_excluding(
        &self,
        tenant_id: &TenantId,
        layer: NodeLayer,
        keep_ids: &[String],
    ) -> Result<u64, GraphError> {
        self.mutations.fetch_add(1, Ordering::SeqCst);
        let keep: HashSet<&str> = keep_ids.iter().map(String::as_str).collect();
        let mut state = self.write();

        let doomed: HashSet<String> = state
            .nodes
            .iter()
            .filter(|n| {
                &n.tenant_id == tenant_id
                    && layer.contains(n.original)
                    && !keep.contains(n.record.id.as_str())
            })
            .map(|n| n.record.id.clone())
            .collect();

        state.nodes.retain(|n| {
            !(&n.tenant_id == tenant_id
                && layer.contains(n.original)
                && doomed.contains(&n.record.id))
        });
        // DETACH: drop every relationship touching a deleted node.
        state.edges.retain(|e| {
            &e.tenant_id != tenant_id
                || !(doomed.contains(&e.record.source_id) || doomed.contains(&e.record.target_id))
        });

        Ok(doomed.len() as u64)
    }
}
