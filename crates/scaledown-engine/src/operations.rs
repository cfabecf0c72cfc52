//! Post-sampling graph operations: pruning and motif discovery.

use std::collections::{BTreeSet, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use scaledown_core::{NodeLayer, TenantId};
use scaledown_graph::GraphStore;

use crate::error::{Phase, Result, ScaleDownError};
use crate::graph::ResourceGraph;

pub const MIN_MOTIF_SIZE: usize = 2;
pub const MAX_MOTIF_SIZE: usize = 10;

/// Seeds tried per requested motif.
const SEEDS_PER_MOTIF: usize = 10;

pub struct GraphOperations<'s, S: GraphStore + ?Sized> {
    store: &'s S,
}

impl<'s, S: GraphStore + ?Sized> GraphOperations<'s, S> {
    pub fn new(store: &'s S) -> Self {
        Self { store }
    }

    /// Delete every abstracted-layer node of the tenant that is not in
    /// `keep_ids`, detaching its relationships. The original layer is never
    /// touched. An empty keep set is refused as a no-op rather than wiping
    /// the tenant.
    pub async fn delete_non_sampled(
        &self,
        tenant_id: &TenantId,
        keep_ids: &BTreeSet<String>,
    ) -> Result<u64> {
        if keep_ids.is_empty() {
            tracing::warn!(tenant_id = %tenant_id, "Empty keep set, skipping deletion");
            return Ok(0);
        }

        let keep: Vec<String> = keep_ids.iter().cloned().collect();
        let deleted = self
            .store
            .delete_excluding(tenant_id, NodeLayer::Abstracted, &keep)
            .await
            .map_err(ScaleDownError::store(Phase::Delete, tenant_id))?;

        tracing::info!(
            tenant_id = %tenant_id,
            kept = keep.len(),
            deleted,
            "Deleted non-sampled nodes"
        );
        Ok(deleted)
    }
}

/// Find up to `max_motifs` distinct connected node sets of exactly
/// `motif_size` nodes.
///
/// Approximate: seeds are drawn from a shuffled node order and each grows by
/// breadth-first expansion over the undirected projection. Seeds whose
/// component is too small yield nothing.
pub fn discover_motifs<R: Rng + ?Sized>(
    graph: &ResourceGraph,
    motif_size: usize,
    max_motifs: usize,
    rng: &mut R,
) -> Result<Vec<BTreeSet<String>>> {
    if !(MIN_MOTIF_SIZE..=MAX_MOTIF_SIZE).contains(&motif_size) {
        return Err(ScaleDownError::InvalidArgument(format!(
            "motif_size must be between {MIN_MOTIF_SIZE} and {MAX_MOTIF_SIZE}, got {motif_size}"
        )));
    }
    if max_motifs == 0 {
        return Err(ScaleDownError::InvalidArgument(
            "max_motifs must be at least 1".to_string(),
        ));
    }

    let view = graph.undirected();
    let mut order: Vec<usize> = (0..view.node_count()).collect();
    order.shuffle(rng);

    let mut seen: HashSet<BTreeSet<usize>> = HashSet::new();
    let mut motifs = Vec::new();

    for &seed in order.iter().take(SEEDS_PER_MOTIF.saturating_mul(max_motifs)) {
        let mut members = BTreeSet::from([seed]);
        let mut frontier = VecDeque::from([seed]);
        'grow: while let Some(current) = frontier.pop_front() {
            for &next in view.neighbors(current) {
                if members.len() == motif_size {
                    break 'grow;
                }
                if members.insert(next) {
                    frontier.push_back(next);
                }
            }
        }

        if members.len() == motif_size && seen.insert(members.clone()) {
            motifs.push(members.iter().map(|&i| graph.id(i).to_string()).collect());
            if motifs.len() == max_motifs {
                break;
            }
        }
    }

    tracing::debug!(found = motifs.len(), motif_size, max_motifs, "Motif discovery complete");
    Ok(motifs)
}
