//! Sampling algorithms.
//!
//! The topological samplers (forest fire, Metropolis–Hastings random walk,
//! plain random walk) walk the undirected projection of the in-memory graph.
//! The pattern sampler ignores topology and selects by property criteria
//! against the store.

pub mod forest_fire;
pub mod mhrw;
pub mod pattern;
pub mod random_walk;

use std::collections::BTreeSet;
use std::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};

use scaledown_core::progress::{report, ProgressObserver};

use crate::error::{Result, ScaleDownError};
use crate::graph::ResourceGraph;

pub use forest_fire::ForestFireSampler;
pub use mhrw::MhrwSampler;
pub use pattern::PatternSampler;
pub use random_walk::RandomWalkSampler;

/// The closed set of sampling algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingAlgorithm {
    ForestFire,
    Mhrw,
    RandomWalk,
    Pattern,
}

impl SamplingAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ForestFire => "forest_fire",
            Self::Mhrw => "mhrw",
            Self::RandomWalk => "random_walk",
            Self::Pattern => "pattern",
        }
    }

    /// Run a topology-based sampler. `Pattern` selects by criteria against the
    /// store and is rejected here; use [`PatternSampler`].
    pub fn sample_topology<R: Rng + ?Sized>(
        &self,
        graph: &ResourceGraph,
        target_count: usize,
        rng: &mut R,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<BTreeSet<String>> {
        match self {
            Self::ForestFire => {
                ForestFireSampler::default().sample(graph, target_count, rng, progress)
            }
            Self::Mhrw => MhrwSampler::default().sample(graph, target_count, rng, progress),
            Self::RandomWalk => RandomWalkSampler.sample(graph, target_count, rng, progress),
            Self::Pattern => Err(ScaleDownError::InvalidArgument(
                "pattern sampling selects by criteria, not topology".to_string(),
            )),
        }
    }
}

impl std::fmt::Display for SamplingAlgorithm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SamplingAlgorithm {
    type Err = ScaleDownError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "forest_fire" => Ok(Self::ForestFire),
            "mhrw" => Ok(Self::Mhrw),
            "random_walk" => Ok(Self::RandomWalk),
            "pattern" => Ok(Self::Pattern),
            _ => Err(ScaleDownError::InvalidArgument(format!(
                "unknown algorithm '{s}'. Choose: forest_fire, mhrw, random_walk, pattern"
            ))),
        }
    }
}

// ── Shared helpers ───────────────────────────────────────────────

/// Reject empty graphs and zero targets; clamp the target to `|V|`.
pub(crate) fn checked_target(graph: &ResourceGraph, target_count: usize) -> Result<usize> {
    if graph.is_empty() {
        return Err(ScaleDownError::InvalidArgument(
            "cannot sample an empty graph".to_string(),
        ));
    }
    if target_count == 0 {
        return Err(ScaleDownError::InvalidArgument(
            "target_count must be positive".to_string(),
        ));
    }
    Ok(target_count.min(graph.node_count()))
}

/// Nodes not yet visited, with O(1) removal and uniform picks.
///
/// `slot[i]` is the position of node `i` in `pool`, `None` once removed.
#[derive(Debug, Clone)]
pub(crate) struct UnvisitedPool {
    pool: Vec<usize>,
    slot: Vec<Option<usize>>,
}

impl UnvisitedPool {
    pub(crate) fn new(n: usize) -> Self {
        Self {
            pool: (0..n).collect(),
            slot: (0..n).map(Some).collect(),
        }
    }

    pub(crate) fn contains(&self, node: usize) -> bool {
        self.slot[node].is_some()
    }

    /// Mark `node` visited. Returns `false` if it already was.
    pub(crate) fn remove(&mut self, node: usize) -> bool {
        let Some(at) = self.slot[node].take() else {
            return false;
        };
        self.pool.swap_remove(at);
        if let Some(&moved) = self.pool.get(at) {
            self.slot[moved] = Some(at);
        }
        true
    }

    /// Uniformly random unvisited node.
    pub(crate) fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<usize> {
        if self.pool.is_empty() {
            return None;
        }
        Some(self.pool[rng.gen_range(0..self.pool.len())])
    }
}

/// Report sampling progress roughly every 10% of the target.
pub(crate) fn report_sampling(
    progress: Option<&dyn ProgressObserver>,
    sampled: usize,
    target: usize,
) {
    let step = (target / 10).max(1);
    if sampled % step == 0 || sampled == target {
        report(progress, "sampling", sampled, target);
    }
}

/// Map sampled dense indices back to node ids.
pub(crate) fn to_ids(graph: &ResourceGraph, indices: &[usize]) -> BTreeSet<String> {
    indices.iter().map(|&i| graph.id(i).to_string()).collect()
}


#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_algorithm_parsing() {
        assert_eq!(
            "forest_fire".parse::<SamplingAlgorithm>().unwrap(),
            SamplingAlgorithm::ForestFire
        );
        assert_eq!("mhrw".parse::<SamplingAlgorithm>().unwrap(), SamplingAlgorithm::Mhrw);
        assert!("snowball".parse::<SamplingAlgorithm>().is_err());
        assert_eq!(SamplingAlgorithm::RandomWalk.to_string(), "random_walk");
    }

    #[test]
    fn test_pattern_has_no_topology_sampler() {
        let graph = fixtures::clustered();
        let mut rng = StdRng::seed_from_u64(1);
        let err = SamplingAlgorithm::Pattern
            .sample_topology(&graph, 3, &mut rng, None)
            .unwrap_err();
        assert!(matches!(err, ScaleDownError::InvalidArgument(_)));
    }

    #[test]
    fn test_checked_target() {
        let graph = fixtures::clustered();
        assert!(checked_target(&graph, 0).is_err());
        assert_eq!(checked_target(&graph, 500).unwrap(), 12);
        assert!(checked_target(&ResourceGraph::new(), 3).is_err());
    }

    #[test]
    fn test_unvisited_pool() {
        let mut pool = UnvisitedPool::new(5);
        assert!(pool.remove(0));
        assert!(pool.remove(4));
        assert!(!pool.remove(4));
        assert!(!pool.contains(0));
        assert!(pool.contains(2));

        let mut rng = StdRng::seed_from_u64(3);
        let mut drawn = BTreeSet::new();
        while let Some(node) = pool.pick(&mut rng) {
            assert!(pool.contains(node));
            pool.remove(node);
            drawn.insert(node);
        }
        assert_eq!(drawn, BTreeSet::from([1, 2, 3]));
    }

    #[test]
    fn test_isolated_heavy_graph_samples_fully() {
        let ids: Vec<String> = (0..20_000).map(|i| format!("n{i}")).collect();
        let graph = ResourceGraph::from_edge_list(ids.iter().map(String::as_str), std::iter::empty());
        for algorithm in [
            SamplingAlgorithm::ForestFire,
            SamplingAlgorithm::RandomWalk,
            SamplingAlgorithm::Mhrw,
        ] {
            let mut rng = StdRng::seed_from_u64(8);
            let sample = algorithm
                .sample_topology(&graph, ids.len(), &mut rng, None)
                .unwrap();
            assert_eq!(sample.len(), ids.len(), "{algorithm}");
        }
    }

    #[test]
    fn test_topological_samplers_hit_exact_size() {
        let graph = fixtures::clustered();
        for algorithm in [
            SamplingAlgorithm::ForestFire,
            SamplingAlgorithm::RandomWalk,
            SamplingAlgorithm::Mhrw,
        ] {
            for seed in 0..20 {
                let mut rng = StdRng::seed_from_u64(seed);
                for target in [1, 4, 7, 12, 40] {
                    let sample = algorithm
                        .sample_topology(&graph, target, &mut rng, None)
                        .unwrap();
                    assert_eq!(sample.len(), target.min(12), "{algorithm} seed {seed}");
                    assert!(sample.iter().all(|id| graph.contains(id)));
                }
            }
        }
    }
}
