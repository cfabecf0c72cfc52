//! Forest fire sampling.
//!
//! A fire starts at a random seed and spreads breadth-first: each burning
//! node ignites a fraction of its unburnt neighbors. When the fire dies out
//! before the target is reached (disconnected graph) a new fire starts at a
//! random unburnt node.

use std::collections::{BTreeSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;

use scaledown_core::ProgressObserver;

use super::{checked_target, report_sampling, to_ids, UnvisitedPool};
use crate::error::Result;
use crate::graph::{ResourceGraph, UndirectedView};

#[derive(Debug, Clone)]
pub struct ForestFireSampler {
    /// Upper bound on the per-node burn probability.
    pub max_burn_probability: f64,
}

impl Default for ForestFireSampler {
    fn default() -> Self {
        Self {
            max_burn_probability: 0.7,
        }
    }
}

impl ForestFireSampler {
    /// Burn probability for a target size: `min(max, 2 * target / |V|)`.
    pub fn burn_probability(&self, target: usize, node_count: usize) -> f64 {
        self.max_burn_probability
            .min(2.0 * target as f64 / node_count as f64)
    }

    pub fn sample<R: Rng + ?Sized>(
        &self,
        graph: &ResourceGraph,
        target_count: usize,
        rng: &mut R,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<BTreeSet<String>> {
        let target = checked_target(graph, target_count)?;
        let view = graph.undirected();
        let p = self.burn_probability(target, view.node_count());

        let mut fire = Fire::new(&view, p, target);
        fire.ignite(rng.gen_range(0..view.node_count()));

        while fire.sample.len() < target {
            let before = fire.sample.len();
            if !fire.advance(rng) {
                break;
            }
            if fire.sample.len() > before {
                report_sampling(progress, fire.sample.len(), target);
            }
        }

        tracing::debug!(
            sampled = fire.sample.len(),
            target,
            burn_probability = p,
            "Forest fire complete"
        );
        Ok(to_ids(graph, &fire.sample))
    }
}

/// Nodes ignited by each burning node: `max(1, floor(p * unburnt))`, never
/// more than the remaining budget.
pub fn burn_count(p: f64, unburnt: usize, remaining: usize) -> usize {
    ((p * unburnt as f64).floor() as usize).max(1).min(remaining)
}

struct Fire<'v> {
    view: &'v UndirectedView,
    p: f64,
    target: usize,
    unburnt: UnvisitedPool,
    sample: Vec<usize>,
    frontier: VecDeque<usize>,
}

impl<'v> Fire<'v> {
    fn new(view: &'v UndirectedView, p: f64, target: usize) -> Self {
        Self {
            view,
            p,
            target,
            unburnt: UnvisitedPool::new(view.node_count()),
            sample: Vec::with_capacity(target),
            frontier: VecDeque::new(),
        }
    }

    fn ignite(&mut self, node: usize) {
        if self.unburnt.remove(node) {
            self.sample.push(node);
            self.frontier.push_back(node);
        }
    }

    /// Burn from the head of the frontier, or reignite at a random unburnt
    /// node when the frontier is empty. `false` once every node has burnt.
    fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let Some(current) = self.frontier.pop_front() else {
            return match self.unburnt.pick(rng) {
                Some(next) => {
                    self.ignite(next);
                    true
                }
                None => false,
            };
        };

        let view = self.view;
        let unburnt: Vec<usize> = view
            .neighbors(current)
            .iter()
            .copied()
            .filter(|&v| self.unburnt.contains(v))
            .collect();
        if unburnt.is_empty() {
            return true;
        }

        let burn = burn_count(self.p, unburnt.len(), self.target - self.sample.len());
        for &next in unburnt.choose_multiple(rng, burn) {
            self.ignite(next);
        }
        true
    }
}
