//! Metropolis–Hastings random walk sampling.
//!
//! A plain random walk over-samples hubs. Accepting a move from `u` to `v`
//! with probability `min(1, deg(u) / deg(v))` makes the walk's stationary
//! distribution uniform over nodes, so the sample is not biased toward
//! high-degree resources.

use std::collections::BTreeSet;

use rand::seq::SliceRandom;
use rand::Rng;

use scaledown_core::ProgressObserver;

use super::{checked_target, report_sampling, to_ids, UnvisitedPool};
use crate::error::Result;
use crate::graph::{ResourceGraph, UndirectedView};

#[derive(Debug, Clone)]
pub struct MhrwSampler {
    /// Fraction of the target spent walking before collection starts.
    pub burn_in_ratio: f64,
    /// Consecutive non-adding steps tolerated before a forced jump.
    pub stall_limit: usize,
}

impl Default for MhrwSampler {
    fn default() -> Self {
        Self {
            burn_in_ratio: 0.1,
            stall_limit: 100,
        }
    }
}

impl MhrwSampler {
    /// Number of initial steps excluded from the sample.
    pub fn burn_in_steps(&self, target: usize) -> usize {
        (self.burn_in_ratio * target as f64).floor() as usize
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
        let n = view.node_count();

        let mut walk = Walk::new(&view, self.burn_in_steps(target), self.stall_limit);
        walk.current = rng.gen_range(0..n);

        while walk.sample.len() < target && walk.sample.len() < n {
            if walk.step(rng) {
                report_sampling(progress, walk.sample.len(), target);
            }
        }

        tracing::debug!(
            sampled = walk.sample.len(),
            target,
            steps = walk.steps,
            burn_in = walk.burn_in,
            "MHRW complete"
        );
        Ok(to_ids(graph, &walk.sample))
    }
}

struct Walk<'v> {
    view: &'v UndirectedView,
    unsampled: UnvisitedPool,
    sample: Vec<usize>,
    current: usize,
    steps: usize,
    stalled: usize,
    burn_in: usize,
    stall_limit: usize,
}

impl<'v> Walk<'v> {
    fn new(view: &'v UndirectedView, burn_in: usize, stall_limit: usize) -> Self {
        Self {
            view,
            unsampled: UnvisitedPool::new(view.node_count()),
            sample: Vec::new(),
            current: 0,
            steps: 0,
            stalled: 0,
            burn_in,
            stall_limit,
        }
    }

    /// One walk step. Returns whether a node was added to the sample.
    fn step<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        let collecting = self.steps >= self.burn_in;
        self.steps += 1;

        let view = self.view;
        let neighbors = view.neighbors(self.current);
        let added = if neighbors.is_empty() {
            let added = collecting && self.collect();
            let n = view.node_count();
            self.current = self
                .unsampled
                .pick(rng)
                .unwrap_or_else(|| rng.gen_range(0..n));
            added
        } else {
            if let Some(&candidate) = neighbors.choose(rng) {
                let acceptance =
                    (view.degree(self.current) as f64 / view.degree(candidate) as f64).min(1.0);
                if rng.gen::<f64>() < acceptance {
                    self.current = candidate;
                }
            }
            collecting && self.collect()
        };

        if added {
            self.stalled = 0;
        } else {
            self.stalled += 1;
            if self.stalled >= self.stall_limit {
                if let Some(next) = self.unsampled.pick(rng) {
                    self.current = next;
                }
                self.stalled = 0;
            }
        }
        added
    }

    fn collect(&mut self) -> bool {
        if self.unsampled.remove(self.current) {
            self.sample.push(self.current);
            true
        } else {
            false
        }
    }
}
