//! Random walk sampling with restart on dead ends.

use std::collections::BTreeSet;

use rand::seq::IteratorRandom;
use rand::Rng;

use scaledown_core::ProgressObserver;

use super::{checked_target, report_sampling, to_ids, UnvisitedPool};
use crate::error::Result;
use crate::graph::ResourceGraph;

/// Walks to a uniformly random unvisited neighbor each step. When every
/// neighbor has been visited the walk jumps to a random unvisited node.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomWalkSampler;

impl RandomWalkSampler {
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

        let mut unvisited = UnvisitedPool::new(n);
        let mut sample = Vec::with_capacity(target);
        let mut current = rng.gen_range(0..n);
        unvisited.remove(current);
        sample.push(current);
        let mut restarts = 0usize;

        while sample.len() < target {
            let next = view
                .neighbors(current)
                .iter()
                .copied()
                .filter(|&v| unvisited.contains(v))
                .choose(rng);
            let next = match next {
                Some(next) => next,
                None => match unvisited.pick(rng) {
                    Some(jump) => {
                        restarts += 1;
                        jump
                    }
                    None => break,
                },
            };

            unvisited.remove(next);
            sample.push(next);
            current = next;
            report_sampling(progress, sample.len(), target);
        }

        tracing::debug!(sampled = sample.len(), target, restarts, "Random walk complete");
        Ok(to_ids(graph, &sample))
    }
}
