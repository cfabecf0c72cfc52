//! End-to-end scale-down pipeline.

use std::collections::BTreeSet;
use std::time::Instant;

use rand::rngs::StdRng;
use rand::SeedableRng;

use scaledown_core::progress::{report, ProgressObserver};
use scaledown_core::{ScaleDownConfig, TenantId};
use scaledown_graph::{GraphStore, PropertyPredicate};

use crate::error::{Result, ScaleDownError};
use crate::extract::GraphExtractor;
use crate::metrics::QualityMetricsCalculator;
use crate::operations::{self, GraphOperations};
use crate::samplers::{PatternSampler, SamplingAlgorithm};
use crate::types::{OutputMode, ScaleDownOutcome, ScaleDownRequest, TemplateEmitter};

/// Resolve a requested size against the node count.
///
/// Values below 1.0 are a fraction of `node_count`, anything else an absolute
/// count. The result is clamped to `[1, node_count]`.
pub fn resolve_target_count(target_size: f64, node_count: usize) -> usize {
    let raw = if target_size < 1.0 {
        (target_size * node_count as f64).floor()
    } else {
        target_size.floor()
    };
    (raw as usize).clamp(1, node_count.max(1))
}

/// Sequences extract, sample, metrics, and output for one tenant.
pub struct ScaleDownOrchestrator<S: GraphStore> {
    store: S,
    config: ScaleDownConfig,
    emitter: Option<Box<dyn TemplateEmitter>>,
}

impl<S: GraphStore> ScaleDownOrchestrator<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: ScaleDownConfig::default(),
            emitter: None,
        }
    }

    pub fn with_config(mut self, config: ScaleDownConfig) -> Self {
        self.config = config;
        self
    }

    /// Enable the Terraform, ARM, and Bicep output modes.
    pub fn with_template_emitter(mut self, emitter: Box<dyn TemplateEmitter>) -> Self {
        self.emitter = Some(emitter);
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Reject a request before anything touches the store.
    pub fn validate(&self, request: &ScaleDownRequest) -> Result<()> {
        if !request.target_size.is_finite() || request.target_size <= 0.0 {
            return Err(ScaleDownError::InvalidArgument(format!(
                "target_size must be a positive number, got {}",
                request.target_size
            )));
        }

        if request.algorithm == SamplingAlgorithm::Pattern {
            let criteria = request.criteria.as_ref().ok_or_else(|| {
                ScaleDownError::InvalidArgument("pattern sampling requires criteria".to_string())
            })?;
            PropertyPredicate::new(criteria)
                .map_err(|e| ScaleDownError::InvalidArgument(e.to_string()))?;
        }

        if request.output_mode.is_template()
            && request.output_path.is_some()
            && self.emitter.is_none()
        {
            return Err(ScaleDownError::InvalidArgument(format!(
                "output mode '{}' needs a template emitter, none is configured",
                request.output_mode
            )));
        }

        Ok(())
    }

    /// Run the full pipeline for one request.
    pub async fn sample_graph(
        &self,
        request: &ScaleDownRequest,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<ScaleDownOutcome> {
        self.validate(request)?;
        let start = Instant::now();
        let tenant_id = &request.tenant_id;

        tracing::info!(
            tenant_id = %tenant_id,
            algorithm = %request.algorithm,
            target_size = request.target_size,
            output_mode = %request.output_mode,
            "Starting scale-down"
        );

        let (graph, properties) = GraphExtractor::new(&self.store)
            .with_batch_size(self.config.batch_size)
            .extract(tenant_id, progress)
            .await?;

        let target_count = resolve_target_count(request.target_size, graph.node_count());

        let kept_ids: BTreeSet<String> = match (request.algorithm, &request.criteria) {
            (SamplingAlgorithm::Pattern, Some(criteria)) => PatternSampler::new(&self.store)
                .sample(tenant_id, criteria)
                .await?
                .into_iter()
                .filter(|id| graph.contains(id))
                .collect(),
            (algorithm, _) => {
                let mut rng = self.rng(request.seed);
                algorithm.sample_topology(&graph, target_count, &mut rng, progress)?
            }
        };

        let subgraph = graph.induced(&kept_ids);

        report(progress, "metrics", 0, 1);
        let metrics = QualityMetricsCalculator.calculate(
            &graph,
            &subgraph,
            &properties,
            &kept_ids,
            start.elapsed(),
        );
        report(progress, "metrics", 1, 1);

        report(progress, "output", 0, 1);
        let mut deleted_count = 0;
        match (request.output_mode, request.output_path.as_deref()) {
            (OutputMode::Delete, _) => {
                deleted_count = GraphOperations::new(&self.store)
                    .delete_non_sampled(tenant_id, &kept_ids)
                    .await?;
            }
            (mode, Some(path)) if mode.export_format().is_some() || mode.is_template() => {
                match (mode.export_format(), &self.emitter) {
                    (Some(format), _) => {
                        format.export(&kept_ids, &properties, &subgraph, path)?
                    }
                    (None, Some(emitter)) => {
                        emitter.emit(mode, &kept_ids, &properties, &subgraph, path)?
                    }
                    // Rejected by validate().
                    (None, None) => {}
                }
            }
            (mode, _) => {
                tracing::debug!(output_mode = %mode, "No output written for this mode");
            }
        }
        report(progress, "output", 1, 1);

        tracing::info!(
            tenant_id = %tenant_id,
            original_nodes = metrics.original_nodes,
            sampled_nodes = metrics.sampled_nodes,
            deleted_count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Scale-down complete"
        );

        Ok(ScaleDownOutcome {
            kept_ids,
            metrics,
            deleted_count,
        })
    }

    /// Extract a tenant and discover motifs using the configured size limits.
    pub async fn discover_motifs(
        &self,
        tenant_id: &TenantId,
        seed: Option<u64>,
        progress: Option<&dyn ProgressObserver>,
    ) -> Result<Vec<BTreeSet<String>>> {
        let (graph, _) = GraphExtractor::new(&self.store)
            .with_batch_size(self.config.batch_size)
            .extract(tenant_id, progress)
            .await?;
        let mut rng = self.rng(seed);
        operations::discover_motifs(
            &graph,
            self.config.motif_size,
            self.config.max_motifs,
            &mut rng,
        )
    }

    fn rng(&self, seed: Option<u64>) -> StdRng {
        match seed.or(self.config.seed) {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
