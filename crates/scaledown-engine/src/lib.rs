//! scaledown-engine: Representative sampling of tenant resource graphs.
//!
//! Streams a tenant's abstracted resource graph out of the store, builds an
//! in-memory representation, and selects a smaller representative node set
//! (forest fire, Metropolis–Hastings random walk, random walk, or property
//! pattern). The sample is scored against the original with structural
//! quality metrics and then either pruned in place or exported as YAML,
//! JSON, or a replayable Cypher script.

pub mod error;
pub mod export;
pub mod extract;
pub mod graph;
pub mod metrics;
pub mod operations;
pub mod orchestrator;
pub mod samplers;
pub mod types;

pub use error::{Phase, Result, ScaleDownError};
pub use export::ExportFormat;
pub use extract::GraphExtractor;
pub use graph::ResourceGraph;
pub use metrics::{DegradedMetric, QualityMetrics, QualityMetricsCalculator};
pub use operations::{discover_motifs, GraphOperations};
pub use orchestrator::{resolve_target_count, ScaleDownOrchestrator};
pub use samplers::SamplingAlgorithm;
pub use types::{OutputMode, ScaleDownOutcome, ScaleDownRequest, TemplateEmitter};
