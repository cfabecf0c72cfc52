//! Request and outcome types for scale-down runs.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use scaledown_core::{PropertyMap, TenantId};

use crate::error::{Result, ScaleDownError};
use crate::export::ExportFormat;
use crate::graph::ResourceGraph;
use crate::metrics::QualityMetrics;
use crate::samplers::SamplingAlgorithm;

/// What to do with a sample once it is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputMode {
    /// Prune the tenant's abstracted layer down to the sample.
    Delete,
    /// Accepted, handled outside this engine.
    Export,
    /// Accepted, handled outside this engine.
    NewTenant,
    Yaml,
    Json,
    /// Cypher script.
    Neo4j,
    Terraform,
    Arm,
    Bicep,
}

impl OutputMode {
    pub const ALL: [OutputMode; 9] = [
        Self::Delete,
        Self::Export,
        Self::NewTenant,
        Self::Yaml,
        Self::Json,
        Self::Neo4j,
        Self::Terraform,
        Self::Arm,
        Self::Bicep,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Delete => "delete",
            Self::Export => "export",
            Self::NewTenant => "new-tenant",
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Neo4j => "neo4j",
            Self::Terraform => "terraform",
            Self::Arm => "arm",
            Self::Bicep => "bicep",
        }
    }

    /// File format for modes rendered by this crate.
    pub fn export_format(&self) -> Option<ExportFormat> {
        match self {
            Self::Yaml => Some(ExportFormat::Yaml),
            Self::Json => Some(ExportFormat::Json),
            Self::Neo4j => Some(ExportFormat::Cypher),
            _ => None,
        }
    }

    /// Modes rendered by a [`TemplateEmitter`].
    pub fn is_template(&self) -> bool {
        matches!(self, Self::Terraform | Self::Arm | Self::Bicep)
    }
}

impl std::fmt::Display for OutputMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputMode {
    type Err = ScaleDownError;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| {
                let valid: Vec<&str> = Self::ALL.iter().map(|m| m.as_str()).collect();
                ScaleDownError::InvalidArgument(format!(
                    "unknown output mode '{s}'. Choose: {}",
                    valid.join(", ")
                ))
            })
    }
}

/// Renders infrastructure-as-code templates (Terraform, ARM, Bicep) for a
/// sample. Implemented outside this crate.
pub trait TemplateEmitter: Send + Sync {
    fn emit(
        &self,
        mode: OutputMode,
        kept_ids: &BTreeSet<String>,
        properties: &PropertyMap,
        subgraph: &ResourceGraph,
        output_path: &Path,
    ) -> Result<()>;
}

/// One scale-down invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScaleDownRequest {
    pub tenant_id: TenantId,
    pub algorithm: SamplingAlgorithm,
    /// `< 1.0` is a fraction of the node count, otherwise an absolute count.
    pub target_size: f64,
    pub output_mode: OutputMode,
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// Property criteria for pattern sampling.
    #[serde(default)]
    pub criteria: Option<BTreeMap<String, Value>>,
    /// Fixed RNG seed; entropy-seeded when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ScaleDownRequest {
    /// Build a request from string-typed algorithm and output mode.
    pub fn parse(
        tenant_id: TenantId,
        algorithm: &str,
        target_size: f64,
        output_mode: &str,
        output_path: Option<PathBuf>,
    ) -> Result<Self> {
        Ok(Self {
            tenant_id,
            algorithm: algorithm.parse()?,
            target_size,
            output_mode: output_mode.parse()?,
            output_path,
            criteria: None,
            seed: None,
        })
    }

    pub fn with_criteria(mut self, criteria: BTreeMap<String, Value>) -> Self {
        self.criteria = Some(criteria);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct ScaleDownOutcome {
    pub kept_ids: BTreeSet<String>,
    pub metrics: QualityMetrics,
    /// Nodes removed from the store; 0 unless the output mode is `delete`.
    pub deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_mode_parsing() {
        assert_eq!("new-tenant".parse::<OutputMode>().unwrap(), OutputMode::NewTenant);
        assert_eq!("neo4j".parse::<OutputMode>().unwrap(), OutputMode::Neo4j);
        assert!("csv".parse::<OutputMode>().is_err());
        for mode in OutputMode::ALL {
            assert_eq!(mode.as_str().parse::<OutputMode>().unwrap(), mode);
        }
    }

    #[test]
    fn test_output_mode_serde_matches_as_str() {
        assert_eq!(
            serde_json::to_string(&OutputMode::NewTenant).unwrap(),
            "\"new-tenant\""
        );
    }

    #[test]
    fn test_mode_routing() {
        assert_eq!(OutputMode::Neo4j.export_format(), Some(ExportFormat::Cypher));
        assert_eq!(OutputMode::Delete.export_format(), None);
        assert!(OutputMode::Bicep.is_template());
        assert!(!OutputMode::Yaml.is_template());
    }

    #[test]
    fn test_request_parse() {
        let request =
            ScaleDownRequest::parse(TenantId::new(), "mhrw", 0.5, "json", None).unwrap();
        assert_eq!(request.algorithm, SamplingAlgorithm::Mhrw);
        assert_eq!(request.output_mode, OutputMode::Json);

        assert!(ScaleDownRequest::parse(TenantId::new(), "bfs", 0.5, "json", None).is_err());
        assert!(ScaleDownRequest::parse(TenantId::new(), "mhrw", 0.5, "xml", None).is_err());
    }
}
