//! Sample exporters.
//!
//! | Format | Output |
//! |--------|--------|
//! | `Yaml` | [`ExportDocument`] as YAML |
//! | `Json` | [`ExportDocument`] as pretty JSON |
//! | `Cypher` | Replayable `CREATE`/`MATCH` script |
//!
//! Every export is all-or-nothing: content is written to a temporary file in
//! the destination directory and renamed over the destination only after it
//! has been flushed and synced.

pub mod cypher;
pub mod document;

use std::collections::BTreeSet;
use std::io::Write;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use scaledown_core::PropertyMap;

use crate::error::{Result, ScaleDownError};
use crate::graph::ResourceGraph;

pub use document::{ExportDocument, ExportMetadata, ExportNode, ExportRelationship};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Yaml,
    Json,
    Cypher,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Cypher => "cypher",
        }
    }

    /// Render the sample and atomically write it to `output_path`.
    pub fn export(
        &self,
        node_ids: &BTreeSet<String>,
        properties: &PropertyMap,
        subgraph: &ResourceGraph,
        output_path: &Path,
    ) -> Result<()> {
        let generated_at = Utc::now();
        let content = match self {
            Self::Cypher => cypher::render(node_ids, properties, subgraph, generated_at),
            Self::Json => {
                let doc =
                    ExportDocument::build(self.as_str(), node_ids, properties, subgraph, generated_at);
                serde_json::to_string_pretty(&doc)
                    .map_err(|e| ScaleDownError::Serialization(e.to_string()))?
            }
            Self::Yaml => {
                let doc =
                    ExportDocument::build(self.as_str(), node_ids, properties, subgraph, generated_at);
                serde_yaml::to_string(&doc)
                    .map_err(|e| ScaleDownError::Serialization(e.to_string()))?
            }
        };

        write_atomic(output_path, content.as_bytes())?;
        tracing::info!(
            format = self.as_str(),
            path = %output_path.display(),
            nodes = node_ids.len(),
            relationships = subgraph.edge_count(),
            "Export written"
        );
        Ok(())
    }
}

/// Write `bytes` to `path` via a synced temporary file and a rename. On any
/// failure the destination is left as it was.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| ScaleDownError::Export(format!("{}: {}", path.display(), e.error)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scaledown_core::Properties;
    use serde_json::json;

    fn sample() -> (BTreeSet<String>, PropertyMap, ResourceGraph) {
        let graph = ResourceGraph::from_edge_list(
            ["vm-1", "disk-1", "nic-1"],
            [("vm-1", "disk-1", "ATTACHED_TO"), ("vm-1", "nic-1", "USES")],
        );
        let mut properties = PropertyMap::new();
        let mut p = Properties::new();
        p.insert("type".into(), json!("Microsoft.Compute/virtualMachines"));
        properties.insert("vm-1".to_string(), p);
        let ids = graph.ids().iter().cloned().collect();
        (ids, properties, graph)
    }

    #[test]
    fn test_json_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        let (ids, properties, graph) = sample();

        ExportFormat::Json
            .export(&ids, &properties, &graph, &path)
            .unwrap();

        let doc: ExportDocument =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let recovered: BTreeSet<String> = doc.nodes.iter().map(|n| n.id.clone()).collect();
        assert_eq!(recovered, ids);
        assert_eq!(doc.relationships.len(), 2);
        assert_eq!(doc.metadata.format, "json");
        assert_eq!(doc.metadata.node_count, 3);
    }

    #[test]
    fn test_yaml_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.yaml");
        let (ids, properties, graph) = sample();

        ExportFormat::Yaml
            .export(&ids, &properties, &graph, &path)
            .unwrap();

        let doc: ExportDocument =
            serde_yaml::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(doc.nodes.len(), 3);
        assert_eq!(doc.relationships[0].rel_type, "ATTACHED_TO");
    }

    #[test]
    fn test_cypher_export_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.cypher");
        let (ids, properties, graph) = sample();

        ExportFormat::Cypher
            .export(&ids, &properties, &graph, &path)
            .unwrap();
        let script = std::fs::read_to_string(&path).unwrap();
        assert!(script.starts_with("// Scale-down sample export"));
        assert!(script.contains("CREATE (:virtualMachines:Resource {id: \"vm-1\""));
    }

    #[test]
    fn test_failed_export_leaves_destination_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing-dir").join("sample.json");
        let (ids, properties, graph) = sample();

        assert!(ExportFormat::Json
            .export(&ids, &properties, &graph, &path)
            .is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_overwrite_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.json");
        std::fs::write(&path, "stale").unwrap();
        let (ids, properties, graph) = sample();

        ExportFormat::Json
            .export(&ids, &properties, &graph, &path)
            .unwrap();
        assert_ne!(std::fs::read_to_string(&path).unwrap(), "stale");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
