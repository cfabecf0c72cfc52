//! End-to-end pipeline runs against the in-memory store.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde_json::json;

use scaledown_core::{NodeLayer, Properties, ScaleDownConfig, TenantId, LINEAGE_RELATIONSHIP};
use scaledown_engine::export::ExportDocument;
use scaledown_engine::{
    ScaleDownError, ScaleDownOrchestrator, ScaleDownRequest, TemplateEmitter,
};
use scaledown_graph::MemoryStore;

const TYPES: [&str; 4] = [
    "Microsoft.Compute/virtualMachines",
    "Microsoft.Network/networkInterfaces",
    "Microsoft.Storage/storageAccounts",
    "Microsoft.Network/virtualNetworks",
];

/// Twenty resources in a ring with chords, each with an original-layer twin.
fn seeded_store() -> (MemoryStore, TenantId) {
    let store = MemoryStore::new();
    let tenant = TenantId::new();
    store.add_tenant(&tenant);

    for i in 0..20 {
        let mut p = Properties::new();
        p.insert("type".into(), json!(TYPES[i % TYPES.len()]));
        p.insert(
            "tags.environment".into(),
            json!(if i % 2 == 0 { "prod" } else { "dev" }),
        );
        let id = format!("res-{i:02}");
        store.insert_node(&tenant, &id, p.clone());
        store.insert_original_node(&tenant, &format!("orig-{i:02}"), p);
        store.insert_edge(
            &tenant,
            &id,
            &format!("orig-{i:02}"),
            LINEAGE_RELATIONSHIP,
            Properties::new(),
        );
    }
    for i in 0..20 {
        store.insert_edge(
            &tenant,
            &format!("res-{i:02}"),
            &format!("res-{:02}", (i + 1) % 20),
            "CONNECTED_TO",
            Properties::new(),
        );
    }
    for i in (0..20).step_by(5) {
        store.insert_edge(
            &tenant,
            &format!("res-{i:02}"),
            &format!("res-{:02}", (i + 10) % 20),
            "DEPENDS_ON",
            Properties::new(),
        );
    }
    (store, tenant)
}

fn request(tenant: &TenantId, algorithm: &str, target: f64, mode: &str) -> ScaleDownRequest {
    ScaleDownRequest::parse(tenant.clone(), algorithm, target, mode, None)
        .unwrap()
        .with_seed(7)
}

#[tokio::test]
async fn test_delete_prunes_to_sample() {
    let (store, tenant) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store);

    let outcome = orchestrator
        .sample_graph(&request(&tenant, "forest_fire", 0.5, "delete"), None)
        .await
        .unwrap();

    assert_eq!(outcome.kept_ids.len(), 10);
    assert_eq!(outcome.deleted_count, 10);
    assert_eq!(outcome.metrics.original_nodes, 20);
    assert_eq!(outcome.metrics.sampled_nodes, 10);
    assert_eq!(outcome.metrics.original_edges, 24);
    assert!((outcome.metrics.sampling_ratio - 0.5).abs() < 1e-12);

    let store = orchestrator.store();
    let remaining: Vec<String> = store.node_ids(&tenant, NodeLayer::Abstracted);
    assert_eq!(
        remaining,
        outcome.kept_ids.iter().cloned().collect::<Vec<_>>()
    );
    assert_eq!(store.node_ids(&tenant, NodeLayer::Original).len(), 20);
}

#[tokio::test]
async fn test_json_export_leaves_store_untouched() {
    let (store, tenant) = seeded_store();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sample.json");
    let orchestrator = ScaleDownOrchestrator::new(store);

    let mut req = request(&tenant, "random_walk", 6.0, "json");
    req.output_path = Some(path.clone());
    let outcome = orchestrator.sample_graph(&req, None).await.unwrap();

    assert_eq!(outcome.kept_ids.len(), 6);
    assert_eq!(outcome.deleted_count, 0);
    assert_eq!(orchestrator.store().mutation_count(), 0);

    let doc: ExportDocument =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(doc.nodes.len(), 6);
    assert_eq!(doc.relationships.len(), outcome.metrics.sampled_edges);
}

#[tokio::test]
async fn test_seeded_runs_are_reproducible() {
    let (store, tenant) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store);
    let req = request(&tenant, "mhrw", 0.4, "export");

    let first = orchestrator.sample_graph(&req, None).await.unwrap();
    let second = orchestrator.sample_graph(&req, None).await.unwrap();
    assert_eq!(first.kept_ids, second.kept_ids);
}

#[tokio::test]
async fn test_pattern_selects_by_criteria() {
    let (store, tenant) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store);

    let criteria: BTreeMap<String, serde_json::Value> = [
        ("type".to_string(), json!("Microsoft.Compute/virtualMachines")),
        ("tags.environment".to_string(), json!("prod")),
    ]
    .into_iter()
    .collect();
    let req = request(&tenant, "pattern", 1.0, "new-tenant").with_criteria(criteria);

    let outcome = orchestrator.sample_graph(&req, None).await.unwrap();
    // Every fourth node is a VM and all of those are even, hence prod.
    let expected: Vec<&str> = vec!["res-00", "res-04", "res-08", "res-12", "res-16"];
    assert_eq!(
        outcome.kept_ids.iter().map(String::as_str).collect::<Vec<_>>(),
        expected
    );
}

#[tokio::test]
async fn test_invalid_criteria_rejected_before_store() {
    let (store, tenant) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store);

    let criteria: BTreeMap<String, serde_json::Value> =
        [("bogus_field".to_string(), json!("x"))].into_iter().collect();
    let req = request(&tenant, "pattern", 1.0, "delete").with_criteria(criteria);

    let err = orchestrator.sample_graph(&req, None).await.unwrap_err();
    assert!(matches!(err, ScaleDownError::InvalidArgument(_)));
    assert_eq!(orchestrator.store().read_count(), 0);
    assert_eq!(orchestrator.store().mutation_count(), 0);
}

#[tokio::test]
async fn test_unknown_tenant() {
    let (store, _) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store);
    let err = orchestrator
        .sample_graph(&request(&TenantId::new(), "forest_fire", 0.5, "delete"), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ScaleDownError::NotFound { .. }));
}

#[tokio::test]
async fn test_progress_phases_in_order() {
    let (store, tenant) = seeded_store();
    let orchestrator = ScaleDownOrchestrator::new(store).with_config(ScaleDownConfig {
        batch_size: 8,
        ..ScaleDownConfig::default()
    });

    let phases = RefCell::new(Vec::<String>::new());
    let cb = |phase: &str, _current: usize, _total: usize| {
        let mut seen = phases.borrow_mut();
        if seen.last().map(String::as_str) != Some(phase) {
            seen.push(phase.to_string());
        }
    };
    orchestrator
        .sample_graph(&request(&tenant, "forest_fire", 0.5, "export"), Some(&cb))
        .await
        .unwrap();

    assert_eq!(
        phases.into_inner(),
        vec!["nodes", "edges", "sampling", "metrics", "output"]
    );
}

struct RecordingEmitter {
    calls: std::sync::Mutex<Vec<String>>,
}

impl TemplateEmitter for RecordingEmitter {
    fn emit(
        &self,
        mode: scaledown_engine::OutputMode,
        kept_ids: &std::collections::BTreeSet<String>,
        _properties: &scaledown_core::PropertyMap,
        _subgraph: &scaledown_engine::ResourceGraph,
        _output_path: &std::path::Path,
    ) -> scaledown_engine::Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{mode}:{}", kept_ids.len()));
        Ok(())
    }
}

#[tokio::test]
async fn test_template_modes_use_emitter() {
    let (store, tenant) = seeded_store();
    let emitter = std::sync::Arc::new(RecordingEmitter {
        calls: std::sync::Mutex::new(Vec::new()),
    });

    struct Shared(std::sync::Arc<RecordingEmitter>);
    impl TemplateEmitter for Shared {
        fn emit(
            &self,
            mode: scaledown_engine::OutputMode,
            kept_ids: &std::collections::BTreeSet<String>,
            properties: &scaledown_core::PropertyMap,
            subgraph: &scaledown_engine::ResourceGraph,
            output_path: &std::path::Path,
        ) -> scaledown_engine::Result<()> {
            self.0.emit(mode, kept_ids, properties, subgraph, output_path)
        }
    }

    let orchestrator = ScaleDownOrchestrator::new(store)
        .with_template_emitter(Box::new(Shared(emitter.clone())));
    let mut req = request(&tenant, "forest_fire", 4.0, "terraform");
    req.output_path = Some("main.tf".into());
    orchestrator.sample_graph(&req, None).await.unwrap();

    assert_eq!(*emitter.calls.lock().unwrap(), vec!["terraform:4".to_string()]);
}
