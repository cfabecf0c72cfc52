//! CLI entry point for the scale-down engine.
//!
//! Writes JSON results to stdout; logs go to stderr.

use std::collections::BTreeMap;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use scaledown_core::config::{layered, load_scale_down_config};
use scaledown_core::TenantId;
use scaledown_engine::{ScaleDownOrchestrator, ScaleDownRequest};
use scaledown_graph::{GraphClient, GraphConfig};

#[derive(Parser)]
#[command(name = "scaledown")]
#[command(about = "Representative sampling and pruning of tenant resource graphs")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Tenant ID (UUID).
    #[arg(long, global = true)]
    tenant_id: Option<String>,

    /// Config file prefix (default: scaledown).
    #[arg(short, long, default_value = "scaledown", global = true)]
    config: String,

    /// Fixed RNG seed for reproducible runs.
    #[arg(long, global = true)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    /// Sample a tenant graph and delete or export the rest.
    Sample {
        /// forest_fire, mhrw, random_walk, or pattern.
        #[arg(long)]
        algorithm: Option<String>,
        /// Fraction of nodes (< 1.0) or absolute node count.
        #[arg(long)]
        target_size: f64,
        /// delete, export, new-tenant, yaml, json, neo4j, terraform, arm, or bicep.
        #[arg(long, default_value = "yaml")]
        output_mode: String,
        #[arg(long)]
        output_path: Option<PathBuf>,
        /// Pattern criteria as a JSON object.
        #[arg(long)]
        criteria: Option<String>,
    },
    /// Discover recurring connected motifs in a tenant graph.
    Motifs,
}

/// Work resolved from the command line before any store connection.
#[derive(Debug)]
enum Job {
    Sample(ScaleDownRequest),
    Motifs,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let tenant_id = resolve_tenant_id(&cli)?;
    let settings = load_scale_down_config(&cli.config)?;

    let job = match cli.command {
        Command::Sample {
            algorithm,
            target_size,
            output_mode,
            output_path,
            criteria,
        } => Job::Sample(sample_request(
            tenant_id.clone(),
            algorithm.as_deref().unwrap_or(&settings.default_algorithm),
            target_size,
            &output_mode,
            output_path,
            criteria.as_deref(),
            cli.seed,
        )?),
        Command::Motifs => Job::Motifs,
    };

    let graph_config = match layered(&cli.config) {
        Ok(cfg) => GraphConfig::from_config(&cfg),
        Err(e) => {
            tracing::warn!(error = %e, "Config unreadable, using Neo4j defaults");
            GraphConfig::default()
        }
    };
    let client = GraphClient::connect(&graph_config).await?;
    let orchestrator = ScaleDownOrchestrator::new(client).with_config(settings);

    match job {
        Job::Sample(request) => {
            let progress = |phase: &str, current: usize, total: usize| {
                tracing::debug!(phase, current, total, "Progress");
            };
            let outcome = orchestrator.sample_graph(&request, Some(&progress)).await?;
            println!("{}", serde_json::to_string(&outcome)?);
        }
        Job::Motifs => {
            let motifs = orchestrator.discover_motifs(&tenant_id, cli.seed, None).await?;
            println!("{}", serde_json::to_string(&motifs)?);
        }
    }

    Ok(())
}

fn resolve_tenant_id(cli: &Cli) -> anyhow::Result<TenantId> {
    let raw = cli
        .tenant_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--tenant-id is required"))?;
    Ok(raw.parse()?)
}

/// Build a sampling request from raw CLI arguments.
fn sample_request(
    tenant_id: TenantId,
    algorithm: &str,
    target_size: f64,
    output_mode: &str,
    output_path: Option<PathBuf>,
    criteria: Option<&str>,
    seed: Option<u64>,
) -> anyhow::Result<ScaleDownRequest> {
    let mut request =
        ScaleDownRequest::parse(tenant_id, algorithm, target_size, output_mode, output_path)?;
    if let Some(raw) = criteria {
        let parsed: BTreeMap<String, serde_json::Value> = serde_json::from_str(raw)?;
        request = request.with_criteria(parsed);
    }
    if let Some(seed) = seed {
        request = request.with_seed(seed);
    }
    Ok(request)
}
