//! bfs-dispatch-demo — run a handful of BFS queries through the dispatcher
//! and print the result mapping as JSON.
//!
//! Usage:
//!   cargo run --bin bfs-dispatch-demo
//!   cargo run --bin bfs-dispatch-demo -- --workers 4 --queries 0,3,3,1
//!   cargo run --bin bfs-dispatch-demo -- --graph graph.json --strategy per-query
//!
//! The graph file is a JSON object of adjacency lists: `{"0": [1, 2], "1": []}`.
//! Dispatch settings not given on the command line come from
//! `DispatchConfig::from_env()` (`BFS_DISPATCH_MAX_CONCURRENCY`,
//! `BFS_DISPATCH_STRATEGY`, `BFS_DISPATCH_DUPLICATES`,
//! `BFS_DISPATCH_CHANNEL_CAPACITY`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;

use bfs_dispatch::{AdmissionStrategy, DispatchConfig, DuplicatePolicy, Graph, QueryDispatcher};

/// Concurrent BFS query demo
#[derive(Parser, Debug)]
#[command(name = "bfs-dispatch-demo")]
#[command(about = "Answer BFS queries over a shared graph with bounded concurrency")]
struct Args {
    /// Maximum number of simultaneous traversals
    #[arg(long, short = 'w', allow_negative_numbers = true)]
    workers: Option<i64>,

    /// Comma-separated start nodes
    #[arg(
        long,
        short = 'q',
        env = "BFS_DISPATCH_QUERIES",
        value_delimiter = ',',
        default_value = "0,1,2"
    )]
    queries: Vec<i64>,

    /// JSON adjacency file; the built-in five-node graph is used when omitted
    #[arg(long, short = 'g', env = "BFS_DISPATCH_GRAPH")]
    graph: Option<PathBuf>,

    /// Admission strategy: worker-pool | per-query
    #[arg(long)]
    strategy: Option<AdmissionStrategy>,

    /// Duplicate query handling: collapse | run-each
    #[arg(long)]
    duplicates: Option<DuplicatePolicy>,

    /// Also print dispatch statistics
    #[arg(long)]
    stats: bool,
}

impl Args {
    /// Command-line flags override whatever `base` carries.
    fn dispatch_config(&self, base: DispatchConfig) -> DispatchConfig {
        let mut config = base;
        if let Some(workers) = self.workers {
            config.max_concurrency = workers;
        }
        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if let Some(duplicates) = self.duplicates {
            config.duplicates = duplicates;
        }
        config
    }
}

fn builtin_graph() -> Graph<i64> {
    [
        (0, vec![1, 2]),
        (1, vec![2, 3]),
        (2, vec![3]),
        (3, vec![4]),
        (4, vec![]),
    ]
    .into_iter()
    .collect()
}

fn load_graph(path: &Path) -> Result<Graph<i64>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read graph file {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse graph file {}", path.display()))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,bfs_dispatch=debug".into()),
        )
        .init();

    let args = Args::parse();

    let graph = match &args.graph {
        Some(path) => load_graph(path)?,
        None => builtin_graph(),
    };
    tracing::info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        queries = args.queries.len(),
        "graph loaded"
    );

    let config = args.dispatch_config(DispatchConfig::from_env());
    let report = QueryDispatcher::new(config)
        .dispatch_with_report(Arc::new(graph), &args.queries)
        .await
        .context("Dispatch failed")?;

    // Key-sorted for stable output.
    let sorted: BTreeMap<_, _> = report.results.into_iter().collect();
    println!("{}", serde_json::to_string_pretty(&sorted)?);

    if args.stats {
        println!("{}", serde_json::to_string_pretty(&report.stats)?);
    }

    Ok(())
}
