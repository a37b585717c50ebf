use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use routewarm_core::{ChunkGraph, ManifestBuilder, RemoteModuleMap, MANIFEST_FILENAME};

/// Generate a route asset manifest from a route table and bundler stats.
#[derive(Parser, Debug)]
#[command(name = "routewarm", version)]
struct Args {
    /// Route table source file (the module declaring the lazy routes)
    #[arg(long)]
    router: PathBuf,

    /// Bundler stats JSON describing the chunk graph
    #[arg(long)]
    stats: PathBuf,

    /// Output directory holding the emitted bundles
    #[arg(long)]
    dist: PathBuf,

    /// Standalone manifest filename
    #[arg(long, default_value = MANIFEST_FILENAME)]
    filename: String,

    /// JSON file mapping route keys to remote-module hrefs
    #[arg(long)]
    remotes: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let stats = tokio::fs::read_to_string(&args.stats)
        .await
        .with_context(|| format!("reading stats {}", args.stats.display()))?;
    let graph = ChunkGraph::from_stats_json(&stats)?;

    let mut builder = ManifestBuilder::new(&args.router).filename(args.filename.clone());
    if let Some(path) = &args.remotes {
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading remote-module map {}", path.display()))?;
        let remotes: RemoteModuleMap = serde_json::from_str(&raw)?;
        builder = builder.remote_modules(remotes);
    }

    let manifest = builder.run(&graph, &args.dist).await?;
    tracing::info!(
        routes = manifest.len(),
        "Done, manifest at {}",
        args.dist.join(&args.filename).display()
    );
    Ok(())
}
