use std::path::{Path, PathBuf};

use crate::chunks::ChunkGraph;
use crate::error::BuildError;
use crate::manifest::{build_manifest, Manifest, RemoteModuleMap, MANIFEST_FILENAME};
use crate::routes::parse_route_table;

/// Runs the manifest build: scans the route table, matches routes against
/// the chunk graph, writes the standalone manifest file and prepends the
/// inline assignment to the entry bundle.
pub struct ManifestBuilder {
    router_path: PathBuf,
    filename: String,
    remotes: RemoteModuleMap,
}

impl ManifestBuilder {
    pub fn new(router_path: impl Into<PathBuf>) -> Self {
        Self {
            router_path: router_path.into(),
            filename: MANIFEST_FILENAME.to_string(),
            remotes: RemoteModuleMap::new(),
        }
    }

    /// Override the standalone manifest filename.
    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    /// Statically declared remote-module entries to append.
    pub fn remote_modules(mut self, remotes: RemoteModuleMap) -> Self {
        self.remotes = remotes;
        self
    }

    pub async fn run(&self, graph: &ChunkGraph, dist: &Path) -> Result<Manifest, BuildError> {
        tracing::info!("Generating route manifest...");

        // 1. Route table scan. Unreadable source aborts the build.
        let source = tokio::fs::read_to_string(&self.router_path)
            .await
            .map_err(|err| BuildError::RouteTable {
                path: self.router_path.clone(),
                err,
            })?;
        let routes = parse_route_table(&source);
        tracing::info!(routes = routes.len(), "Parsed route table");

        // 2. Construct
        let manifest = build_manifest(&routes, graph, &self.remotes);

        // 3. Standalone file
        let out = dist.join(&self.filename);
        tokio::fs::write(&out, manifest.to_json()?).await?;
        tracing::info!("Manifest written to {}", out.display());

        // 4. Inline global, prepended so it runs before any other script
        self.inject_inline(&manifest, graph, dist).await?;

        Ok(manifest)
    }

    async fn inject_inline(
        &self,
        manifest: &Manifest,
        graph: &ChunkGraph,
        dist: &Path,
    ) -> Result<(), BuildError> {
        let Some(entry) = graph.entry_chunk() else {
            tracing::warn!("no entry chunk in graph, manifest not inlined");
            return Ok(());
        };
        let Some(file) = entry
            .emitted_files
            .iter()
            .find(|file| file.to_lowercase().ends_with(".js"))
        else {
            tracing::warn!("entry chunk emitted no script, manifest not inlined");
            return Ok(());
        };

        let path = dist.join(file.trim_start_matches('/'));
        let original =
            tokio::fs::read_to_string(&path)
                .await
                .map_err(|err| BuildError::EntryBundle {
                    path: path.clone(),
                    err,
                })?;
        let banner = manifest.inline_banner()?;
        tokio::fs::write(&path, format!("{banner}\n{original}")).await?;
        tracing::info!("Manifest inlined into {}", path.display());
        Ok(())
    }
}
