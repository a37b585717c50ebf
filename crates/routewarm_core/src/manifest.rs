use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::assets::{normalize_href, AssetKind, AssetRef};
use crate::chunks::ChunkGraph;
use crate::error::BuildError;
use crate::routes::RouteEntry;

/// Route key for assets every route needs (the entry chunk's files).
pub const ENTRY_KEY: &str = "*";

/// Default name of the standalone manifest file.
pub const MANIFEST_FILENAME: &str = "router-manifest.json";

/// Name of the global the manifest is assigned to when inlined into the
/// entry bundle.
pub const MANIFEST_GLOBAL: &str = "__ROUTER_MANIFEST__";

/// Statically declared remote-module entries, route key to container href.
pub type RemoteModuleMap = BTreeMap<String, String>;

/// The build-time-produced route to asset-list mapping.
///
/// Built once per build and treated as immutable at runtime after load.
/// Serializes as a plain JSON object of route key to asset array.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    entries: BTreeMap<String, Vec<AssetRef>>,
}

impl Manifest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, files: Vec<AssetRef>) {
        self.entries.insert(key.into(), files);
    }

    /// Append one asset to a route key, creating the key if absent.
    pub fn push(&mut self, key: &str, file: AssetRef) {
        self.entries.entry(key.to_string()).or_default().push(file);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn files_for(&self, key: &str) -> Option<&[AssetRef]> {
        self.entries.get(key).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<AssetRef>)> {
        self.entries.iter()
    }

    pub fn to_json(&self) -> Result<String, BuildError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(source: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(source)?)
    }

    /// The global assignment prepended to the entry bundle so the manifest
    /// is available before any other script executes.
    pub fn inline_banner(&self) -> Result<String, BuildError> {
        Ok(format!(
            "window.{MANIFEST_GLOBAL}={};",
            serde_json::to_string(self)?
        ))
    }
}

/// Pure manifest construction from the parsed route table, the bundler's
/// chunk graph and any statically declared remote modules.
pub fn build_manifest(
    routes: &[RouteEntry],
    graph: &ChunkGraph,
    remotes: &RemoteModuleMap,
) -> Manifest {
    let mut manifest = Manifest::new();

    // 1. Entry-wide assets under the sentinel key
    if let Some(entry) = graph.entry_chunk() {
        manifest.insert(ENTRY_KEY, asset_list(&entry.emitted_files));
    }

    // 2. One lookup per route, in route-table order; a route key is filled
    //    at most once
    for route in routes {
        if manifest.contains(&route.path_pattern) {
            continue;
        }
        match graph.match_route(&route.import_specifier) {
            Some(chunk) => {
                manifest.insert(route.path_pattern.clone(), asset_list(&chunk.emitted_files));
            }
            None => {
                tracing::debug!(
                    route = %route.path_pattern,
                    specifier = %route.import_specifier,
                    "no chunk matched, route left out of the manifest"
                );
            }
        }
    }

    // 3. Remote-module entries go last, keyed by their own route
    for (route, href) in remotes {
        manifest.push(route, AssetRef::new(AssetKind::RemoteModule, href.clone()));
    }

    manifest
}

fn asset_list(files: &[String]) -> Vec<AssetRef> {
    files
        .iter()
        .filter_map(|file| {
            AssetKind::from_file(file).map(|kind| AssetRef::new(kind, normalize_href(file)))
        })
        .collect()
}
