//! Turns a resolved asset list into browser-level loading side effects,
//! consulting the module registry so a fetch the loader path already owns
//! is never duplicated.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use routewarm_core::assets::normalize_href;
use routewarm_core::{AssetKind, AssetRef};

use crate::registry::{MatchOutcome, ModuleRegistry};

/// Element-insertion side of the host document.
pub trait AssetSink: Send + Sync {
    /// Append a script element with the given src to the document head.
    fn insert_script(&self, src: &str);
    /// Append a `rel=prefetch` hint with `as` set to the kind and
    /// cross-origin enabled.
    fn insert_hint(&self, href: &str, kind: &str);
}

/// Module-federation side of the host: containers addressable by name,
/// each exposing a retrieval operation for its sub-modules.
pub trait RemoteContainers: Send + Sync {
    fn request(&self, container: &str, exposed: &str);
}

/// Applies the type-specific loading strategy for each asset at most once
/// per page lifetime. Nothing here blocks or reports failure; element
/// insertion is fire-and-forget.
pub struct AssetDispatcher {
    registry: Arc<ModuleRegistry>,
    sink: Arc<dyn AssetSink>,
    remotes: Arc<dyn RemoteContainers>,
    // Grow-only href cache; never evicted for the page's lifetime
    dispatched: Mutex<HashSet<String>>,
}

impl AssetDispatcher {
    pub fn new(
        registry: Arc<ModuleRegistry>,
        sink: Arc<dyn AssetSink>,
        remotes: Arc<dyn RemoteContainers>,
    ) -> Self {
        Self {
            registry,
            sink,
            remotes,
            dispatched: Mutex::new(HashSet::new()),
        }
    }

    pub fn dispatch(&self, files: &[AssetRef]) {
        for file in files {
            self.dispatch_one(file);
        }
    }

    fn dispatch_one(&self, file: &AssetRef) {
        {
            let mut seen = self.dispatched.lock().unwrap();
            if !seen.insert(file.href.clone()) {
                tracing::debug!(href = %file.href, "href already dispatched");
                return;
            }
        }
        match file.kind {
            AssetKind::Script => self.dispatch_script(&file.href),
            AssetKind::RemoteModule => self.dispatch_remote(&file.href),
            other => self.sink.insert_hint(&file.href, other.as_str()),
        }
    }

    fn dispatch_script(&self, href: &str) {
        match self.registry.check(href) {
            MatchOutcome::AlreadyLoaded => {
                tracing::debug!(href, "module already loaded, script insert skipped");
            }
            MatchOutcome::Preloading => {
                tracing::debug!(href, "module loader owns the fetch, script insert skipped");
            }
            MatchOutcome::NoMatch => self.sink.insert_script(&normalize_href(href)),
        }
    }

    fn dispatch_remote(&self, href: &str) {
        // The href's first two path segments name the container and the
        // exposed module
        let mut segments = href.split('/');
        let (Some(container), Some(exposed)) = (segments.next(), segments.next()) else {
            tracing::warn!(href, "malformed remote-module href");
            return;
        };
        if container.is_empty() || exposed.is_empty() {
            tracing::warn!(href, "malformed remote-module href");
            return;
        }

        let key = format!("{}_{}", container.to_lowercase(), exposed.to_lowercase());
        match self.registry.check(&key) {
            MatchOutcome::AlreadyLoaded | MatchOutcome::Preloading => {
                tracing::debug!(href, "remote module already loading, request skipped");
            }
            MatchOutcome::NoMatch => self.remotes.request(container, &format!("./{exposed}")),
        }
    }
}
