//! Process-wide table of loadable-module identifiers to readiness state.
//! The single source of truth for "has this route's component already
//! started loading".

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Fire-and-forget trigger that starts a loader's fetch.
pub type PreloadFn = Arc<dyn Fn() + Send + Sync>;

struct ModuleEntry {
    preload: PreloadFn,
    loaded: bool,
}

/// Outcome of a dispatcher-side probe against the registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchOutcome {
    /// A matching module finished loading; no further work is needed.
    AlreadyLoaded,
    /// A matching module exists and its preload was fired; the loader path
    /// owns the fetch.
    Preloading,
    /// No entry matched the probe.
    NoMatch,
}

/// Identifiers are stored lower-cased; `loaded` is monotonic, once true it
/// never reverts. Constructed once per page and injected into loaders and
/// the dispatcher.
#[derive(Default)]
pub struct ModuleRegistry {
    modules: Mutex<BTreeMap<String, ModuleEntry>>,
}

impl ModuleRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a loadable id. A `loaded` flag set by an earlier
    /// registration of the same id survives re-registration.
    pub fn register(&self, id: &str, preload: PreloadFn) {
        let id = id.to_lowercase();
        let mut modules = self.modules.lock().unwrap();
        let loaded = modules.get(&id).map(|entry| entry.loaded).unwrap_or(false);
        modules.insert(id, ModuleEntry { preload, loaded });
    }

    pub fn contains(&self, id: &str) -> bool {
        self.modules.lock().unwrap().contains_key(&id.to_lowercase())
    }

    pub fn is_loaded(&self, id: &str) -> bool {
        self.modules
            .lock()
            .unwrap()
            .get(&id.to_lowercase())
            .map(|entry| entry.loaded)
            .unwrap_or(false)
    }

    /// Mark an id as loaded. Unknown ids are ignored.
    pub fn mark_loaded(&self, id: &str) {
        if let Some(entry) = self.modules.lock().unwrap().get_mut(&id.to_lowercase()) {
            entry.loaded = true;
        }
    }

    /// Probe for the first entry (id order) matching by bidirectional
    /// substring. A matched-but-unloaded entry gets its preload fired, so a
    /// caller seeing anything but `NoMatch` must not start its own fetch.
    pub fn check(&self, probe: &str) -> MatchOutcome {
        let probe = probe.to_lowercase();
        let preload = {
            let modules = self.modules.lock().unwrap();
            let mut hit = None;
            for (id, entry) in modules.iter() {
                if probe.contains(id.as_str()) || id.contains(&probe) {
                    if entry.loaded {
                        return MatchOutcome::AlreadyLoaded;
                    }
                    hit = Some(entry.preload.clone());
                    break;
                }
            }
            hit
        };
        match preload {
            Some(preload) => {
                // Fired outside the lock: the trigger may re-enter the
                // registry synchronously.
                preload();
                MatchOutcome::Preloading
            }
            None => MatchOutcome::NoMatch,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn noop() -> PreloadFn {
        Arc::new(|| {})
    }

    #[test]
    fn test_loaded_survives_reregistration() {
        let registry = ModuleRegistry::new();
        registry.register("Home", noop());
        registry.mark_loaded("home");
        registry.register("home", noop());
        assert!(registry.is_loaded("HOME"));
    }

    #[test]
    fn test_check_fires_preload_once_matched() {
        let registry = ModuleRegistry::new();
        let fired = Arc::new(AtomicUsize::new(0));
        let counter = fired.clone();
        registry.register(
            "about",
            Arc::new(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(registry.check("/chunks/about_9f8e.js"), MatchOutcome::Preloading);
        assert_eq!(fired.load(Ordering::SeqCst), 1);

        registry.mark_loaded("about");
        assert_eq!(registry.check("/chunks/about_9f8e.js"), MatchOutcome::AlreadyLoaded);
        assert_eq!(fired.load(Ordering::SeqCst), 1, "loaded entries never re-preload");
    }

    #[test]
    fn test_check_matches_both_directions() {
        let registry = ModuleRegistry::new();
        registry.register("pages/home", noop());
        registry.mark_loaded("pages/home");
        // Probe contains the id
        assert_eq!(registry.check("/assets/pages/home_1a2b.js"), MatchOutcome::AlreadyLoaded);
        // Id contains the probe
        assert_eq!(registry.check("home"), MatchOutcome::AlreadyLoaded);
        assert_eq!(registry.check("/vendor.js"), MatchOutcome::NoMatch);
    }
}
