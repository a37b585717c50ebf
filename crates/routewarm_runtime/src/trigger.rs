//! One-shot preload trigger: observes a host element and dispatches a route
//! flag's assets the first time the element is sighted.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use crate::dispatch::AssetDispatcher;
use crate::observe::{ElementId, ObservationRegistry, ObserveOptions, Unobserve};
use crate::store::{ManifestFetch, ManifestRequest, ManifestStore};

/// When the trigger fires. Only viewport entry today.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TriggerAction {
    #[default]
    InView,
}

/// Page-lifetime collaborators shared by every trigger.
#[derive(Clone)]
pub struct PreloadContext {
    pub observations: ObservationRegistry,
    pub store: Arc<ManifestStore>,
    pub fetch: Arc<dyn ManifestFetch>,
    pub request: ManifestRequest,
    pub dispatcher: Arc<AssetDispatcher>,
}

struct TriggerInner {
    flag: String,
    context: PreloadContext,
    fired: AtomicBool,
    guard: Mutex<Option<Unobserve>>,
}

impl TriggerInner {
    fn on_visible(self: Arc<Self>) {
        if self.fired.swap(true, Ordering::SeqCst) {
            return;
        }
        // One-shot: stop observing before the assets are even resolved
        if let Some(guard) = self.guard.lock().unwrap().take() {
            guard.unobserve();
        }

        tokio::spawn(async move {
            let context = &self.context;
            match context
                .store
                .preload_files_for_flag(&self.flag, &context.request, context.fetch.as_ref())
                .await
            {
                Ok(files) => context.dispatcher.dispatch(&files),
                Err(err) => {
                    tracing::warn!(flag = %self.flag, %err, "manifest unavailable, assets not preloaded");
                }
            }
        });
    }
}

/// UI wrapper around a route flag. Mounting registers with the observation
/// registry; the first visibility signal resolves the manifest entry for
/// the flag and hands it to the asset dispatcher.
///
/// On a platform with no viewport facility the trigger mounts fine and
/// stays dormant forever.
pub struct PreloadTrigger {
    inner: Arc<TriggerInner>,
}

impl PreloadTrigger {
    pub fn mount(
        context: &PreloadContext,
        flag: impl Into<String>,
        action: TriggerAction,
        element: ElementId,
        options: &ObserveOptions,
    ) -> Self {
        let inner = Arc::new(TriggerInner {
            flag: flag.into(),
            context: context.clone(),
            fired: AtomicBool::new(false),
            guard: Mutex::new(None),
        });

        match action {
            TriggerAction::InView => {
                let callback = {
                    let inner = inner.clone();
                    move || inner.clone().on_visible()
                };
                let guard = context.observations.observe(element, callback, options);
                *inner.guard.lock().unwrap() = Some(guard);
                // The signal may have arrived while the guard slot was
                // still empty; finish the teardown it skipped
                if inner.fired.load(Ordering::SeqCst) {
                    if let Some(guard) = inner.guard.lock().unwrap().take() {
                        guard.unobserve();
                    }
                }
            }
        }

        Self { inner }
    }

    pub fn has_fired(&self) -> bool {
        self.inner.fired.load(Ordering::SeqCst)
    }

    /// Tear down observation without waiting for a sighting.
    pub fn unmount(&self) {
        if let Some(guard) = self.inner.guard.lock().unwrap().take() {
            guard.unobserve();
        }
    }
}
