//! Pools viewport-visibility observation so call sites sharing a
//! `(root, margin)` configuration reuse one underlying host observer.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};

/// Opaque handle to a host UI element.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ElementId(pub u64);

/// Observation configuration. Contexts are pooled per distinct value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ObserveOptions {
    pub root: Option<ElementId>,
    pub margin: String,
}

/// One visibility report from the host facility.
#[derive(Clone, Copy, Debug)]
pub struct VisibilitySignal {
    pub target: ElementId,
    pub intersecting: bool,
    pub ratio: f64,
}

impl VisibilitySignal {
    fn visible(&self) -> bool {
        self.intersecting || self.ratio > 0.0
    }
}

/// Host-side observation for one `(root, margin)` pair.
pub trait HostObservation: Send + Sync {
    fn observe(&self, element: ElementId);
    fn unobserve(&self, element: ElementId);
    fn disconnect(&self);
}

/// Platform facility producing observation handles.
///
/// Returning `None` means the platform has no viewport-visibility support;
/// observation then degrades to a no-op and observed elements never report
/// visible.
pub trait ViewportHost: Send + Sync {
    fn create(&self, root: Option<ElementId>, margin: &str) -> Option<Box<dyn HostObservation>>;
}

/// Host for platforms without a visibility facility.
pub struct NoViewport;

impl ViewportHost for NoViewport {
    fn create(&self, _root: Option<ElementId>, _margin: &str) -> Option<Box<dyn HostObservation>> {
        None
    }
}

type VisibleCallback = Arc<dyn Fn() + Send + Sync>;

// Contexts are looked up by structural equality of the two configuration
// fields, never by descriptor identity.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ContextKey {
    root: Option<ElementId>,
    margin: String,
}

impl ContextKey {
    fn of(options: &ObserveOptions) -> Self {
        Self {
            root: options.root,
            margin: options.margin.clone(),
        }
    }
}

struct Context {
    handle: Box<dyn HostObservation>,
    elements: HashMap<ElementId, VisibleCallback>,
}

struct RegistryInner {
    host: Box<dyn ViewportHost>,
    contexts: Mutex<HashMap<ContextKey, Context>>,
}

impl RegistryInner {
    fn remove(&self, key: &ContextKey, element: ElementId) {
        let mut contexts = self.contexts.lock().unwrap();
        let Some(context) = contexts.get_mut(key) else {
            return;
        };
        if context.elements.remove(&element).is_some() {
            context.handle.unobserve(element);
        }
        // Contexts are not retained speculatively
        if context.elements.is_empty() {
            if let Some(context) = contexts.remove(key) {
                context.handle.disconnect();
            }
        }
    }
}

/// Multiplexes many observed elements onto one host observer per distinct
/// `(root, margin)` pair. A context lives exactly as long as it has
/// elements; the last unobserve disconnects and removes it.
///
/// Cloning the registry clones a handle to the same pool.
#[derive(Clone)]
pub struct ObservationRegistry {
    inner: Arc<RegistryInner>,
}

impl ObservationRegistry {
    pub fn new(host: impl ViewportHost + 'static) -> Self {
        Self {
            inner: Arc::new(RegistryInner {
                host: Box::new(host),
                contexts: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Register `element -> callback` under the options' context, creating
    /// the context on first use. The callback fires on every visibility
    /// entry of the element, never on exit.
    ///
    /// Returns an [`Unobserve`] guard; dropping it without calling
    /// [`Unobserve::unobserve`] leaks the registration for the page's
    /// lifetime, matching the one-shot use cases this serves.
    pub fn observe(
        &self,
        element: ElementId,
        callback: impl Fn() + Send + Sync + 'static,
        options: &ObserveOptions,
    ) -> Unobserve {
        let key = ContextKey::of(options);
        let mut contexts = self.inner.contexts.lock().unwrap();

        if !contexts.contains_key(&key) {
            let Some(handle) = self.inner.host.create(key.root, &key.margin) else {
                tracing::debug!("viewport observation unavailable, observe is a no-op");
                return Unobserve::inert(element);
            };
            contexts.insert(
                key.clone(),
                Context {
                    handle,
                    elements: HashMap::new(),
                },
            );
        }

        let context = contexts
            .get_mut(&key)
            .expect("context was just ensured above");
        context.elements.insert(element, Arc::new(callback));
        context.handle.observe(element);

        Unobserve {
            registry: Arc::downgrade(&self.inner),
            key: Some(key),
            element,
        }
    }

    /// Deliver a host signal batch for one context. Callbacks run outside
    /// the registry lock, so they may observe or unobserve reentrantly.
    pub fn deliver(&self, options: &ObserveOptions, signals: &[VisibilitySignal]) {
        let key = ContextKey::of(options);
        let mut fired: Vec<VisibleCallback> = Vec::new();
        {
            let contexts = self.inner.contexts.lock().unwrap();
            let Some(context) = contexts.get(&key) else {
                return;
            };
            for signal in signals {
                if !signal.visible() {
                    continue;
                }
                if let Some(callback) = context.elements.get(&signal.target) {
                    fired.push(callback.clone());
                }
            }
        }
        for callback in fired {
            callback();
        }
    }

    /// Number of live observation contexts.
    pub fn active_contexts(&self) -> usize {
        self.inner.contexts.lock().unwrap().len()
    }
}

/// Guard returned by [`ObservationRegistry::observe`].
pub struct Unobserve {
    registry: Weak<RegistryInner>,
    key: Option<ContextKey>,
    element: ElementId,
}

impl Unobserve {
    fn inert(element: ElementId) -> Self {
        Self {
            registry: Weak::new(),
            key: None,
            element,
        }
    }

    /// Remove the element's registration, tearing the context down if this
    /// was its last element.
    pub fn unobserve(self) {
        if let (Some(registry), Some(key)) = (self.registry.upgrade(), self.key) {
            registry.remove(&key, self.element);
        }
    }
}
