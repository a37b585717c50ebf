//! Suspension-aware dynamic loader. Wraps a user-supplied fetch operation
//! behind a memoizing tri-state machine and registers itself into the
//! module registry so the asset dispatcher can hand fetches off to it.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};

use crate::error::LoadError;
use crate::registry::ModuleRegistry;

/// Identifiers that would alias the loader to the application shell itself;
/// instances declared with one stay out of the registry.
pub const RESERVED_IDS: &[&str] = &["/", "./"];

/// The user-supplied fetch operation's future.
pub type FetchFuture<T> = BoxFuture<'static, Result<Arc<T>, LoadError>>;

type SharedLoad<T> = Shared<FetchFuture<T>>;

// pending -> loading -> resolved, monotonic. `Resolved` carries the
// memoized module value; `Loading` holds the single in-flight fetch every
// concurrent consumer shares.
enum LoadState<T: Send + Sync + 'static> {
    Pending,
    Loading(SharedLoad<T>),
    Resolved(Arc<T>),
}

enum Started<T: Send + Sync + 'static> {
    Done(Arc<T>),
    InFlight(SharedLoad<T>),
}

/// Result of suspension-mode consumption.
pub enum TryReady<T: Send + Sync + 'static> {
    /// The module is memoized; consumption was synchronous.
    Ready(Arc<T>),
    /// The fetch settled with an error; it is reported to every consumer
    /// and never retried by this instance.
    Failed(LoadError),
    /// A fetch is in flight. Await the signal, then re-invoke.
    NotReady(ReadySignal<T>),
}

/// Awaited by the rendering layer before re-invoking
/// [`Loadable::try_ready`]; settles exactly when the underlying fetch does.
pub struct ReadySignal<T: Send + Sync + 'static>(SharedLoad<T>);

impl<T: Send + Sync + 'static> ReadySignal<T> {
    pub async fn wait(self) {
        let _ = self.0.await;
    }
}

/// A lazily-loaded module with an explicitly declared identifier.
///
/// At most one fetch is ever issued per instance; concurrent consumers all
/// observe the same eventual resolution. On success the registry entry is
/// marked loaded; on failure it stays unloaded and the error propagates.
pub struct Loadable<T: Send + Sync + 'static> {
    id: String,
    state: Mutex<LoadState<T>>,
    fetch: Box<dyn Fn() -> FetchFuture<T> + Send + Sync>,
    registry: Arc<ModuleRegistry>,
}

impl<T: Send + Sync + 'static> Loadable<T> {
    /// Create a loadable and register it under its lower-cased id.
    ///
    /// An empty or reserved id skips registration; such an instance cannot
    /// be preloaded externally, only loaded via direct consumption.
    pub fn new<F>(id: impl Into<String>, registry: Arc<ModuleRegistry>, fetch: F) -> Arc<Self>
    where
        F: Fn() -> FetchFuture<T> + Send + Sync + 'static,
    {
        let id = id.into().to_lowercase();
        let loadable = Arc::new(Self {
            id: id.clone(),
            state: Mutex::new(LoadState::Pending),
            fetch: Box::new(fetch),
            registry: registry.clone(),
        });

        if !id.is_empty() && !RESERVED_IDS.contains(&id.as_str()) {
            let weak = Arc::downgrade(&loadable);
            registry.register(
                &id,
                Arc::new(move || {
                    if let Some(loadable) = weak.upgrade() {
                        loadable.preload();
                    }
                }),
            );
        } else {
            tracing::debug!(id = %id, "loadable not registered");
        }

        loadable
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_resolved(&self) -> bool {
        matches!(&*self.state.lock().unwrap(), LoadState::Resolved(_))
    }

    // Transition pending -> loading. Never issues a second fetch.
    fn started(&self) -> Started<T> {
        let mut state = self.state.lock().unwrap();
        match &*state {
            LoadState::Resolved(value) => return Started::Done(value.clone()),
            LoadState::Loading(shared) => return Started::InFlight(shared.clone()),
            LoadState::Pending => {}
        }

        let id = self.id.clone();
        let registry = self.registry.clone();
        let fetch = (self.fetch)();
        let shared = async move {
            match fetch.await {
                Ok(value) => {
                    registry.mark_loaded(&id);
                    Ok(value)
                }
                Err(err) => {
                    tracing::warn!(id = %id, %err, "module fetch failed");
                    Err(err)
                }
            }
        }
        .boxed()
        .shared();

        *state = LoadState::Loading(shared.clone());
        Started::InFlight(shared)
    }

    // Promote loading -> resolved once the shared result is known. The
    // machine never regresses.
    fn promote(&self, value: &Arc<T>) {
        let mut state = self.state.lock().unwrap();
        if matches!(&*state, LoadState::Loading(_)) {
            *state = LoadState::Resolved(value.clone());
        }
    }

    /// Await-mode consumption. The first call issues the fetch, concurrent
    /// calls share it, and calls after resolution return the memoized value
    /// without touching the future again.
    pub async fn load(&self) -> Result<Arc<T>, LoadError> {
        match self.started() {
            Started::Done(value) => Ok(value),
            Started::InFlight(shared) => {
                let result = shared.await;
                if let Ok(value) = &result {
                    self.promote(value);
                }
                result
            }
        }
    }

    /// Suspension-mode consumption: synchronous once settled, otherwise a
    /// signal the caller awaits before re-invoking.
    pub fn try_ready(&self) -> TryReady<T> {
        let shared = match self.started() {
            Started::Done(value) => return TryReady::Ready(value),
            Started::InFlight(shared) => shared,
        };
        match shared.peek() {
            Some(Ok(value)) => {
                let value = value.clone();
                self.promote(&value);
                return TryReady::Ready(value);
            }
            Some(Err(err)) => return TryReady::Failed(err.clone()),
            None => {}
        }
        TryReady::NotReady(ReadySignal(shared))
    }

    /// Start the load without consuming the value. Fire-and-forget; must be
    /// called within a tokio runtime.
    pub fn preload(self: Arc<Self>) {
        let shared = match self.started() {
            Started::Done(_) => return,
            Started::InFlight(shared) => shared,
        };
        match shared.peek() {
            Some(Ok(value)) => {
                let value = value.clone();
                self.promote(&value);
                return;
            }
            Some(Err(_)) => return,
            None => {}
        }
        tokio::spawn(async move {
            if let Ok(value) = shared.await {
                self.promote(&value);
            }
        });
    }
}
