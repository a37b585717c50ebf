//! Runtime half of the route prewarming pipeline.
//!
//! Decides when to start fetching a route's assets (viewport-visibility
//! triggers pooled per observation configuration) and how to hand off to the
//! actual module loader without loading anything twice. Host platform
//! facilities (viewport observation, element insertion, remote-module
//! containers, manifest fetching) are trait seams, so the coordinator runs
//! anywhere and tests inject scripted hosts.

pub mod dispatch;
pub mod error;
pub mod loader;
pub mod observe;
pub mod registry;
pub mod store;
pub mod trigger;

pub use dispatch::{AssetDispatcher, AssetSink, RemoteContainers};
pub use error::{FetchError, LoadError};
pub use loader::{Loadable, ReadySignal, TryReady};
pub use observe::{
    ElementId, HostObservation, NoViewport, ObservationRegistry, ObserveOptions, Unobserve,
    ViewportHost, VisibilitySignal,
};
pub use registry::{MatchOutcome, ModuleRegistry};
pub use store::{HttpManifestFetch, ManifestFetch, ManifestRequest, ManifestStore};
pub use trigger::{PreloadContext, PreloadTrigger, TriggerAction};
