//! Build-time half of the route prewarming pipeline.
//!
//! Statically maps each route in an application's route table to the asset
//! files its lazily-loaded view will pull in, by matching route import
//! specifiers against the bundler's post-compilation chunk graph. The result
//! is a manifest consumed at runtime by `routewarm_runtime`.

pub mod assets;
pub mod builder;
pub mod chunks;
pub mod error;
pub mod manifest;
pub mod routes;

pub use assets::{AssetKind, AssetRef};
pub use builder::ManifestBuilder;
pub use chunks::{Chunk, ChunkGraph};
pub use error::BuildError;
pub use manifest::{Manifest, RemoteModuleMap, ENTRY_KEY, MANIFEST_FILENAME};
pub use routes::RouteEntry;
