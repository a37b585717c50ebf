//! Process-wide manifest state and the runtime fetch contract.

use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use futures::FutureExt;
use routewarm_core::{AssetRef, Manifest, MANIFEST_FILENAME};

use crate::error::FetchError;

/// Where the standalone manifest file lives.
#[derive(Clone, Debug)]
pub struct ManifestRequest {
    pub public_path: String,
    pub filename: String,
}

impl ManifestRequest {
    pub fn new(public_path: impl Into<String>) -> Self {
        Self {
            public_path: public_path.into(),
            filename: MANIFEST_FILENAME.to_string(),
        }
    }

    pub fn filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = filename.into();
        self
    }

    pub fn url(&self) -> String {
        if self.public_path.ends_with('/') {
            format!("{}{}", self.public_path, self.filename)
        } else {
            format!("{}/{}", self.public_path, self.filename)
        }
    }
}

/// Transport used to retrieve the standalone manifest file.
pub trait ManifestFetch: Send + Sync {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Manifest, FetchError>>;
}

/// HTTP transport for hosts fetching over the network.
#[derive(Clone, Default)]
pub struct HttpManifestFetch {
    client: reqwest::Client,
}

impl HttpManifestFetch {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ManifestFetch for HttpManifestFetch {
    fn fetch(&self, url: &str) -> BoxFuture<'static, Result<Manifest, FetchError>> {
        let request = self.client.get(url);
        async move {
            let response = request.send().await?.error_for_status()?;
            Ok(response.json::<Manifest>().await?)
        }
        .boxed()
    }
}

/// Process-wide manifest cache, constructed once per page and injected.
///
/// The manifest is immutable after first install: a build-time-inlined
/// manifest wins over any later fetch, and `init_all_preload_files` is
/// idempotent.
#[derive(Default)]
pub struct ManifestStore {
    manifest: Mutex<Option<Arc<Manifest>>>,
}

impl ManifestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a manifest the build inlined into the entry bundle. Ignored
    /// when a manifest is already present.
    pub fn set_inline(&self, manifest: Manifest) {
        let mut slot = self.manifest.lock().unwrap();
        if slot.is_none() {
            *slot = Some(Arc::new(manifest));
        } else {
            tracing::debug!("manifest already installed, inline copy ignored");
        }
    }

    pub fn get(&self) -> Option<Arc<Manifest>> {
        self.manifest.lock().unwrap().clone()
    }

    /// The flag's asset list, empty when the flag is absent or no manifest
    /// has been installed yet.
    pub fn files_for(&self, flag: &str) -> Vec<AssetRef> {
        self.get()
            .and_then(|manifest| manifest.files_for(flag).map(<[AssetRef]>::to_vec))
            .unwrap_or_default()
    }

    /// Ensure the manifest is present, fetching it at most once per store.
    pub async fn init_all_preload_files(
        &self,
        request: &ManifestRequest,
        fetch: &dyn ManifestFetch,
    ) -> Result<Arc<Manifest>, FetchError> {
        if let Some(manifest) = self.get() {
            return Ok(manifest);
        }
        let url = request.url();
        tracing::debug!(%url, "fetching route manifest");
        let fetched = Arc::new(fetch.fetch(&url).await?);
        let mut slot = self.manifest.lock().unwrap();
        // A concurrent init may have won while we awaited; first in wins
        Ok(slot.get_or_insert_with(|| fetched).clone())
    }

    /// Resolve the asset list for a route flag, fetching the manifest first
    /// if needed. An empty flag resolves to nothing without fetching.
    pub async fn preload_files_for_flag(
        &self,
        flag: &str,
        request: &ManifestRequest,
        fetch: &dyn ManifestFetch,
    ) -> Result<Vec<AssetRef>, FetchError> {
        if flag.is_empty() {
            return Ok(Vec::new());
        }
        if self.get().is_none() {
            self.init_all_preload_files(request, fetch).await?;
        }
        Ok(self.files_for(flag))
    }
}
