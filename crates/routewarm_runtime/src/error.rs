/// Failure surfaced by a dynamic loader.
///
/// Cloneable so every consumer of a shared in-flight load observes the same
/// error value.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("module load failed: {message}")]
pub struct LoadError {
    pub message: String,
}

impl LoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Failure fetching the manifest at runtime.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("manifest request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("manifest unavailable: {0}")]
    Unavailable(String),
}
