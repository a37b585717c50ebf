use std::path::PathBuf;

/// Failures of the build-time half. Route-table problems are fatal; there is
/// no partial-manifest fallback.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("failed to read route table {path}: {err}")]
    RouteTable {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("failed to read entry bundle {path}: {err}")]
    EntryBundle {
        path: PathBuf,
        #[source]
        err: std::io::Error,
    },

    #[error("invalid json: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
