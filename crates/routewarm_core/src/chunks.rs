use serde::Deserialize;

use crate::error::BuildError;

/// One chunk from the bundler's post-compilation stats.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    /// Marked on the chunk that carries the application's initial entry.
    #[serde(default)]
    pub is_entry: bool,
    /// Files the bundler emitted for this chunk, in emission order.
    #[serde(default)]
    pub emitted_files: Vec<String>,
    /// The import request that caused this chunk to exist.
    #[serde(default)]
    pub origin_request: String,
}

/// The bundler's chunk graph, in source order.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct ChunkGraph {
    pub chunks: Vec<Chunk>,
}

impl ChunkGraph {
    pub fn from_stats_json(source: &str) -> Result<Self, BuildError> {
        Ok(serde_json::from_str(source)?)
    }

    /// The chunk marked as the application's initial entry.
    pub fn entry_chunk(&self) -> Option<&Chunk> {
        self.chunks.iter().find(|chunk| chunk.is_entry)
    }

    /// First non-entry chunk whose origin request corresponds to the route's
    /// import specifier. Graph source order breaks ties.
    pub fn match_route(&self, import_specifier: &str) -> Option<&Chunk> {
        let wanted = normalize_request(import_specifier);
        self.chunks.iter().find(|chunk| {
            !chunk.is_entry
                && !chunk.origin_request.is_empty()
                && requests_match(&wanted, &normalize_request(&chunk.origin_request))
        })
    }
}

// Strip relative prefixes and the file extension so `../pages/Home` and
// `./src/pages/Home.tsx` compare equal on their trailing segments.
fn normalize_request(request: &str) -> String {
    let mut rest = request;
    loop {
        if let Some(stripped) = rest.strip_prefix("./") {
            rest = stripped;
        } else if let Some(stripped) = rest.strip_prefix("../") {
            rest = stripped;
        } else {
            break;
        }
    }
    match rest.rfind('/') {
        Some(slash) => match rest[slash..].rfind('.') {
            Some(dot) => rest[..slash + dot].to_string(),
            None => rest.to_string(),
        },
        None => match rest.rfind('.') {
            Some(dot) => rest[..dot].to_string(),
            None => rest.to_string(),
        },
    }
}

// Suffix match on a path-segment boundary, in either direction.
fn requests_match(a: &str, b: &str) -> bool {
    suffix_of(a, b) || suffix_of(b, a)
}

fn suffix_of(suffix: &str, path: &str) -> bool {
    if !path.ends_with(suffix) {
        return false;
    }
    let start = path.len() - suffix.len();
    start == 0 || path.as_bytes()[start - 1] == b'/'
}
