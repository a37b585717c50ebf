use serde::{Deserialize, Serialize};

/// Loading strategy a manifest entry asks for at runtime.
///
/// `RemoteModule` serializes as `"mf"`, the wire name for module-federation
/// entries; the other kinds serialize lowercase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetKind {
    Script,
    Style,
    Image,
    Font,
    #[serde(rename = "mf")]
    RemoteModule,
}

impl AssetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetKind::Script => "script",
            AssetKind::Style => "style",
            AssetKind::Image => "image",
            AssetKind::Font => "font",
            AssetKind::RemoteModule => "mf",
        }
    }

    /// Classify an emitted file by extension. Unrecognized extensions return
    /// `None` and the file is left out of the manifest.
    pub fn from_file(name: &str) -> Option<AssetKind> {
        let lower = name.to_lowercase();
        let ext = lower.rsplit('.').next()?;
        match ext {
            "js" => Some(AssetKind::Script),
            "css" => Some(AssetKind::Style),
            "svg" | "jpg" | "jpeg" | "png" | "webp" => Some(AssetKind::Image),
            "woff" | "woff2" | "otf" | "ttf" | "eot" => Some(AssetKind::Font),
            _ => None,
        }
    }
}

/// One typed static resource required by a route.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssetRef {
    #[serde(rename = "type")]
    pub kind: AssetKind,
    pub href: String,
}

impl AssetRef {
    pub fn new(kind: AssetKind, href: impl Into<String>) -> Self {
        Self {
            kind,
            href: href.into(),
        }
    }
}

/// Hrefs always begin with `/` unless already absolute.
pub fn normalize_href(file: &str) -> String {
    if file.starts_with('/') || file.starts_with("http") {
        file.to_string()
    } else {
        format!("/{file}")
    }
}
