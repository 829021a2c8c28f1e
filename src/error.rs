use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, PluginError>;

/// Failure kinds surfaced while inspecting or placing a plugin archive.
#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("not a readable zip archive: {path}: {source}")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    #[error("entry `{entry}` not found in {path}")]
    EntryNotFound { path: PathBuf, entry: String },

    #[error("malformed plugin.yml in {path}: {reason}")]
    MalformedManifest { path: PathBuf, reason: String },

    #[error("path escapes root {root}: {attempted}")]
    PathTraversal { root: PathBuf, attempted: String },

    #[error("I/O failure on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl PluginError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Short machine-friendly name of the failure kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Archive { .. } => "archive",
            Self::EntryNotFound { .. } => "entry-not-found",
            Self::MalformedManifest { .. } => "malformed-manifest",
            Self::PathTraversal { .. } => "path-traversal",
            Self::Io { .. } => "io",
        }
    }

    /// A traversal means bad configuration or hostile input; the whole run stops.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PathTraversal { .. })
    }
}
