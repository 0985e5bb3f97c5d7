use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A caller-supplied option cannot be honoured.
    #[error("configuration error: {0}")]
    Config(String),

    /// A key (leaf identifier, country, tree index) did not resolve.
    #[error("lookup error: {0}")]
    Lookup(String),

    #[error("failed to parse tree: {message}")]
    TreeParse { message: String },

    #[error("malformed metadata (line {line}): {message}")]
    Metadata { line: usize, message: String },

    #[error("tree has no terminal nodes")]
    EmptyTree,

    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to access {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub(crate) fn lookup(message: impl Into<String>) -> Self {
        Self::Lookup(message.into())
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
