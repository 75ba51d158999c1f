//! Error types for confnode-fs

use std::path::PathBuf;

/// Result type for confnode-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in confnode-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Could not find config root for file {path}. The config file must be placed in a \
         folder named '{root_dir_name}' or in a subfolder of it"
    )]
    ConfigRootNotFound { path: PathBuf, root_dir_name: String },

    #[error("Invalid config link '{link}': {reason}")]
    InvalidLink { link: String, reason: String },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn invalid_link(link: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidLink {
            link: link.into(),
            reason: reason.into(),
        }
    }
}
