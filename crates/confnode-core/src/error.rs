//! Error types for confnode-core

use std::path::{Path, PathBuf};

/// Result type for confnode-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause raised by a domain constructor
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Coarse classification of [`Error`] values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing file, missing `configs` root, malformed JSON, unresolved link
    Configuration,
    /// Tag envelope, field type, missing or unexpected field
    SchemaValidation,
    /// A dotted type name could not be found in the registry
    TypeResolution,
    /// A domain constructor failed
    TypeConstruction,
    /// Link cycle or link nesting beyond the configured depth
    Recursion,
    /// Writing the snapshot failed
    Io,
}

/// Errors that can occur while reading, writing or instantiating configs
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The file passed to the reader does not exist
    #[error("Config file {path} does not exist")]
    FileNotFound { path: PathBuf },

    /// Filesystem error while locating or reading configuration files
    #[error(transparent)]
    Fs(#[from] confnode_fs::Error),

    /// A configuration file is not valid JSON
    #[error("Invalid JSON in {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A config link names a file that does not exist
    #[error("Linked file {path} does not exist (link '{link}')")]
    LinkTargetNotFound { link: String, path: PathBuf },

    /// A node envelope or its fields do not match the expected shape
    #[error("Schema validation failed at {}: {message}", location(.file, .path))]
    SchemaValidation {
        file: Option<PathBuf>,
        path: String,
        message: String,
    },

    /// The factory was handed a config that does not name a target type
    #[error("Config '{config_class}' is tagged {tag}, only object configs can be instantiated")]
    NotAnObjectConfig { config_class: String, tag: String },

    /// A dotted type name could not be resolved
    #[error("Could not resolve type '{name}': {reason}")]
    TypeResolution { name: String, reason: String },

    /// A target type has no type-level method with the given name
    #[error("Type '{name}' has no method '{method}'")]
    UnknownMethod { name: String, method: String },

    /// A domain constructor or type-level method failed
    #[error("Could not construct '{name}': {source}")]
    TypeConstruction {
        name: String,
        #[source]
        source: BoxError,
    },

    /// A config link leads back to a file that is still being read
    #[error("Config link cycle detected: {}", .chain.join(" -> "))]
    LinkCycle { chain: Vec<String> },

    /// Config links are nested deeper than the reader allows
    #[error("Config links nested deeper than {depth} levels (at link '{link}')")]
    RecursionLimit { depth: usize, link: String },

    /// Writing the snapshot failed
    #[error("Could not write config snapshot to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: confnode_fs::Error,
    },

    /// Rendering the snapshot as JSON failed
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

fn location(file: &Option<PathBuf>, path: &str) -> String {
    match (file, path.is_empty()) {
        (Some(file), true) => file.display().to_string(),
        (Some(file), false) => format!("{}: {}", file.display(), path),
        (None, true) => "<root>".to_string(),
        (None, false) => path.to_string(),
    }
}

impl Error {
    /// A schema error at the current position; callers prefix the field path
    /// as the error travels outward.
    pub fn schema(message: impl Into<String>) -> Self {
        Self::SchemaValidation {
            file: None,
            path: String::new(),
            message: message.into(),
        }
    }

    pub fn type_resolution(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::TypeResolution {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn type_construction(name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::TypeConstruction {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::FileNotFound { .. }
            | Self::Fs(_)
            | Self::Parse { .. }
            | Self::LinkTargetNotFound { .. } => ErrorKind::Configuration,
            Self::SchemaValidation { .. } | Self::NotAnObjectConfig { .. } => {
                ErrorKind::SchemaValidation
            }
            Self::TypeResolution { .. } | Self::UnknownMethod { .. } => ErrorKind::TypeResolution,
            Self::TypeConstruction { .. } => ErrorKind::TypeConstruction,
            Self::LinkCycle { .. } | Self::RecursionLimit { .. } => ErrorKind::Recursion,
            Self::Write { .. } | Self::Json(_) => ErrorKind::Io,
        }
    }

    /// Prefix the field path of a schema error with a field name.
    ///
    /// Errors that already belong to another file (raised while reading a
    /// linked file) keep the path they were reported with.
    pub fn at_field(self, field: &str) -> Self {
        self.prefix_path(field)
    }

    /// Prefix the field path of a schema error with a list index.
    pub fn at_index(self, index: usize) -> Self {
        self.prefix_path(&format!("[{index}]"))
    }

    /// Attribute a schema error to the file it was raised in, unless it
    /// already names one.
    pub fn in_file(self, source_file: &Path) -> Self {
        match self {
            Self::SchemaValidation {
                file: None,
                path,
                message,
            } => Self::SchemaValidation {
                file: Some(source_file.to_path_buf()),
                path,
                message,
            },
            other => other,
        }
    }

    fn prefix_path(self, segment: &str) -> Self {
        match self {
            Self::SchemaValidation {
                file: None,
                path,
                message,
            } => {
                let path = if path.is_empty() {
                    segment.to_string()
                } else if path.starts_with('[') {
                    format!("{segment}{path}")
                } else {
                    format!("{segment}.{path}")
                };
                Self::SchemaValidation {
                    file: None,
                    path,
                    message,
                }
            }
            other => other,
        }
    }
}
