//! Well-known names of the configuration filesystem layout.

use std::path::Path;

/// Fixed names used by the configuration layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPath {
    /// The `configs` directory anchoring link resolution
    RootDir,
    /// The extension appended to the last segment of a config link
    LinkExtension,
    /// The single file produced when a resolved graph is written out
    Snapshot,
}

impl ConfigPath {
    /// Get the string representation of the name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RootDir => "configs",
            Self::LinkExtension => "json",
            Self::Snapshot => "config.json",
        }
    }
}

impl AsRef<Path> for ConfigPath {
    fn as_ref(&self) -> &Path {
        Path::new(self.as_str())
    }
}

impl AsRef<str> for ConfigPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::fmt::Display for ConfigPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
