//! Configuration root discovery and config link mapping
//!
//! Every configuration file lives somewhere below a directory literally named
//! `configs`. That directory is the anchor for config links: the link
//! `tools.alpha` names the file `configs/tools/alpha.json`.

use crate::{ConfigPath, Error, NormalizedPath, Result};

/// The directory all config links of one read are resolved against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigRoot {
    dir: NormalizedPath,
    extension: String,
}

impl ConfigRoot {
    /// Use `dir` as the root directly, with the default link extension.
    pub fn new(dir: impl Into<NormalizedPath>) -> Self {
        Self {
            dir: dir.into(),
            extension: ConfigPath::LinkExtension.as_str().to_string(),
        }
    }

    /// Override the extension appended to the last link segment.
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Walk upward from `file` until a directory named `root_dir_name` is found.
    ///
    /// The walk follows the parents of `file` as written, so a `configs`
    /// symlink still counts as the root. Only the discovered directory is
    /// canonicalized. Reaching the top of the filesystem is an error.
    pub fn discover(file: &NormalizedPath, root_dir_name: &str) -> Result<Self> {
        if !file.exists() {
            let source =
                std::io::Error::new(std::io::ErrorKind::NotFound, "config file does not exist");
            return Err(Error::io(file.to_native(), source));
        }

        let mut current = file.absolute()?.parent();

        while let Some(candidate) = current {
            if candidate.file_name() == Some(root_dir_name) && candidate.is_dir() {
                let dir = candidate.canonicalize()?;
                tracing::debug!(root = %dir, file = %file, "Found config root");
                return Ok(Self::new(dir));
            }
            current = candidate.parent();
        }

        Err(Error::ConfigRootNotFound {
            path: file.to_native(),
            root_dir_name: root_dir_name.to_string(),
        })
    }

    /// The root directory.
    pub fn dir(&self) -> &NormalizedPath {
        &self.dir
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Map a dotted link onto the file it names below this root.
    ///
    /// Every segment but the last is a subdirectory, the last is the file stem.
    /// Segments must be non-empty and may not contain path separators or
    /// navigate upward, so a link can never escape the root. Whether the file
    /// exists is left to the caller.
    pub fn link_path(&self, link: &str) -> Result<NormalizedPath> {
        if link.trim().is_empty() {
            return Err(Error::invalid_link(link, "link is empty"));
        }

        let segments: Vec<&str> = link.split('.').collect();
        for segment in &segments {
            if segment.is_empty() {
                return Err(Error::invalid_link(link, "link contains an empty segment"));
            }
            if segment.contains('/') || segment.contains('\\') {
                return Err(Error::invalid_link(
                    link,
                    format!("segment '{segment}' contains a path separator"),
                ));
            }
        }

        let (stem, dirs) = segments
            .split_last()
            .ok_or_else(|| Error::invalid_link(link, "link is empty"))?;

        let mut path = self.dir.clone();
        for dir in dirs {
            path = path.join(dir);
        }
        Ok(path.join(&format!("{stem}.{}", self.extension)))
    }
}
