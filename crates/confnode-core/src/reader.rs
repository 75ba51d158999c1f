//! Reading configuration files into resolved object graphs
//!
//! A read starts at one file below a `configs` directory, parses it into the
//! raw value tree, then lowers the tree depth-first: nested nodes become
//! records, config links load their target file as a fresh root in the same
//! configuration root, and lists and maps are lowered element-wise.
//!
//! ```ignore
//! use confnode_core::{ConfigReader, TypeRegistry};
//!
//! let reader = ConfigReader::new(&registry);
//! let config = reader.read("configs/root.json")?;
//! println!("{}", config.config_class());
//! ```

use crate::model::{ConfigNode, ConfigRecord};
use crate::params::Params;
use crate::registry::TypeRegistry;
use crate::tag::{
    FIELD_CONFIG_LINK, FIELD_CONFIG_TYPE, KEY_CONFIG_CLASS, KEY_TARGET_CLASS, RESERVED_FIELDS,
};
use crate::value::{ConfigValue, RawNode, RawValue};
use crate::{Error, Result};
use confnode_fs::{ConfigPath, ConfigRoot, NormalizedPath};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::sync::Arc;

/// Options controlling how configuration files are located and linked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderOptions {
    /// Name of the directory that anchors config links
    pub root_dir_name: String,

    /// Extension appended to the last segment of a config link
    pub link_extension: String,

    /// How deeply config links may nest before the read is aborted
    pub max_link_depth: usize,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            root_dir_name: ConfigPath::RootDir.as_str().to_string(),
            link_extension: ConfigPath::LinkExtension.as_str().to_string(),
            max_link_depth: 64,
        }
    }
}

impl ReaderOptions {
    pub fn with_root_dir_name(mut self, name: impl Into<String>) -> Self {
        self.root_dir_name = name.into();
        self
    }

    pub fn with_link_extension(mut self, extension: impl Into<String>) -> Self {
        self.link_extension = extension.into();
        self
    }

    pub fn with_max_link_depth(mut self, depth: usize) -> Self {
        self.max_link_depth = depth;
        self
    }
}

/// Reads configuration files against a type registry.
#[derive(Debug, Clone)]
pub struct ConfigReader<'r> {
    registry: &'r TypeRegistry,
    options: ReaderOptions,
}

impl<'r> ConfigReader<'r> {
    pub fn new(registry: &'r TypeRegistry) -> Self {
        Self {
            registry,
            options: ReaderOptions::default(),
        }
    }

    pub fn with_options(mut self, options: ReaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }

    /// Read the file at `path` and everything it links to.
    ///
    /// # Errors
    ///
    /// - `Configuration` if the file is missing, lies outside a `configs`
    ///   directory, is not valid JSON, or links to a missing file
    /// - `SchemaValidation` if a node does not match its record shape
    /// - `TypeResolution` if a `config_class` is not registered
    /// - `Recursion` on link cycles or links nested too deeply
    pub fn read(&self, path: impl AsRef<Path>) -> Result<ConfigNode> {
        let file = NormalizedPath::new(path.as_ref());
        if !file.exists() {
            return Err(Error::FileNotFound {
                path: file.to_native(),
            });
        }

        let root = ConfigRoot::discover(&file, &self.options.root_dir_name)?
            .with_extension(&self.options.link_extension);
        let file = file.canonicalize()?;
        tracing::debug!(file = %file, root = %root.dir(), "Reading config");

        ReadSession::new(self, root).read_file(file, None)
    }

    /// Read the file at `path` and downcast the result to the record `T`.
    pub fn read_as<T: ConfigRecord>(&self, path: impl AsRef<Path>) -> Result<Arc<T>> {
        let node = self.read(path.as_ref())?;
        node.downcast::<T>().ok_or_else(|| {
            Error::schema(format!(
                "expected a {}, found '{}' ({})",
                std::any::type_name::<T>(),
                node.config_class(),
                node.record_type()
            ))
            .in_file(path.as_ref())
        })
    }

    /// Resolve an in-memory document whose links point into `root`.
    pub fn resolve_document(&self, document: Value, root: &ConfigRoot) -> Result<ConfigNode> {
        let raw = RawNode::from_envelope(document)?;
        ReadSession::new(self, root.clone()).lower_node(raw, None)
    }
}

/// State of one top-level read: the configuration root and the stack of
/// files currently open, innermost last.
struct ReadSession<'a, 'r> {
    reader: &'a ConfigReader<'r>,
    root: ConfigRoot,
    open_files: Vec<NormalizedPath>,
}

impl<'a, 'r> ReadSession<'a, 'r> {
    fn new(reader: &'a ConfigReader<'r>, root: ConfigRoot) -> Self {
        Self {
            reader,
            root,
            open_files: Vec::new(),
        }
    }

    fn read_file(&mut self, file: NormalizedPath, link: Option<&str>) -> Result<ConfigNode> {
        if self.open_files.contains(&file) {
            let mut chain: Vec<String> = self.open_files.iter().map(|p| p.to_string()).collect();
            chain.push(file.to_string());
            return Err(Error::LinkCycle { chain });
        }
        if let Some(link) = link {
            if self.open_files.len() > self.reader.options.max_link_depth {
                return Err(Error::RecursionLimit {
                    depth: self.reader.options.max_link_depth,
                    link: link.to_string(),
                });
            }
        }

        let native = file.to_native();
        let text = confnode_fs::io::read_text(&file)?;
        let document: Value = serde_json::from_str(&text).map_err(|source| Error::Parse {
            path: native.clone(),
            source,
        })?;
        let raw = RawNode::from_envelope(document).map_err(|e| e.in_file(&native))?;

        self.open_files.push(file);
        let node = self.lower_node(raw, link);
        self.open_files.pop();

        node.map_err(|e| e.in_file(&native))
    }

    fn lower_node(&mut self, raw: RawNode, link: Option<&str>) -> Result<ConfigNode> {
        let mut params = Params::new();

        for (name, value) in raw.params {
            if RESERVED_FIELDS.contains(&name.as_str()) {
                return Err(Error::schema("reserved field name").at_field(&name));
            }
            let value = self.lower_value(value).map_err(|e| e.at_field(&name))?;
            params.insert(name, value);
        }

        for (key, value) in raw.body {
            if key != KEY_TARGET_CLASS && RESERVED_FIELDS.contains(&key.as_str()) {
                return Err(Error::schema("reserved field name").at_field(&key));
            }
            if params.contains(&key) {
                return Err(Error::schema("field appears both in the node body and in params")
                    .at_field(&key));
            }
            params.insert(key, ConfigValue::from_data(value));
        }

        params.insert(
            FIELD_CONFIG_TYPE,
            ConfigValue::Scalar(Value::String(raw.tag.as_str().to_string())),
        );
        params.insert(
            KEY_CONFIG_CLASS,
            ConfigValue::Scalar(Value::String(raw.config_class.clone())),
        );
        if let Some(link) = link {
            params.insert(
                FIELD_CONFIG_LINK,
                ConfigValue::Scalar(Value::String(link.to_string())),
            );
        }

        let shape = self.reader.registry.resolve_config(&raw.config_class)?;
        shape.construct(params)
    }

    fn lower_value(&mut self, raw: RawValue) -> Result<ConfigValue> {
        match raw {
            RawValue::Scalar(value) => Ok(ConfigValue::Scalar(value)),
            RawValue::Node(node) => self.lower_node(node, None).map(ConfigValue::Node),
            RawValue::Link(link) => self.resolve_link(&link).map(ConfigValue::Node),
            RawValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| self.lower_value(item).map_err(|e| e.at_index(index)))
                .collect::<Result<Vec<_>>>()
                .map(ConfigValue::List),
            RawValue::Map(map) => map
                .into_iter()
                .map(|(key, item)| {
                    self.lower_value(item)
                        .map(|value| (key.clone(), value))
                        .map_err(|e| e.at_field(&key))
                })
                .collect::<Result<_>>()
                .map(ConfigValue::Map),
        }
    }

    fn resolve_link(&mut self, link: &str) -> Result<ConfigNode> {
        let path = self.root.link_path(link)?;
        if !path.is_file() {
            return Err(Error::LinkTargetNotFound {
                link: link.to_string(),
                path: path.to_native(),
            });
        }

        let file = path.canonicalize()?;
        tracing::debug!(link, file = %file, depth = self.open_files.len(), "Resolving config link");
        self.read_file(file, Some(link))
    }
}
