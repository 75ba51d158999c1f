//! Writing resolved graphs back to a single self-contained snapshot
//!
//! The snapshot inlines every linked file and drops link provenance, so it
//! reads back into a graph equal to the original one without needing the
//! `configs` tree it came from.

use crate::model::ConfigNode;
use crate::tag::{KEY_CONFIG_CLASS, KEY_PARAMS, KEY_TARGET_CLASS};
use crate::value::ConfigValue;
use crate::{Error, Result};
use confnode_fs::{ConfigPath, NormalizedPath};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Serializes resolved graphs as canonical JSON snapshots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWriter {
    file_name: String,
    indent: usize,
}

impl Default for ConfigWriter {
    fn default() -> Self {
        Self {
            file_name: ConfigPath::Snapshot.as_str().to_string(),
            indent: 4,
        }
    }
}

impl ConfigWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Name of the snapshot file created in the output directory.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = file_name.into();
        self
    }

    /// Number of spaces per indentation level.
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// The canonical document for `config`.
    ///
    /// Every node becomes `{ tag: { config_class, params, [target_class] } }`.
    pub fn render(&self, config: &ConfigNode) -> Value {
        render_node(config)
    }

    /// The canonical document as indented JSON text.
    pub fn to_string(&self, config: &ConfigNode) -> Result<String> {
        let document = self.render(config);
        let indent = " ".repeat(self.indent);
        let formatter = serde_json::ser::PrettyFormatter::with_indent(indent.as_bytes());
        let mut buffer = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        document.serialize(&mut serializer)?;
        // serde_json only emits valid UTF-8
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }

    /// Write the snapshot of `config` into `output_dir` and return its path.
    ///
    /// The directory must already exist. The file is replaced atomically.
    pub fn write(&self, config: &ConfigNode, output_dir: impl AsRef<Path>) -> Result<PathBuf> {
        let content = self.to_string(config)?;
        let path = NormalizedPath::new(output_dir.as_ref()).join(&self.file_name);

        confnode_fs::io::write_text(&path, &content).map_err(|source| Error::Write {
            path: path.to_native(),
            source,
        })?;

        tracing::info!(path = %path, config_class = config.config_class(), "Wrote config snapshot");
        Ok(path.to_native())
    }
}

fn render_node(node: &ConfigNode) -> Value {
    let params: Map<String, Value> = node
        .params()
        .into_iter()
        .map(|(name, value)| (name, render_value(&value)))
        .collect();

    let mut body = Map::new();
    body.insert(KEY_CONFIG_CLASS.to_string(), Value::String(node.config_class().to_string()));
    body.insert(KEY_PARAMS.to_string(), Value::Object(params));
    if let Some(target) = node.target_class() {
        body.insert(KEY_TARGET_CLASS.to_string(), Value::String(target.to_string()));
    }

    let mut envelope = Map::new();
    envelope.insert(node.tag().as_str().to_string(), Value::Object(body));
    Value::Object(envelope)
}

fn render_value(value: &ConfigValue) -> Value {
    match value {
        ConfigValue::Scalar(scalar) => scalar.clone(),
        ConfigValue::Node(node) => render_node(node),
        ConfigValue::List(items) => Value::Array(items.iter().map(render_value).collect()),
        ConfigValue::Map(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), render_value(item)))
                .collect(),
        ),
    }
}
