//! [`ConfigTree`] builder for on-disk configuration fixtures.

use serde_json::{Value, json};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// A temporary directory holding a `configs/` root and an output directory.
///
/// # Example
///
/// ```rust,no_run
/// use confnode_test_utils::tree::{ConfigTree, link, object_node};
/// use serde_json::json;
///
/// let tree = ConfigTree::new();
/// tree.write_link("tools.alpha", &object_node("pkg.ToolConfig", "pkg.Tool", json!({})));
/// let root = tree.write("root.json", &json!({"@CONFIG_LINK": "tools.alpha"}));
/// ```
pub struct ConfigTree {
    temp_dir: TempDir,
    root_name: String,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigTree {
    /// Create a temp directory with an empty `configs/` root.
    pub fn new() -> Self {
        Self::with_root_name("configs")
    }

    /// Create a temp directory whose configuration root is named `name`.
    pub fn with_root_name(name: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join(name)).unwrap();
        fs::create_dir_all(temp_dir.path().join("output")).unwrap();
        Self {
            temp_dir,
            root_name: name.to_string(),
        }
    }

    /// The temp directory itself.
    pub fn root(&self) -> &Path {
        self.temp_dir.path()
    }

    /// The configuration root.
    pub fn configs_dir(&self) -> PathBuf {
        self.root().join(&self.root_name)
    }

    /// An existing, empty directory outside the configuration root.
    pub fn output_dir(&self) -> PathBuf {
        self.root().join("output")
    }

    /// Write `document` to `rel` below the configuration root, creating
    /// parent directories.
    pub fn write(&self, rel: &str, document: &Value) -> PathBuf {
        self.write_raw(rel, &serde_json::to_string_pretty(document).unwrap())
    }

    /// Write raw text to `rel` below the configuration root.
    pub fn write_raw(&self, rel: &str, text: &str) -> PathBuf {
        let path = self.configs_dir().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, text).unwrap();
        path
    }

    /// Write `document` to the file the dotted `link` names.
    pub fn write_link(&self, link: &str, document: &Value) -> PathBuf {
        let rel = format!("{}.json", link.replace('.', "/"));
        self.write(&rel, document)
    }

    /// Read back a file written by the writer into the output directory.
    pub fn read_output(&self, file_name: &str) -> Value {
        let text = fs::read_to_string(self.output_dir().join(file_name))
            .unwrap_or_else(|_| panic!("Could not read output file: {file_name}"));
        serde_json::from_str(&text).unwrap()
    }
}

/// `{"@SIMPLE_CONFIG": {config_class, params}}`
pub fn simple_node(config_class: &str, params: Value) -> Value {
    json!({"@SIMPLE_CONFIG": {"config_class": config_class, "params": params}})
}

/// `{"@COMMAND_CONFIG": {config_class, params}}`
pub fn command_node(config_class: &str, params: Value) -> Value {
    json!({"@COMMAND_CONFIG": {"config_class": config_class, "params": params}})
}

/// `{"@OBJECT_CONFIG": {config_class, target_class, params}}`
pub fn object_node(config_class: &str, target_class: &str, params: Value) -> Value {
    json!({"@OBJECT_CONFIG": {
        "config_class": config_class,
        "target_class": target_class,
        "params": params,
    }})
}

/// `{"@CONFIG_LINK": link}`
pub fn link(link: &str) -> Value {
    json!({"@CONFIG_LINK": link})
}
