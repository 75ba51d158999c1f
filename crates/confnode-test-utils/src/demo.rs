//! Demo record shapes and domain objects.
//!
//! A command config holds a list of tool configs; each tool config names the
//! domain type it builds. [`AdvancedToolConfig`] extends [`ToolConfig`] with
//! one more field, and a command accepts either kind in its `tools` list.

use confnode_core::{
    BoxError, ConfigMeta, ConfigNode, ConfigRecord, ConfigTag, Error, Params, Result, TargetType,
    TypeRegistry,
};
use crate::tree::{ConfigTree, command_node, link, object_node};
use serde_json::{Value, json};
use std::fmt;
use std::path::PathBuf;

pub const TOOL_CONFIG: &str = "confnode.demo.ToolConfig";
pub const ADVANCED_TOOL_CONFIG: &str = "confnode.demo.AdvancedToolConfig";
pub const TEST_COMMAND_CONFIG: &str = "confnode.demo.TestCommandConfig";
pub const DATA_CONFIG: &str = "confnode.demo.DataConfig";
pub const TOOL: &str = "confnode.demo.Tool";
pub const ADVANCED_TOOL: &str = "confnode.demo.AdvancedTool";

#[derive(Debug)]
pub struct ToolConfig {
    pub meta: ConfigMeta,
    pub param_1: String,
    pub param_2: i64,
}

impl ConfigRecord for ToolConfig {
    const TAG: ConfigTag = ConfigTag::Object;

    fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
        Ok(Self {
            meta,
            param_1: params.required("param_1")?,
            param_2: params.required("param_2")?,
        })
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("param_1", &self.param_1)
            .with("param_2", self.param_2)
    }
}

#[derive(Debug)]
pub struct AdvancedToolConfig {
    pub meta: ConfigMeta,
    pub param_1: String,
    pub param_2: i64,
    pub param_advanced: f64,
}

impl ConfigRecord for AdvancedToolConfig {
    const TAG: ConfigTag = ConfigTag::Object;

    fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
        Ok(Self {
            meta,
            param_1: params.required("param_1")?,
            param_2: params.required("param_2")?,
            param_advanced: params.required("param_advanced")?,
        })
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("param_1", &self.param_1)
            .with("param_2", self.param_2)
            .with("param_advanced", self.param_advanced)
    }
}

#[derive(Debug)]
pub struct TestCommandConfig {
    pub meta: ConfigMeta,
    pub param_1: f64,
    pub tools: Vec<ConfigNode>,
    pub url: String,
}

impl ConfigRecord for TestCommandConfig {
    const TAG: ConfigTag = ConfigTag::Command;

    fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
        let param_1 = params.required("param_1")?;
        let tools: Vec<ConfigNode> = params.required("tools")?;
        for (index, tool) in tools.iter().enumerate() {
            if !(tool.is::<ToolConfig>() || tool.is::<AdvancedToolConfig>()) {
                return Err(Error::schema(format!(
                    "expected a tool config, found '{}'",
                    tool.config_class()
                ))
                .at_index(index)
                .at_field("tools"));
            }
        }

        let url: String = params.required("url")?;
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or_default();
        if host.is_empty() || host.starts_with('/') {
            return Err(Error::schema(format!("'{url}' is not an http(s) URL")).at_field("url"));
        }

        Ok(Self {
            meta,
            param_1,
            tools,
            url,
        })
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("param_1", self.param_1)
            .with("tools", &self.tools)
            .with("url", &self.url)
    }
}

/// Plain data record that ignores fields it does not know.
#[derive(Debug)]
pub struct DataConfig {
    pub meta: ConfigMeta,
    pub label: Option<String>,
    pub payload: Value,
}

impl ConfigRecord for DataConfig {
    const TAG: ConfigTag = ConfigTag::Simple;
    const DENY_UNKNOWN_FIELDS: bool = false;

    fn meta(&self) -> &ConfigMeta {
        &self.meta
    }

    fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
        Ok(Self {
            meta,
            label: params.optional("label")?,
            payload: params.or_default("payload")?,
        })
    }

    fn to_params(&self) -> Params {
        Params::new()
            .with("label", &self.label)
            .with("payload", &self.payload)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("param_1 must not be empty")]
    EmptyName,

    #[error("param_advanced must be finite, got {0}")]
    NotFinite(f64),
}

/// Behaviour shared by every demo tool.
pub trait ToolBehavior: fmt::Debug + Send {
    fn param_1(&self) -> &str;

    fn param_2(&self) -> i64;

    fn param_advanced(&self) -> Option<f64> {
        None
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tool {
    param_1: String,
    param_2: i64,
}

impl Tool {
    pub fn new(config: &ToolConfig) -> std::result::Result<Self, ToolError> {
        Self::from_fields(&config.param_1, config.param_2)
    }

    fn from_fields(param_1: &str, param_2: i64) -> std::result::Result<Self, ToolError> {
        if param_1.is_empty() {
            return Err(ToolError::EmptyName);
        }
        Ok(Self {
            param_1: param_1.to_string(),
            param_2,
        })
    }
}

impl ToolBehavior for Tool {
    fn param_1(&self) -> &str {
        &self.param_1
    }

    fn param_2(&self) -> i64 {
        self.param_2
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdvancedTool {
    tool: Tool,
    param_advanced: f64,
}

impl AdvancedTool {
    pub fn new(config: &AdvancedToolConfig) -> std::result::Result<Self, ToolError> {
        if !config.param_advanced.is_finite() {
            return Err(ToolError::NotFinite(config.param_advanced));
        }
        Ok(Self {
            tool: Tool::from_fields(&config.param_1, config.param_2)?,
            param_advanced: config.param_advanced,
        })
    }
}

impl ToolBehavior for AdvancedTool {
    fn param_1(&self) -> &str {
        self.tool.param_1()
    }

    fn param_2(&self) -> i64 {
        self.tool.param_2()
    }

    fn param_advanced(&self) -> Option<f64> {
        Some(self.param_advanced)
    }
}

/// A registry with every demo shape and domain type.
///
/// Both tool types construct a `Box<dyn ToolBehavior>`, so a mixed tool list
/// instantiates into one element type. `Tool` also exposes a
/// `load` method that restores a tool with a saved `param_2`.
pub fn demo_registry() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    register_demo_types(&mut registry).unwrap();
    registry
}

fn register_demo_types(registry: &mut TypeRegistry) -> Result<()> {
    registry
        .register_config::<ToolConfig>(TOOL_CONFIG)?
        .register_config::<AdvancedToolConfig>(ADVANCED_TOOL_CONFIG)?
        .register_config::<TestCommandConfig>(TEST_COMMAND_CONFIG)?
        .register_config::<DataConfig>(DATA_CONFIG)?
        .register_target(
            TOOL,
            TargetType::new(|config: &ToolConfig| {
                Tool::new(config).map(|tool| Box::new(tool) as Box<dyn ToolBehavior>)
            })
            .with_method(
                "load",
                |config: &ToolConfig,
                 mut args: Params|
                 -> std::result::Result<Box<dyn ToolBehavior>, BoxError> {
                    let param_2: i64 = args.required("param_2")?;
                    let tool = Tool::from_fields(&config.param_1, param_2)?;
                    Ok(Box::new(tool))
                },
            ),
        )?
        .register_target(
            ADVANCED_TOOL,
            TargetType::new(|config: &AdvancedToolConfig| {
                AdvancedTool::new(config).map(|tool| Box::new(tool) as Box<dyn ToolBehavior>)
            }),
        )?;
    Ok(())
}

/// Write the reference scenario into `tree` and return the root file.
///
/// `configs/root.json` is a test command whose first tool links to
/// `configs/tools/alpha.json` and whose second tool is an inline advanced
/// tool.
pub fn write_scenario(tree: &ConfigTree) -> PathBuf {
    tree.write_link(
        "tools.alpha",
        &object_node(TOOL_CONFIG, TOOL, json!({"param_1": "alpha", "param_2": 3})),
    );
    tree.write(
        "root.json",
        &command_node(
            TEST_COMMAND_CONFIG,
            json!({
                "param_1": 1.5,
                "tools": [
                    link("tools.alpha"),
                    object_node(
                        ADVANCED_TOOL_CONFIG,
                        ADVANCED_TOOL,
                        json!({"param_1": "beta", "param_2": 7, "param_advanced": 0.25}),
                    ),
                ],
                "url": "https://example.com/api",
            }),
        ),
    )
}
