//! Tests against the checked-in fixture tree in `test-fixtures/configs`

use confnode_core::{ConfigReader, ConfigWriter, ErrorKind, ObjectFactory};
use confnode_test_utils::demo::{
    AdvancedToolConfig, DataConfig, TestCommandConfig, ToolBehavior, ToolConfig,
};
use confnode_test_utils::demo_registry;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::path::PathBuf;
use tempfile::TempDir;

fn fixture(rel: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../test-fixtures/configs")
        .join(rel)
}

#[test]
fn test_fixture_root_resolves_every_link() {
    let registry = demo_registry();
    let command = ConfigReader::new(&registry)
        .read_as::<TestCommandConfig>(fixture("root.json"))
        .unwrap();

    assert_eq!(command.param_1, 0.75);
    assert_eq!(command.tools.len(), 3);

    let links: Vec<Option<&str>> = command.tools.iter().map(|t| t.config_link()).collect();
    assert_eq!(links, vec![Some("tools.alpha"), Some("tools.advanced.beta"), None]);

    assert!(command.tools[0].is::<ToolConfig>());
    let beta = command.tools[1].downcast_ref::<AdvancedToolConfig>().unwrap();
    assert_eq!(beta.param_advanced, 0.125);
}

#[test]
fn test_fixture_tools_instantiate() {
    let registry = demo_registry();
    let command = ConfigReader::new(&registry)
        .read_as::<TestCommandConfig>(fixture("root.json"))
        .unwrap();
    let factory = ObjectFactory::new(&registry);

    let summary: Vec<(String, i64, Option<f64>)> = command
        .tools
        .iter()
        .map(|config| {
            let tool: Box<dyn ToolBehavior> = factory.instantiate_as(config.clone()).unwrap();
            (tool.param_1().to_string(), tool.param_2(), tool.param_advanced())
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("alpha".to_string(), 3, None),
            ("beta".to_string(), 7, Some(0.125)),
            ("inline".to_string(), 11, None),
        ]
    );
}

#[test]
fn test_fixture_snapshot_is_flat() {
    let registry = demo_registry();
    let config = ConfigReader::new(&registry).read(fixture("root.json")).unwrap();
    let out = TempDir::new().unwrap();

    let path = ConfigWriter::new().write(&config, out.path()).unwrap();
    let written: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();

    let tools = &written["@COMMAND_CONFIG"]["params"]["tools"];
    assert_eq!(tools.as_array().map(Vec::len), Some(3));
    assert_eq!(
        tools[1]["@OBJECT_CONFIG"]["params"],
        json!({"param_1": "beta", "param_2": 7, "param_advanced": 0.125})
    );
    assert!(!written.to_string().contains("@CONFIG_LINK"));
}

#[test]
fn test_fixture_lenient_data_config() {
    let registry = demo_registry();
    let data = ConfigReader::new(&registry)
        .read_as::<DataConfig>(fixture("data/settings.json"))
        .unwrap();

    assert_eq!(data.label.as_deref(), Some("settings"));
    assert_eq!(data.payload["batch_size"], json!(32));
    assert_eq!(data.payload["tags"], json!({"stage": "dev"}));
}

#[test]
fn test_fixture_cycle_is_detected() {
    let registry = demo_registry();
    let err = ConfigReader::new(&registry)
        .read(fixture("cycles/first.json"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Recursion);
    let message = err.to_string();
    assert!(message.contains("first.json -> "), "got: {message}");
    assert!(message.contains("second.json"), "got: {message}");
}
