//! Snapshot writing and read-write-read round trips

use confnode_core::{ConfigNode, ConfigReader, ConfigWriter, ErrorKind, TypeRegistry};
use confnode_test_utils::demo::{TEST_COMMAND_CONFIG, TOOL, TOOL_CONFIG};
use confnode_test_utils::tree::{command_node, link, object_node};
use confnode_test_utils::{ConfigTree, demo_registry, write_scenario};
use serde_json::json;
use std::path::Path;

fn read(registry: &TypeRegistry, path: &Path) -> ConfigNode {
    ConfigReader::new(registry).read(path).unwrap()
}

/// Write `config` below the configuration root so the snapshot can be read back.
fn write_and_reread(tree: &ConfigTree, registry: &TypeRegistry, config: &ConfigNode) -> ConfigNode {
    let snapshots = tree.configs_dir().join("snapshots");
    std::fs::create_dir_all(&snapshots).unwrap();
    let path = ConfigWriter::new().write(config, &snapshots).unwrap();
    read(registry, &path)
}

#[test]
fn scenario_snapshot() {
    let tree = ConfigTree::new();
    let registry = demo_registry();
    let config = read(&registry, &write_scenario(&tree));

    let path = ConfigWriter::new().write(&config, tree.output_dir()).unwrap();
    let text = std::fs::read_to_string(path).unwrap();

    insta::assert_snapshot!(text, @r###"
    {
        "@COMMAND_CONFIG": {
            "config_class": "confnode.demo.TestCommandConfig",
            "params": {
                "param_1": 1.5,
                "tools": [
                    {
                        "@OBJECT_CONFIG": {
                            "config_class": "confnode.demo.ToolConfig",
                            "params": {
                                "param_1": "alpha",
                                "param_2": 3
                            },
                            "target_class": "confnode.demo.Tool"
                        }
                    },
                    {
                        "@OBJECT_CONFIG": {
                            "config_class": "confnode.demo.AdvancedToolConfig",
                            "params": {
                                "param_1": "beta",
                                "param_2": 7,
                                "param_advanced": 0.25
                            },
                            "target_class": "confnode.demo.AdvancedTool"
                        }
                    }
                ],
                "url": "https://example.com/api"
            }
        }
    }
    "###);
}

#[test]
fn round_trip_drops_only_link_provenance() {
    let tree = ConfigTree::new();
    let registry = demo_registry();
    let first = read(&registry, &write_scenario(&tree));

    let second = write_and_reread(&tree, &registry, &first);

    assert!(first.same_content(&second));
    // The linked tool remembers its link only in the first graph
    assert_ne!(first, second);
    let written = tree.configs_dir().join("snapshots/config.json");
    let text = std::fs::read_to_string(written).unwrap();
    assert!(!text.contains("@CONFIG_LINK"));
    assert!(!text.contains("config_link"));
}

#[test]
fn round_trip_without_links_is_exact() {
    let tree = ConfigTree::new();
    let root = tree.write(
        "root.json",
        &object_node(TOOL_CONFIG, TOOL, json!({"param_1": "solo", "param_2": -4})),
    );
    let registry = demo_registry();
    let first = read(&registry, &root);

    let second = write_and_reread(&tree, &registry, &first);

    assert_eq!(first, second);
}

#[test]
fn round_trip_with_repeated_links_is_stable() {
    let tree = ConfigTree::new();
    tree.write_link(
        "tools.alpha",
        &object_node(TOOL_CONFIG, TOOL, json!({"param_1": "alpha", "param_2": 1})),
    );
    let root = tree.write(
        "root.json",
        &command_node(
            TEST_COMMAND_CONFIG,
            json!({
                "param_1": 2,
                "tools": [link("tools.alpha"), link("tools.alpha"), link("tools.alpha")],
                "url": "http://localhost",
            }),
        ),
    );
    let registry = demo_registry();
    let first = read(&registry, &root);

    let second = write_and_reread(&tree, &registry, &first);
    let third = write_and_reread(&tree, &registry, &second);

    assert!(first.same_content(&second));
    assert_eq!(second, third);
}

#[test]
fn writing_does_not_touch_the_source_graph() {
    let tree = ConfigTree::new();
    let registry = demo_registry();
    let config = read(&registry, &write_scenario(&tree));
    let before = format!("{config:?}");

    ConfigWriter::new().write(&config, tree.output_dir()).unwrap();

    assert_eq!(format!("{config:?}"), before);
    assert_eq!(
        tree.read_output("config.json"),
        ConfigWriter::new().render(&config)
    );
}

#[test]
fn custom_file_name_and_indent() {
    let tree = ConfigTree::new();
    let registry = demo_registry();
    let config = read(&registry, &write_scenario(&tree));

    let writer = ConfigWriter::new().with_file_name("snapshot.json").with_indent(2);
    let path = writer.write(&config, tree.output_dir()).unwrap();

    assert!(path.ends_with("snapshot.json"));
    let text = std::fs::read_to_string(path).unwrap();
    assert!(text.contains("\n  \"@COMMAND_CONFIG\""), "got: {text}");
}

#[test]
fn missing_output_directory_fails() {
    let tree = ConfigTree::new();
    let registry = demo_registry();
    let config = read(&registry, &write_scenario(&tree));

    let err = ConfigWriter::new()
        .write(&config, tree.root().join("does/not/exist"))
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(!tree.root().join("does").exists());
}
