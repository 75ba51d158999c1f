//! End-to-end integration test for the command flow
//!
//! Exercises what a command entry point does: read the root config, write a
//! provenance snapshot, read the snapshot back, then build the domain objects.

use confnode_core::{
    ConfigReader, ConfigWriter, ObjectFactory, Params, ReaderOptions, logging,
};
use confnode_fs::ConfigRoot;
use confnode_test_utils::demo::{TestCommandConfig, ToolBehavior};
use confnode_test_utils::{ConfigTree, demo_registry, write_scenario};
use pretty_assertions::assert_eq;

#[test]
fn test_read_write_instantiate() {
    let _ = logging::init();
    let tree = ConfigTree::new();
    let root = write_scenario(&tree);
    let registry = demo_registry();
    let reader = ConfigReader::new(&registry);

    // Read and snapshot
    let config = reader.read(&root).unwrap();
    let snapshot = ConfigWriter::new().write(&config, tree.output_dir()).unwrap();
    tracing::info!(snapshot = %snapshot.display(), "Snapshot written");

    // The snapshot is self-contained: resolve it against an unrelated root
    let document = tree.read_output("config.json");
    let unrelated = ConfigRoot::new(tree.root().join("nowhere"));
    let restored = reader.resolve_document(document, &unrelated).unwrap();
    assert!(config.same_content(&restored));

    // Build the tools from the restored command
    let command = restored.downcast::<TestCommandConfig>().unwrap();
    let factory = ObjectFactory::new(&registry);
    let tools: Vec<Box<dyn ToolBehavior>> = command
        .tools
        .iter()
        .map(|tool| factory.instantiate_as(tool.clone()))
        .collect::<Result<_, _>>()
        .unwrap();

    let names: Vec<&str> = tools.iter().map(|tool| tool.param_1()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
}

#[test]
fn test_load_method_through_factory() {
    let tree = ConfigTree::new();
    let root = write_scenario(&tree);
    let registry = demo_registry();

    let command = ConfigReader::new(&registry)
        .read_as::<TestCommandConfig>(&root)
        .unwrap();
    let factory = ObjectFactory::new(&registry);
    let target = factory.resolve_target_type(&command.tools[0]).unwrap();

    assert_eq!(target.methods(), vec!["load"]);
    let tool: Box<dyn ToolBehavior> = target
        .call_as("load", &command.tools[0], Params::new().with("param_2", 100))
        .unwrap();
    assert_eq!(tool.param_2(), 100);
}

#[test]
fn test_options_from_json() {
    let tree = ConfigTree::with_root_name("conf");
    let root = write_scenario(&tree);
    let options: ReaderOptions =
        serde_json::from_value(serde_json::json!({"root_dir_name": "conf"})).unwrap();
    let registry = demo_registry();

    let config = ConfigReader::new(&registry)
        .with_options(options)
        .read(&root)
        .unwrap();

    assert_eq!(config.config_class(), "confnode.demo.TestCommandConfig");
}
