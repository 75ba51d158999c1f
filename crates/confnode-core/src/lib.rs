//! Resolution and serialization of linked configuration graphs
//!
//! Configuration lives in JSON files below a directory named `configs`. Each
//! file holds one tagged node:
//!
//! ```text
//! { "@OBJECT_CONFIG": {
//!     "config_class": "app.tools.ToolConfig",
//!     "target_class": "app.tools.Tool",
//!     "params": { "param_1": "x", "next": { "@CONFIG_LINK": "tools.beta" } }
//! } }
//! ```
//!
//! The crate provides:
//!
//! - **[`TypeRegistry`]**: record shapes and domain types keyed by dotted names
//! - **[`ConfigReader`]**: parses a file, follows config links and builds an
//!   immutable graph of [`ConfigNode`]s
//! - **[`ConfigWriter`]**: flattens a graph into one `config.json` snapshot
//! - **[`ObjectFactory`]**: builds the domain object an object config names
//!
//! # Architecture
//!
//! ```text
//!        reader ----> registry <---- factory
//!          |             |
//!        value         model / params
//!          |
//!     confnode-fs            writer ----> confnode-fs
//! ```
//!
//! # Example
//!
//! ```ignore
//! use confnode_core::{ConfigReader, ConfigWriter, ObjectFactory, TypeRegistry};
//!
//! let mut registry = TypeRegistry::new();
//! registry.register_config::<ToolConfig>("app.tools.ToolConfig")?;
//!
//! let config = ConfigReader::new(&registry).read("configs/root.json")?;
//! ConfigWriter::new().write(&config, &output_dir)?;
//! let tool: Tool = ObjectFactory::new(&registry).instantiate_as(config)?;
//! ```

pub mod error;
pub mod factory;
pub mod logging;
pub mod model;
pub mod params;
pub mod reader;
pub mod registry;
pub mod tag;
pub mod value;
pub mod writer;

pub use error::{BoxError, Error, ErrorKind, Result};
pub use factory::ObjectFactory;
pub use model::{Config, ConfigMeta, ConfigNode, ConfigRecord};
pub use params::{FromConfigValue, Params, ToConfigValue};
pub use reader::{ConfigReader, ReaderOptions};
pub use registry::{ConfigShape, Instance, TargetType, TypeHandle, TypeRegistry};
pub use tag::ConfigTag;
pub use value::{ConfigValue, RawNode, RawValue};
pub use writer::ConfigWriter;
