//! Shared test utilities for the confnode workspace.
//!
//! Dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`tree`]: [`ConfigTree`], a temp directory with a `configs/` root
//! - [`demo`]: demo record shapes and domain objects plus a ready registry

pub mod demo;
pub mod tree;

pub use demo::{demo_registry, write_scenario};
pub use tree::ConfigTree;
