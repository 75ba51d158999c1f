//! Filesystem layer for confnode
//!
//! Locates the `configs` root a configuration file lives under, maps dotted
//! config links onto files below that root, and provides the read and atomic
//! write primitives used by the reader and writer.

pub mod constants;
pub mod error;
pub mod io;
pub mod path;
pub mod root;

pub use constants::ConfigPath;
pub use error::{Error, Result};
pub use path::NormalizedPath;
pub use root::ConfigRoot;
