//! Configuration tags and the reserved keys of the on-disk format

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Key of the dotted record-shape name inside a node body.
pub const KEY_CONFIG_CLASS: &str = "config_class";
/// Key of the dotted domain type name inside an object node body.
pub const KEY_TARGET_CLASS: &str = "target_class";
/// Key of the field mapping inside a node body.
pub const KEY_PARAMS: &str = "params";
/// Sole key of a config link.
pub const KEY_CONFIG_LINK: &str = "@CONFIG_LINK";
/// Parameter-set field carrying the node tag.
pub const FIELD_CONFIG_TYPE: &str = "config_type";
/// Parameter-set field carrying the link a node was loaded through.
pub const FIELD_CONFIG_LINK: &str = "config_link";

/// Fields of a parameter set that belong to [`crate::ConfigMeta`] rather than
/// to the record shape.
pub const RESERVED_FIELDS: [&str; 4] = [
    FIELD_CONFIG_TYPE,
    KEY_CONFIG_CLASS,
    KEY_TARGET_CLASS,
    FIELD_CONFIG_LINK,
];

/// Discriminator selecting the kind of record a node is parsed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfigTag {
    /// Plain data record, may be the target of a link
    #[serde(rename = "@SIMPLE_CONFIG")]
    Simple,
    /// Root record accepted by command entry points
    #[serde(rename = "@COMMAND_CONFIG")]
    Command,
    /// Record that names a domain type to instantiate
    #[serde(rename = "@OBJECT_CONFIG")]
    Object,
}

impl ConfigTag {
    pub const ALL: [ConfigTag; 3] = [ConfigTag::Simple, ConfigTag::Command, ConfigTag::Object];

    /// The key this tag is written under.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Simple => "@SIMPLE_CONFIG",
            Self::Command => "@COMMAND_CONFIG",
            Self::Object => "@OBJECT_CONFIG",
        }
    }

    /// Look up the tag written under `key`.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == key)
    }

    pub fn is_tag_key(key: &str) -> bool {
        Self::from_key(key).is_some()
    }

    /// Whether nodes with this tag must name a `target_class`.
    pub fn requires_target(&self) -> bool {
        matches!(self, Self::Object)
    }

    /// Whether nodes with this tag may be loaded through a config link.
    pub fn accepts_link(&self) -> bool {
        !matches!(self, Self::Command)
    }
}

impl fmt::Display for ConfigTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConfigTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_key(s).ok_or_else(|| format!("unknown config tag '{s}'"))
    }
}
