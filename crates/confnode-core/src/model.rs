//! Resolved configuration objects
//!
//! A record shape is a plain Rust struct implementing [`ConfigRecord`]. Once
//! built it is wrapped in a [`ConfigNode`], an immutable shared handle that the
//! writer and the object factory consume without knowing the concrete type.

use crate::params::Params;
use crate::tag::{
    ConfigTag, FIELD_CONFIG_LINK, FIELD_CONFIG_TYPE, KEY_CONFIG_CLASS, KEY_TARGET_CLASS,
};
use crate::value::ConfigValue;
use crate::{Error, Result};
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Fields every resolved configuration object carries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ConfigMeta {
    tag: ConfigTag,
    config_class: String,
    target_class: Option<String>,
    config_link: Option<String>,
}

impl ConfigMeta {
    /// Metadata for a simple or command config.
    pub fn new(tag: ConfigTag, config_class: impl Into<String>) -> Self {
        Self {
            tag,
            config_class: config_class.into(),
            target_class: None,
            config_link: None,
        }
    }

    /// Metadata for an object config.
    pub fn object(config_class: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self {
            tag: ConfigTag::Object,
            config_class: config_class.into(),
            target_class: Some(target_class.into()),
            config_link: None,
        }
    }

    /// Record the link this config was loaded through.
    pub fn with_link(mut self, link: impl Into<String>) -> Self {
        self.config_link = Some(link.into());
        self
    }

    pub fn tag(&self) -> ConfigTag {
        self.tag
    }

    pub fn config_class(&self) -> &str {
        &self.config_class
    }

    pub fn target_class(&self) -> Option<&str> {
        self.target_class.as_deref()
    }

    pub fn config_link(&self) -> Option<&str> {
        self.config_link.as_deref()
    }

    /// Remove the metadata fields from a parameter set and validate them.
    ///
    /// `target_class` must be present exactly when the tag is
    /// [`ConfigTag::Object`], and command configs cannot carry a link.
    pub fn take_from(params: &mut Params) -> Result<Self> {
        let tag = match params.take(FIELD_CONFIG_TYPE) {
            Some(ConfigValue::Scalar(serde_json::Value::String(key))) => ConfigTag::from_key(&key)
                .ok_or_else(|| Error::schema(format!("unknown config tag '{key}'")))
                .map_err(|e| e.at_field(FIELD_CONFIG_TYPE))?,
            Some(other) => {
                return Err(Error::schema(format!(
                    "expected a config tag, found {}",
                    other.type_name()
                ))
                .at_field(FIELD_CONFIG_TYPE));
            }
            None => return Err(Error::schema("missing config tag").at_field(FIELD_CONFIG_TYPE)),
        };

        let config_class: String = params.required(KEY_CONFIG_CLASS)?;
        let target_class: Option<String> = params.optional(KEY_TARGET_CLASS)?;
        let config_link: Option<String> = params.optional(FIELD_CONFIG_LINK)?;

        match (tag.requires_target(), &target_class) {
            (true, None) => {
                return Err(Error::schema(format!(
                    "{tag} requires '{KEY_TARGET_CLASS}'"
                ))
                .at_field(KEY_TARGET_CLASS));
            }
            (false, Some(_)) => {
                return Err(Error::schema(format!(
                    "'{KEY_TARGET_CLASS}' is only allowed on {}",
                    ConfigTag::Object
                ))
                .at_field(KEY_TARGET_CLASS));
            }
            _ => {}
        }

        if config_link.is_some() && !tag.accepts_link() {
            return Err(Error::schema(format!("{tag} cannot be the target of a config link")));
        }

        Ok(Self {
            tag,
            config_class,
            target_class,
            config_link,
        })
    }

    fn same_content(&self, other: &Self) -> bool {
        self.tag == other.tag
            && self.config_class == other.config_class
            && self.target_class == other.target_class
    }
}

/// A record shape a node body can be parsed into.
///
/// Implementations pull their fields out of the parameter set with
/// [`Params::required`] and friends, and hand them back in
/// [`ConfigRecord::to_params`] under the same names so a written snapshot
/// reads back into an equal record.
pub trait ConfigRecord: fmt::Debug + Send + Sync + 'static {
    /// The only tag nodes of this shape may carry.
    const TAG: ConfigTag;

    /// Reject parameters the shape did not consume.
    const DENY_UNKNOWN_FIELDS: bool = true;

    fn meta(&self) -> &ConfigMeta;

    /// Build the record, consuming the fields it knows from `params`.
    fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self>
    where
        Self: Sized;

    /// The record's own fields, metadata excluded.
    fn to_params(&self) -> Params;
}

/// Object-safe view of any [`ConfigRecord`].
pub trait Config: fmt::Debug + Send + Sync + 'static {
    fn config_meta(&self) -> &ConfigMeta;

    fn dump_params(&self) -> Params;

    /// Rust type name of the record shape.
    fn record_type(&self) -> &'static str;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: ConfigRecord> Config for T {
    fn config_meta(&self) -> &ConfigMeta {
        self.meta()
    }

    fn dump_params(&self) -> Params {
        self.to_params()
    }

    fn record_type(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Shared handle to an immutable resolved configuration object.
#[derive(Clone)]
pub struct ConfigNode(Arc<dyn Config>);

impl ConfigNode {
    pub fn new<T: ConfigRecord>(record: T) -> Self {
        Self(Arc::new(record))
    }

    pub fn meta(&self) -> &ConfigMeta {
        self.0.config_meta()
    }

    pub fn tag(&self) -> ConfigTag {
        self.meta().tag()
    }

    pub fn config_class(&self) -> &str {
        self.meta().config_class()
    }

    pub fn target_class(&self) -> Option<&str> {
        self.meta().target_class()
    }

    pub fn config_link(&self) -> Option<&str> {
        self.meta().config_link()
    }

    /// The record's own fields, metadata excluded.
    pub fn params(&self) -> Params {
        self.0.dump_params()
    }

    pub fn record_type(&self) -> &'static str {
        self.0.record_type()
    }

    pub fn is<T: ConfigRecord>(&self) -> bool {
        self.0.as_any().is::<T>()
    }

    pub fn downcast_ref<T: ConfigRecord>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    /// Typed shared handle to the record, if it is a `T`.
    pub fn downcast<T: ConfigRecord>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.0).into_any().downcast::<T>().ok()
    }

    /// Whether both handles point at the same allocation.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Structural equality that ignores link provenance at every depth.
    pub fn same_content(&self, other: &Self) -> bool {
        self.meta().same_content(other.meta()) && self.params().same_content(&other.params())
    }
}

impl<T: ConfigRecord> From<Arc<T>> for ConfigNode {
    fn from(record: Arc<T>) -> Self {
        Self(record)
    }
}

impl PartialEq for ConfigNode {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || (self.meta() == other.meta() && self.params() == other.params())
    }
}

impl fmt::Debug for ConfigNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.0, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug)]
    struct Leaf {
        meta: ConfigMeta,
        size: i64,
    }

    impl ConfigRecord for Leaf {
        const TAG: ConfigTag = ConfigTag::Simple;

        fn meta(&self) -> &ConfigMeta {
            &self.meta
        }

        fn from_params(meta: ConfigMeta, params: &mut Params) -> Result<Self> {
            Ok(Self {
                meta,
                size: params.required("size")?,
            })
        }

        fn to_params(&self) -> Params {
            Params::new().with("size", self.size)
        }
    }

    fn meta_params(tag: ConfigTag, target: Option<&str>) -> Params {
        let mut params = Params::new()
            .with(FIELD_CONFIG_TYPE, tag.as_str())
            .with(KEY_CONFIG_CLASS, "pkg.Leaf");
        if let Some(target) = target {
            params.insert(KEY_TARGET_CLASS, ConfigValue::Scalar(json!(target)));
        }
        params
    }

    #[test]
    fn take_from_strips_metadata_fields() {
        let mut params = meta_params(ConfigTag::Object, Some("pkg.Tool")).with("size", 3);

        let meta = ConfigMeta::take_from(&mut params).unwrap();

        assert_eq!(meta, ConfigMeta::object("pkg.Leaf", "pkg.Tool"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["size"]);
    }

    #[test]
    fn target_class_is_required_exactly_for_objects() {
        let missing = ConfigMeta::take_from(&mut meta_params(ConfigTag::Object, None));
        let extra = ConfigMeta::take_from(&mut meta_params(ConfigTag::Simple, Some("pkg.T")));
        let extra_cmd = ConfigMeta::take_from(&mut meta_params(ConfigTag::Command, Some("pkg.T")));

        assert!(missing.unwrap_err().to_string().contains("requires 'target_class'"));
        assert!(extra.is_err());
        assert!(extra_cmd.is_err());
    }

    #[test]
    fn command_configs_reject_links() {
        let mut params = meta_params(ConfigTag::Command, None).with(FIELD_CONFIG_LINK, "cmd.root");
        assert!(ConfigMeta::take_from(&mut params).is_err());

        let mut params = meta_params(ConfigTag::Simple, None).with(FIELD_CONFIG_LINK, "data.a");
        let meta = ConfigMeta::take_from(&mut params).unwrap();
        assert_eq!(meta.config_link(), Some("data.a"));
    }

    #[test]
    fn downcast_recovers_the_record() {
        let node = ConfigNode::new(Leaf {
            meta: ConfigMeta::new(ConfigTag::Simple, "pkg.Leaf"),
            size: 7,
        });

        assert!(node.is::<Leaf>());
        assert_eq!(node.downcast_ref::<Leaf>().unwrap().size, 7);
        assert_eq!(node.downcast::<Leaf>().unwrap().size, 7);
        assert!(node.record_type().ends_with("Leaf"));
    }

    #[test]
    fn same_content_ignores_links_but_eq_does_not() {
        let plain = ConfigNode::new(Leaf {
            meta: ConfigMeta::new(ConfigTag::Simple, "pkg.Leaf"),
            size: 1,
        });
        let linked = ConfigNode::new(Leaf {
            meta: ConfigMeta::new(ConfigTag::Simple, "pkg.Leaf").with_link("leaves.one"),
            size: 1,
        });

        assert_ne!(plain, linked);
        assert!(plain.same_content(&linked));
    }
}
