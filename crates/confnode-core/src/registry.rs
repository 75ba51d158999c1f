//! Type registry keyed by dotted type names
//!
//! Dotted names such as `confnode.demo.ToolConfig` are split on the last `.`
//! into a namespace (`confnode.demo`) and an identifier (`ToolConfig`). Two
//! kinds of types live in the registry:
//!
//! - **config shapes**, record types a node body is parsed into, registered
//!   with [`TypeRegistry::register_config`];
//! - **target types**, domain types built from an object config, registered
//!   with [`TypeRegistry::register_target`].
//!
//! Registering a name twice replaces the earlier entry. Lookups always see
//! the latest registration.

use crate::model::{ConfigMeta, ConfigNode, ConfigRecord};
use crate::params::Params;
use crate::tag::ConfigTag;
use crate::value::ConfigValue;
use crate::{BoxError, Error, Result};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A constructed instance of a registered type.
pub type Instance = Box<dyn Any + Send>;

type ShapeBuilder = fn(ConfigMeta, &mut Params) -> Result<ConfigNode>;
type TargetFn =
    Arc<dyn Fn(&ConfigNode, Params) -> std::result::Result<Instance, BoxError> + Send + Sync>;

/// Split a dotted type name into namespace and identifier.
pub fn split_type_name(name: &str) -> Result<(&str, &str)> {
    match name.rsplit_once('.') {
        Some((namespace, ident)) if !namespace.is_empty() && !ident.is_empty() => {
            Ok((namespace, ident))
        }
        _ => Err(Error::type_resolution(
            name,
            "expected a dotted name of the form '<namespace>.<identifier>'",
        )),
    }
}

/// A record shape nodes can be parsed into.
#[derive(Clone)]
pub struct ConfigShape {
    name: String,
    tag: ConfigTag,
    deny_unknown: bool,
    record_type: &'static str,
    build: ShapeBuilder,
}

fn build_record<T: ConfigRecord>(meta: ConfigMeta, params: &mut Params) -> Result<ConfigNode> {
    T::from_params(meta, params).map(ConfigNode::new)
}

impl ConfigShape {
    fn of<T: ConfigRecord>(name: String) -> Self {
        Self {
            name,
            tag: T::TAG,
            deny_unknown: T::DENY_UNKNOWN_FIELDS,
            record_type: std::any::type_name::<T>(),
            build: build_record::<T>,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The tag nodes of this shape must carry.
    pub fn tag(&self) -> ConfigTag {
        self.tag
    }

    /// Rust type name of the record.
    pub fn record_type(&self) -> &'static str {
        self.record_type
    }

    /// Build a record from a full parameter set, metadata fields included.
    ///
    /// Every failure here is a schema validation error.
    pub fn construct(&self, mut params: Params) -> Result<ConfigNode> {
        let meta = ConfigMeta::take_from(&mut params)?;
        if meta.tag() != self.tag {
            return Err(Error::schema(format!(
                "'{}' is a {} shape but the node is tagged {}",
                self.name,
                self.tag,
                meta.tag()
            )));
        }

        let node = (self.build)(meta, &mut params)?;
        if self.deny_unknown {
            params.deny_unknown()?;
        }
        tracing::trace!(config_class = %self.name, record = self.record_type, "Constructed config");
        Ok(node)
    }
}

impl fmt::Debug for ConfigShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigShape")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("deny_unknown", &self.deny_unknown)
            .field("record_type", &self.record_type)
            .finish()
    }
}

/// A domain type built from an object config.
///
/// Besides its constructor a target type may expose named type-level
/// methods, for example a `load` that restores an instance from a checkpoint
/// instead of building a fresh one.
#[derive(Clone)]
pub struct TargetType {
    name: String,
    config_type: &'static str,
    constructor: TargetFn,
    methods: BTreeMap<String, TargetFn>,
}

fn typed_target<C, T, E, F>(f: F) -> TargetFn
where
    C: ConfigRecord,
    T: Send + 'static,
    E: Into<BoxError>,
    F: Fn(&C, Params) -> std::result::Result<T, E> + Send + Sync + 'static,
{
    Arc::new(move |node: &ConfigNode, args: Params| -> std::result::Result<Instance, BoxError> {
        let config = node.downcast_ref::<C>().ok_or_else(|| {
            BoxError::from(format!(
                "expected config of type {}, found '{}' ({})",
                std::any::type_name::<C>(),
                node.config_class(),
                node.record_type()
            ))
        })?;
        f(config, args)
            .map(|instance| Box::new(instance) as Instance)
            .map_err(Into::into)
    })
}

impl TargetType {
    /// A target type built by `constructor` from its config record `C`.
    ///
    /// The name is assigned when the type is registered.
    pub fn new<C, T, E, F>(constructor: F) -> Self
    where
        C: ConfigRecord,
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&C) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        Self {
            name: String::new(),
            config_type: std::any::type_name::<C>(),
            constructor: typed_target(move |config: &C, _args: Params| constructor(config)),
            methods: BTreeMap::new(),
        }
    }

    /// Add a named type-level method taking the config and named arguments.
    pub fn with_method<C, T, E, F>(mut self, method: impl Into<String>, f: F) -> Self
    where
        C: ConfigRecord,
        T: Send + 'static,
        E: Into<BoxError>,
        F: Fn(&C, Params) -> std::result::Result<T, E> + Send + Sync + 'static,
    {
        self.methods.insert(method.into(), typed_target(f));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rust type name of the config record the constructor expects.
    pub fn config_type(&self) -> &'static str {
        self.config_type
    }

    pub fn has_method(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }

    /// Names of the type-level methods, sorted.
    pub fn methods(&self) -> Vec<&str> {
        self.methods.keys().map(String::as_str).collect()
    }

    /// Build an instance from `config`.
    pub fn construct(&self, config: &ConfigNode) -> Result<Instance> {
        tracing::debug!(
            target_class = %self.name,
            config_class = config.config_class(),
            "Instantiating"
        );
        (self.constructor)(config, Params::new())
            .map_err(|source| Error::type_construction(&self.name, source))
    }

    /// Invoke the type-level method `method` with `config` and named arguments.
    pub fn call(&self, method: &str, config: &ConfigNode, args: Params) -> Result<Instance> {
        let f = self.methods.get(method).ok_or_else(|| Error::UnknownMethod {
            name: self.name.clone(),
            method: method.to_string(),
        })?;
        tracing::debug!(target_class = %self.name, method, "Calling type-level method");
        f(config, args).map_err(|source| Error::type_construction(&self.name, source))
    }

    /// Like [`TargetType::call`], downcasting the result to `T`.
    pub fn call_as<T: 'static>(
        &self,
        method: &str,
        config: &ConfigNode,
        args: Params,
    ) -> Result<T> {
        let instance = self.call(method, config, args)?;
        downcast_instance(&self.name, instance)
    }
}

impl fmt::Debug for TargetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TargetType")
            .field("name", &self.name)
            .field("config_type", &self.config_type)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

pub(crate) fn downcast_instance<T: 'static>(name: &str, instance: Instance) -> Result<T> {
    instance.downcast::<T>().map(|boxed| *boxed).map_err(|_| {
        Error::type_construction(
            name,
            format!("instance is not a {}", std::any::type_name::<T>()),
        )
    })
}

#[derive(Debug, Clone)]
enum Registered {
    Config(ConfigShape),
    Target(TargetType),
}

/// A resolved registry entry.
#[derive(Debug, Clone, Copy)]
pub enum TypeHandle<'a> {
    Config(&'a ConfigShape),
    Target(&'a TargetType),
}

impl<'a> TypeHandle<'a> {
    pub fn name(&self) -> &'a str {
        match self {
            Self::Config(shape) => shape.name(),
            Self::Target(target) => target.name(),
        }
    }

    pub fn as_config(&self) -> Option<&'a ConfigShape> {
        match self {
            Self::Config(shape) => Some(shape),
            Self::Target(_) => None,
        }
    }

    pub fn as_target(&self) -> Option<&'a TargetType> {
        match self {
            Self::Target(target) => Some(target),
            Self::Config(_) => None,
        }
    }
}

/// Registry of config shapes and target types keyed by dotted names.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    namespaces: BTreeMap<String, BTreeMap<String, Registered>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the record shape `T` under `name`.
    pub fn register_config<T: ConfigRecord>(&mut self, name: &str) -> Result<&mut Self> {
        self.insert(name, Registered::Config(ConfigShape::of::<T>(name.to_string())))?;
        Ok(self)
    }

    /// Register a target type under `name`.
    pub fn register_target(&mut self, name: &str, mut target: TargetType) -> Result<&mut Self> {
        target.name = name.to_string();
        self.insert(name, Registered::Target(target))?;
        Ok(self)
    }

    fn insert(&mut self, name: &str, entry: Registered) -> Result<()> {
        let (namespace, ident) = split_type_name(name)?;
        let previous = self
            .namespaces
            .entry(namespace.to_string())
            .or_default()
            .insert(ident.to_string(), entry);
        if previous.is_some() {
            tracing::warn!(name, "Type re-registered, replacing previous entry");
        }
        Ok(())
    }

    /// Resolve a dotted name.
    ///
    /// Fails when the name is malformed, the namespace is unknown, or the
    /// identifier is absent from it.
    pub fn resolve(&self, name: &str) -> Result<TypeHandle<'_>> {
        let (namespace, ident) = split_type_name(name)?;
        let types = self.namespaces.get(namespace).ok_or_else(|| {
            Error::type_resolution(name, format!("namespace '{namespace}' is not registered"))
        })?;
        match types.get(ident) {
            Some(Registered::Config(shape)) => Ok(TypeHandle::Config(shape)),
            Some(Registered::Target(target)) => Ok(TypeHandle::Target(target)),
            None => Err(Error::type_resolution(
                name,
                format!("'{ident}' not found in namespace '{namespace}'"),
            )),
        }
    }

    /// Resolve a dotted name that must be a config shape.
    pub fn resolve_config(&self, name: &str) -> Result<&ConfigShape> {
        self.resolve(name)?
            .as_config()
            .ok_or_else(|| {
                Error::type_resolution(name, "registered as a target type, not a config shape")
            })
    }

    /// Resolve a dotted name that must be a target type.
    pub fn resolve_target(&self, name: &str) -> Result<&TargetType> {
        self.resolve(name)?
            .as_target()
            .ok_or_else(|| {
                Error::type_resolution(name, "registered as a config shape, not a target type")
            })
    }

    /// Construct the type registered under `name` from named fields.
    ///
    /// A config shape takes the node's full parameter set and yields a
    /// [`ConfigNode`]. A target type takes exactly one field, `config`.
    pub fn construct(&self, name: &str, mut fields: Params) -> Result<Instance> {
        match self.resolve(name)? {
            TypeHandle::Config(shape) => {
                shape.construct(fields).map(|node| Box::new(node) as Instance)
            }
            TypeHandle::Target(target) => {
                let config = match fields.take("config") {
                    Some(ConfigValue::Node(node)) => node,
                    Some(other) => {
                        return Err(Error::type_construction(
                            name,
                            format!(
                                "argument 'config' must be a config node, found {}",
                                other.type_name()
                            ),
                        ));
                    }
                    None => {
                        return Err(Error::type_construction(name, "missing argument 'config'"));
                    }
                };
                if let Some(extra) = fields.keys().next() {
                    return Err(Error::type_construction(
                        name,
                        format!("unexpected argument '{extra}'"),
                    ));
                }
                target.construct(&config)
            }
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_ok()
    }

    pub fn len(&self) -> usize {
        self.namespaces.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All registered dotted names, sorted.
    pub fn list(&self) -> Vec<String> {
        self.namespaces
            .iter()
            .flat_map(|(namespace, types)| {
                types.keys().map(move |ident| format!("{namespace}.{ident}"))
            })
            .collect()
    }
}
