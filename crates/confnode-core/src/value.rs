//! Intermediate and resolved value trees
//!
//! Reading happens in two passes. [`RawValue::from_json`] classifies every
//! JSON value as a scalar, a tagged node, a config link, a list or a map; this
//! is the only place where tag and link shapes are sniffed. The reader then
//! lowers the raw tree into [`ConfigValue`], replacing nodes and links with
//! resolved [`ConfigNode`]s.

use crate::tag::{ConfigTag, KEY_CONFIG_CLASS, KEY_CONFIG_LINK, KEY_PARAMS, KEY_TARGET_CLASS};
use crate::{ConfigNode, Error, Result};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// A parsed but unresolved configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum RawValue {
    /// `null`, a boolean, a number or a string
    Scalar(Value),
    /// A tagged node envelope
    Node(RawNode),
    /// A `{"@CONFIG_LINK": "..."}` reference
    Link(String),
    List(Vec<RawValue>),
    Map(BTreeMap<String, RawValue>),
}

/// The body of a tagged node envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RawNode {
    pub tag: ConfigTag,
    pub config_class: String,
    /// Body keys other than `config_class` and `params`, `target_class`
    /// included. They join the parameter set under their own names.
    pub body: BTreeMap<String, Value>,
    pub params: BTreeMap<String, RawValue>,
}

impl RawValue {
    /// Classify a JSON value appearing inside `params`.
    ///
    /// A map whose only key is a tag is always a node and a map whose only
    /// key is `@CONFIG_LINK` is always a link. A map that mixes a tag or link
    /// key with other keys is rejected, since it cannot be told apart from a
    /// broken envelope.
    pub fn from_json(value: Value) -> Result<Self> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| Self::from_json(item).map_err(|e| e.at_index(index)))
                .collect::<Result<Vec<_>>>()
                .map(Self::List),
            Value::Object(map) => {
                if map.len() == 1 {
                    let key = map.keys().next().map(String::as_str).unwrap_or_default();
                    if ConfigTag::is_tag_key(key) {
                        return RawNode::from_envelope(Value::Object(map)).map(Self::Node);
                    }
                    if key == KEY_CONFIG_LINK {
                        return parse_link(map);
                    }
                } else if let Some(key) = map
                    .keys()
                    .find(|key| ConfigTag::is_tag_key(key) || key.as_str() == KEY_CONFIG_LINK)
                {
                    return Err(Error::schema(format!(
                        "'{key}' must be the only key of its mapping, found {} keys",
                        map.len()
                    )));
                }

                map.into_iter()
                    .map(|(key, item)| {
                        Self::from_json(item)
                            .map(|raw| (key.clone(), raw))
                            .map_err(|e| e.at_field(&key))
                    })
                    .collect::<Result<BTreeMap<_, _>>>()
                    .map(Self::Map)
            }
            scalar => Ok(Self::Scalar(scalar)),
        }
    }
}

fn parse_link(mut map: Map<String, Value>) -> Result<RawValue> {
    match map.remove(KEY_CONFIG_LINK) {
        Some(Value::String(link)) => Ok(RawValue::Link(link)),
        Some(other) => Err(Error::schema(format!(
            "{KEY_CONFIG_LINK} must be a string, found {}",
            json_type_name(&other)
        ))),
        None => Err(Error::schema(format!("missing {KEY_CONFIG_LINK}"))),
    }
}

impl RawNode {
    /// Parse a complete node envelope: `{ "<TAG>": { config_class, params, ... } }`.
    ///
    /// The envelope must hold exactly one key and that key must be a known tag.
    pub fn from_envelope(value: Value) -> Result<Self> {
        let Value::Object(envelope) = value else {
            return Err(Error::schema(format!(
                "expected a config node, found {}",
                json_type_name(&value)
            )));
        };

        let tag_keys: Vec<&String> = envelope.keys().filter(|k| ConfigTag::is_tag_key(k)).collect();
        match (tag_keys.len(), envelope.len()) {
            (1, 1) => {}
            (0, 1) => {
                let key = envelope.keys().next().map(String::as_str).unwrap_or_default();
                return Err(Error::schema(format!("unknown config tag '{key}'")));
            }
            (0, _) => {
                return Err(Error::schema(format!(
                    "expected exactly one config tag key, found none among {} keys",
                    envelope.len()
                )));
            }
            (1, _) => {
                return Err(Error::schema(
                    "a config tag must be the only key of its node".to_string(),
                ));
            }
            (count, _) => {
                return Err(Error::schema(format!(
                    "expected exactly one config tag key, found {count}"
                )));
            }
        }

        let (key, body) = envelope
            .into_iter()
            .next()
            .ok_or_else(|| Error::schema("empty config node"))?;
        let tag = ConfigTag::from_key(&key)
            .ok_or_else(|| Error::schema(format!("unknown config tag '{key}'")))?;

        Self::from_body(tag, body).map_err(|e| e.at_field(&key))
    }

    fn from_body(tag: ConfigTag, body: Value) -> Result<Self> {
        let Value::Object(mut body) = body else {
            return Err(Error::schema(format!(
                "node body must be a mapping, found {}",
                json_type_name(&body)
            )));
        };

        let config_class = match body.remove(KEY_CONFIG_CLASS) {
            Some(Value::String(class)) => class,
            Some(other) => {
                return Err(Error::schema(format!(
                    "must be a string, found {}",
                    json_type_name(&other)
                ))
                .at_field(KEY_CONFIG_CLASS));
            }
            None => return Err(Error::schema(format!("missing '{KEY_CONFIG_CLASS}'"))),
        };

        let params = match body.remove(KEY_PARAMS) {
            Some(Value::Object(params)) => params
                .into_iter()
                .map(|(name, value)| {
                    RawValue::from_json(value)
                        .map(|raw| (name.clone(), raw))
                        .map_err(|e| e.at_field(&name).at_field(KEY_PARAMS))
                })
                .collect::<Result<BTreeMap<_, _>>>()?,
            Some(Value::Null) | None => BTreeMap::new(),
            Some(other) => {
                return Err(Error::schema(format!(
                    "must be a mapping, found {}",
                    json_type_name(&other)
                ))
                .at_field(KEY_PARAMS));
            }
        };

        if let Some(target) = body.get(KEY_TARGET_CLASS) {
            if !target.is_string() {
                return Err(Error::schema(format!(
                    "must be a string, found {}",
                    json_type_name(target)
                ))
                .at_field(KEY_TARGET_CLASS));
            }
        }

        Ok(Self {
            tag,
            config_class,
            body: body.into_iter().collect(),
            params,
        })
    }
}

/// A fully resolved configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// `null`, a boolean, a number or a string
    Scalar(Value),
    /// A resolved configuration object
    Node(ConfigNode),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn null() -> Self {
        Self::Scalar(Value::Null)
    }

    /// Convert plain JSON data; arrays and objects become lists and maps.
    pub fn from_data(value: Value) -> Self {
        match value {
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_data).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(key, item)| (key, Self::from_data(item)))
                    .collect(),
            ),
            scalar => Self::Scalar(scalar),
        }
    }

    /// Convert back to plain JSON data, or `None` if a node is nested inside.
    pub fn to_data(&self) -> Option<Value> {
        match self {
            Self::Scalar(value) => Some(value.clone()),
            Self::Node(_) => None,
            Self::List(items) => items
                .iter()
                .map(Self::to_data)
                .collect::<Option<Vec<_>>>()
                .map(Value::Array),
            Self::Map(map) => map
                .iter()
                .map(|(key, item)| item.to_data().map(|data| (key.clone(), data)))
                .collect::<Option<Map<_, _>>>()
                .map(Value::Object),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Scalar(Value::Null))
    }

    pub fn as_node(&self) -> Option<&ConfigNode> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    /// Short description of the value's shape for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Scalar(value) => json_type_name(value),
            Self::Node(_) => "config node",
            Self::List(_) => "list",
            Self::Map(_) => "mapping",
        }
    }

    /// Compare two values, ignoring link provenance on every nested node.
    pub fn same_content(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Scalar(a), Self::Scalar(b)) => a == b,
            (Self::Node(a), Self::Node(b)) => a.same_content(b),
            (Self::List(a), Self::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_content(y))
            }
            (Self::Map(a), Self::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.same_content(vb))
            }
            _ => false,
        }
    }
}

impl From<ConfigNode> for ConfigValue {
    fn from(node: ConfigNode) -> Self {
        Self::Node(node)
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "mapping",
    }
}
