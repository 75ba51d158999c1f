//! Parameter sets and typed field extraction
//!
//! A [`Params`] bag holds the resolved fields of one node. Record shapes pull
//! typed values out of it through [`FromConfigValue`] and put them back for
//! the writer through [`ToConfigValue`]. Conversions are strict: integers do
//! not parse from strings and booleans do not parse from numbers. Floats accept
//! integer literals.

use crate::model::{ConfigNode, ConfigRecord};
use crate::value::ConfigValue;
use crate::{Error, Result};
use serde_json::{Number, Value};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;

/// The resolved fields of one configuration node, keyed by field name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Params {
    fields: BTreeMap<String, ConfigValue>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: impl ToConfigValue) -> Self {
        self.fields.insert(name.into(), value.to_config_value());
        self
    }

    /// Insert a field, returning the value it replaced.
    pub fn insert(&mut self, name: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        self.fields.insert(name.into(), value)
    }

    pub fn take(&mut self, name: &str) -> Option<ConfigValue> {
        self.fields.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.fields.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Field names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Remove and convert a field that must be present.
    pub fn required<T: FromConfigValue>(&mut self, name: &str) -> Result<T> {
        match self.fields.remove(name) {
            Some(value) => T::from_config_value(value).map_err(|e| e.at_field(name)),
            None => Err(Error::schema("missing required field").at_field(name)),
        }
    }

    /// Remove and convert a field that may be absent or `null`.
    pub fn optional<T: FromConfigValue>(&mut self, name: &str) -> Result<Option<T>> {
        match self.fields.remove(name) {
            None => Ok(None),
            Some(value) if value.is_null() => Ok(None),
            Some(value) => T::from_config_value(value)
                .map(Some)
                .map_err(|e| e.at_field(name)),
        }
    }

    /// Like [`Params::optional`], falling back to `T::default()`.
    pub fn or_default<T: FromConfigValue + Default>(&mut self, name: &str) -> Result<T> {
        self.optional(name).map(Option::unwrap_or_default)
    }

    /// Fail on the first field nobody consumed.
    pub fn deny_unknown(&self) -> Result<()> {
        match self.fields.keys().next() {
            Some(name) => Err(Error::schema("unexpected field").at_field(name)),
            None => Ok(()),
        }
    }

    pub fn into_inner(self) -> BTreeMap<String, ConfigValue> {
        self.fields
    }

    /// Compare two parameter sets, ignoring link provenance on nested nodes.
    pub fn same_content(&self, other: &Self) -> bool {
        ConfigValue::Map(self.fields.clone()).same_content(&ConfigValue::Map(other.fields.clone()))
    }
}

impl FromIterator<(String, ConfigValue)> for Params {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        Self {
            fields: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, ConfigValue);
    type IntoIter = std::collections::btree_map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

/// Conversion from a resolved value into a typed record field.
pub trait FromConfigValue: Sized {
    fn from_config_value(value: ConfigValue) -> Result<Self>;
}

/// Conversion from a typed record field back into a resolved value.
pub trait ToConfigValue {
    fn to_config_value(&self) -> ConfigValue;
}

fn mismatch(expected: &str, found: &ConfigValue) -> Error {
    Error::schema(format!("expected {expected}, found {}", found.type_name()))
}

impl FromConfigValue for ConfigValue {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        Ok(value)
    }
}

impl FromConfigValue for bool {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Scalar(Value::Bool(b)) => Ok(b),
            other => Err(mismatch("boolean", &other)),
        }
    }
}

impl FromConfigValue for String {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Scalar(Value::String(s)) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl FromConfigValue for PathBuf {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        String::from_config_value(value).map(PathBuf::from)
    }
}

fn integer(value: ConfigValue) -> Result<Number> {
    match value {
        ConfigValue::Scalar(Value::Number(n)) if !n.is_f64() => Ok(n),
        other => Err(mismatch("integer", &other)),
    }
}

macro_rules! impl_signed {
    ($($ty:ty),*) => {$(
        impl FromConfigValue for $ty {
            fn from_config_value(value: ConfigValue) -> Result<Self> {
                let n = integer(value)?;
                n.as_i64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| Error::schema(format!(
                        "integer {n} out of range for {}", stringify!($ty)
                    )))
            }
        }

        impl ToConfigValue for $ty {
            fn to_config_value(&self) -> ConfigValue {
                ConfigValue::Scalar(Value::from(*self))
            }
        }
    )*};
}

macro_rules! impl_unsigned {
    ($($ty:ty),*) => {$(
        impl FromConfigValue for $ty {
            fn from_config_value(value: ConfigValue) -> Result<Self> {
                let n = integer(value)?;
                n.as_u64()
                    .and_then(|v| <$ty>::try_from(v).ok())
                    .ok_or_else(|| Error::schema(format!(
                        "integer {n} out of range for {}", stringify!($ty)
                    )))
            }
        }

        impl ToConfigValue for $ty {
            fn to_config_value(&self) -> ConfigValue {
                ConfigValue::Scalar(Value::from(*self))
            }
        }
    )*};
}

impl_signed!(i8, i16, i32, i64);
impl_unsigned!(u8, u16, u32, u64, usize);

impl FromConfigValue for f64 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Scalar(Value::Number(n)) => n
                .as_f64()
                .ok_or_else(|| Error::schema(format!("number {n} is not representable as float"))),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl FromConfigValue for f32 {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        f64::from_config_value(value).map(|v| v as f32)
    }
}

impl FromConfigValue for Value {
    /// Plain JSON data; nested config nodes are rejected.
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        value
            .to_data()
            .ok_or_else(|| Error::schema("expected plain data, found a nested config node"))
    }
}

impl FromConfigValue for ConfigNode {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Node(node) => Ok(node),
            other => Err(mismatch("config node", &other)),
        }
    }
}

impl<T: ConfigRecord> FromConfigValue for Arc<T> {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        let node = ConfigNode::from_config_value(value)?;
        node.downcast::<T>().ok_or_else(|| {
            Error::schema(format!(
                "expected config of type {}, found '{}' ({})",
                std::any::type_name::<T>(),
                node.config_class(),
                node.record_type()
            ))
        })
    }
}

impl<T: FromConfigValue> FromConfigValue for Option<T> {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_config_value(value).map(Some)
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for Vec<T> {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::List(items) => items
                .into_iter()
                .enumerate()
                .map(|(index, item)| T::from_config_value(item).map_err(|e| e.at_index(index)))
                .collect(),
            other => Err(mismatch("list", &other)),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for BTreeMap<String, T> {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        match value {
            ConfigValue::Map(map) => map
                .into_iter()
                .map(|(key, item)| match T::from_config_value(item) {
                    Ok(converted) => Ok((key, converted)),
                    Err(e) => Err(e.at_field(&key)),
                })
                .collect(),
            other => Err(mismatch("mapping", &other)),
        }
    }
}

impl<T: FromConfigValue> FromConfigValue for HashMap<String, T> {
    fn from_config_value(value: ConfigValue) -> Result<Self> {
        BTreeMap::<String, T>::from_config_value(value).map(|map| map.into_iter().collect())
    }
}

impl ToConfigValue for ConfigValue {
    fn to_config_value(&self) -> ConfigValue {
        self.clone()
    }
}

impl ToConfigValue for bool {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Scalar(Value::Bool(*self))
    }
}

impl ToConfigValue for str {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Scalar(Value::String(self.to_string()))
    }
}

impl ToConfigValue for String {
    fn to_config_value(&self) -> ConfigValue {
        self.as_str().to_config_value()
    }
}

impl ToConfigValue for PathBuf {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Scalar(Value::String(self.to_string_lossy().into_owned()))
    }
}

impl ToConfigValue for f64 {
    /// Non-finite floats have no JSON form and become `null`.
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Scalar(Number::from_f64(*self).map_or(Value::Null, Value::Number))
    }
}

impl ToConfigValue for f32 {
    fn to_config_value(&self) -> ConfigValue {
        f64::from(*self).to_config_value()
    }
}

impl ToConfigValue for Value {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::from_data(self.clone())
    }
}

impl ToConfigValue for ConfigNode {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Node(self.clone())
    }
}

impl<T: ConfigRecord> ToConfigValue for Arc<T> {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Node(ConfigNode::from(Arc::clone(self)))
    }
}

impl<T: ToConfigValue> ToConfigValue for Option<T> {
    fn to_config_value(&self) -> ConfigValue {
        self.as_ref()
            .map_or_else(ConfigValue::null, ToConfigValue::to_config_value)
    }
}

impl<T: ToConfigValue> ToConfigValue for Vec<T> {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::List(self.iter().map(ToConfigValue::to_config_value).collect())
    }
}

impl<T: ToConfigValue> ToConfigValue for BTreeMap<String, T> {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Map(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_config_value()))
                .collect(),
        )
    }
}

impl<T: ToConfigValue> ToConfigValue for HashMap<String, T> {
    fn to_config_value(&self) -> ConfigValue {
        ConfigValue::Map(
            self.iter()
                .map(|(key, item)| (key.clone(), item.to_config_value()))
                .collect(),
        )
    }
}

impl<T: ToConfigValue + ?Sized> ToConfigValue for &T {
    fn to_config_value(&self) -> ConfigValue {
        (**self).to_config_value()
    }
}
