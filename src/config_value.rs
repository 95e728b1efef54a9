//! Option values shared by the command line, the config files and the persisted run configuration
//!

use std::collections::BTreeMap;
use std::fmt;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use simple_error::{SimpleResult, bail};

/// A single option value
///
/// Serialized untagged so that each config section stays a flat key/value mapping.
///
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Flag(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<String>),
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Flag(x) => write!(f, "{x}"),
            Self::Int(x) => write!(f, "{x}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(x) => write!(f, "'{x}'"),
            Self::List(x) => write!(f, "[{}]", x.iter().map(|v| format!("'{v}'")).join(", ")),
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(x: bool) -> Self {
        Self::Flag(x)
    }
}

impl From<&str> for ConfigValue {
    fn from(x: &str) -> Self {
        Self::Text(x.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(x: String) -> Self {
        Self::Text(x)
    }
}

impl From<Vec<String>> for ConfigValue {
    fn from(x: Vec<String>) -> Self {
        Self::List(x)
    }
}

impl ConfigValue {
    /// Convert a value from a TOML config file
    ///
    /// Only scalars and arrays of strings can be represented in a flat config section.
    ///
    pub fn from_toml(key: &str, value: &toml::Value) -> SimpleResult<Self> {
        use toml::Value;
        Ok(match value {
            Value::Boolean(x) => Self::Flag(*x),
            Value::Integer(x) => Self::Int(*x),
            Value::Float(x) if x.is_finite() => Self::Float(*x),
            Value::Float(x) => bail!("Config key '{key}' has non-finite value '{x}'"),
            Value::String(x) => Self::Text(x.clone()),
            Value::Array(values) => {
                let mut list = Vec::new();
                for x in values {
                    match x {
                        Value::String(x) => list.push(x.clone()),
                        _ => bail!("Config key '{key}' must be a list of strings"),
                    }
                }
                Self::List(list)
            }
            _ => bail!("Config key '{key}' has an unsupported value type"),
        })
    }
}

/// Option key to value, as supplied by one configuration source
pub type RawOptionSet = BTreeMap<String, ConfigValue>;

/// A flat section of the persisted run configuration
pub type ConfigSection = BTreeMap<String, ConfigValue>;

/// All sections of the persisted run configuration, keyed on section name
pub type ConfigSections = BTreeMap<String, ConfigSection>;

/// Typed accessors which remove a key from an option set
///
/// Each accessor returns `None` when the key is absent, and an error when the value has a type
/// which can't be coerced to the requested one.
///
pub mod take {
    use super::*;

    pub fn text(options: &mut RawOptionSet, key: &str) -> SimpleResult<Option<String>> {
        Ok(match options.remove(key) {
            None => None,
            Some(ConfigValue::Text(x)) => Some(x),
            Some(ConfigValue::Int(x)) => Some(x.to_string()),
            Some(x) => bail!("Option '{key}' expects a single text value, found {x}"),
        })
    }

    pub fn flag(options: &mut RawOptionSet, key: &str) -> SimpleResult<Option<bool>> {
        Ok(match options.remove(key) {
            None => None,
            Some(ConfigValue::Flag(x)) => Some(x),
            Some(ConfigValue::Text(x)) => match x.to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => bail!("Option '{key}' expects a boolean value, found '{x}'"),
            },
            Some(x) => bail!("Option '{key}' expects a boolean value, found {x}"),
        })
    }

    pub fn int(options: &mut RawOptionSet, key: &str) -> SimpleResult<Option<i64>> {
        Ok(match options.remove(key) {
            None => None,
            Some(ConfigValue::Int(x)) => Some(x),
            Some(ConfigValue::Text(x)) => match x.trim().parse::<i64>() {
                Ok(x) => Some(x),
                Err(_) => bail!("Option '{key}' expects an integer value, found '{x}'"),
            },
            Some(x) => bail!("Option '{key}' expects an integer value, found {x}"),
        })
    }

    /// A single text value is accepted as a one-entry list
    pub fn list(options: &mut RawOptionSet, key: &str) -> SimpleResult<Option<Vec<String>>> {
        Ok(match options.remove(key) {
            None => None,
            Some(ConfigValue::List(x)) => Some(x),
            Some(ConfigValue::Text(x)) => Some(vec![x]),
            Some(x) => bail!("Option '{key}' expects a list of values, found {x}"),
        })
    }
}
