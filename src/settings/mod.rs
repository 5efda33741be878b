//! Setting values and the settings-store surface.
//!
//! The real settings store (file parsing, section handling) lives with an
//! external collaborator; this module defines the value type and the lookup
//! trait the pipeline needs, plus an in-memory reference store used by the
//! binary and the tests.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A resolved configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl SettingValue {
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SettingValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            SettingValue::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Quoted form used by the debug transcript: strings are shown in
    /// single quotes, everything else as-is.
    #[must_use]
    pub fn repr(&self) -> String {
        match self {
            SettingValue::Str(value) => format!("'{value}'"),
            other => other.to_string(),
        }
    }
}

impl fmt::Display for SettingValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingValue::Bool(value) => write!(f, "{value}"),
            SettingValue::Int(value) => write!(f, "{value}"),
            SettingValue::Float(value) => write!(f, "{value}"),
            SettingValue::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<f64> for SettingValue {
    fn from(value: f64) -> Self {
        SettingValue::Float(value)
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Str(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Str(value)
    }
}

/// Lookup surface of the settings-store collaborator.
pub trait SettingsStore {
    /// Whether the parameter was explicitly set by the user.
    fn contains(&self, name: &str) -> bool;

    /// Resolved value for an explicitly set parameter.
    fn get(&self, name: &str) -> Option<SettingValue>;
}

/// In-memory settings store.
#[derive(Debug, Default, Clone)]
pub struct MapSettings {
    values: BTreeMap<String, SettingValue>,
}

impl MapSettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<SettingValue>) -> &mut Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl SettingsStore for MapSettings {
    fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    fn get(&self, name: &str) -> Option<SettingValue> {
        self.values.get(name).cloned()
    }
}
