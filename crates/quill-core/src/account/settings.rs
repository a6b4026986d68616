// quill/quill-core
//
// Copyright: 2026, Jonas Reinhardt <jr@quill-im.dev>
// License: Mozilla Public License v2.0 (MPL v2.0)

use indexmap::IndexMap;
use tracing::warn;

/// Setting keys recognised by the core. Protocols may define additional
/// keys; the core stores them as opaque typed values.
pub mod keys {
    pub const REMEMBER_PASSWORD: &str = "remember_password";
    pub const ENABLED: &str = "enabled";
    pub const PROXY: &str = "proxy";
    pub const USE_PROXY: &str = "useproxy";
}

#[derive(Debug, Clone, PartialEq)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

/// A string-keyed map of typed per-account settings.
///
/// Typed getters return the type's default when the key is absent and warn
/// (returning the default) when the stored value has a different type.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountSettings {
    values: IndexMap<String, SettingValue>,
}

impl AccountSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: SettingValue) {
        self.values.insert(key.into(), value);
    }

    pub fn set_bool(&mut self, key: impl Into<String>, value: bool) {
        self.set(key, SettingValue::Bool(value));
    }

    pub fn set_int(&mut self, key: impl Into<String>, value: i64) {
        self.set(key, SettingValue::Int(value));
    }

    pub fn set_string(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.set(key, SettingValue::Str(value.into()));
    }

    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<SettingValue> {
        self.values.shift_remove(key)
    }

    pub fn bool(&self, key: &str) -> bool {
        match self.values.get(key) {
            None => false,
            Some(SettingValue::Bool(value)) => *value,
            Some(other) => {
                warn!(key, ?other, "setting has unexpected type, expected bool");
                false
            }
        }
    }

    pub fn int(&self, key: &str) -> i64 {
        match self.values.get(key) {
            None => 0,
            Some(SettingValue::Int(value)) => *value,
            Some(other) => {
                warn!(key, ?other, "setting has unexpected type, expected int");
                0
            }
        }
    }

    pub fn string(&self, key: &str) -> Option<&str> {
        match self.values.get(key) {
            None => None,
            Some(SettingValue::Str(value)) => Some(value),
            Some(other) => {
                warn!(key, ?other, "setting has unexpected type, expected string");
                None
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SettingValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
