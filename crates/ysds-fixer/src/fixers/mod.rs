//! `YSDS/*` fixer implementations
//!
//! Every fixer works on a [`Tokens`] sequence of one file. Fixers hold no
//! state; their options are read from the [`FixerConfig`] of each run.

pub mod arrays;
pub mod ban_types;
pub mod php_unit_assert_same;
mod registry;
pub mod replace_strings;
pub mod variable_never_read;

pub use registry::{FixerInfo, FixerRegistry};

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use ysds_core::{EditError, Tokens};

/// Problems with the options a fixer was configured with
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Option `{option}` must be {expected}")]
    InvalidType { option: String, expected: &'static str },

    #[error("Invalid regular expression `{pattern}`: {reason}")]
    InvalidRegex { pattern: String, reason: String },

    #[error("Invalid filter condition: {0}")]
    InvalidFilter(String),
}

/// Errors returned while running fixers
#[derive(Debug, Error)]
pub enum FixerError {
    #[error("Rule {rule}: {source}")]
    Config {
        rule: String,
        #[source]
        source: ConfigError,
    },

    #[error("Failed to apply changes of {rule}: {source}")]
    Edit {
        rule: String,
        #[source]
        source: EditError,
    },
}

/// Configuration value types for fixer options
///
/// Mirrors what a PHP array literal or a TOML table can express.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Bool(bool),
    Number(i64),
    String(String),
    List(Vec<ConfigValue>),
    Map(BTreeMap<String, ConfigValue>),
}

impl ConfigValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Scalar rendered as text, used for map keys and regex arguments
    pub fn to_text(&self) -> Option<String> {
        match self {
            ConfigValue::String(s) => Some(s.clone()),
            ConfigValue::Number(n) => Some(n.to_string()),
            ConfigValue::Bool(b) => Some(b.to_string()),
            ConfigValue::List(_) | ConfigValue::Map(_) => None,
        }
    }
}

/// Options passed to one fixer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FixerConfig {
    pub options: HashMap<String, ConfigValue>,
}

impl FixerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_option(mut self, name: impl Into<String>, value: ConfigValue) -> Self {
        self.options.insert(name.into(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&ConfigValue> {
        self.options.get(name)
    }

    pub fn bool_or(&self, name: &str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.as_bool().ok_or_else(|| invalid(name, "a boolean")),
        }
    }

    pub fn string_or(&self, name: &str, default: &str) -> Result<String, ConfigError> {
        match self.get(name) {
            None => Ok(default.to_string()),
            Some(value) => value.as_str().map(str::to_string).ok_or_else(|| invalid(name, "a string")),
        }
    }

    pub fn number_or(&self, name: &str, default: i64) -> Result<i64, ConfigError> {
        match self.get(name) {
            None => Ok(default),
            Some(value) => value.as_i64().ok_or_else(|| invalid(name, "an integer")),
        }
    }

    /// List of strings, empty when the option is missing
    pub fn string_list(&self, name: &str) -> Result<Vec<String>, ConfigError> {
        let Some(value) = self.get(name) else {
            return Ok(Vec::new());
        };
        let items: Vec<&ConfigValue> = match value {
            ConfigValue::List(items) => items.iter().collect(),
            // PHP arrays with explicit keys
            ConfigValue::Map(map) => map.values().collect(),
            _ => return Err(invalid(name, "a list of strings")),
        };
        items
            .into_iter()
            .map(|item| item.as_str().map(str::to_string).ok_or_else(|| invalid(name, "a list of strings")))
            .collect()
    }

    /// String to string map, empty when the option is missing
    pub fn string_map(&self, name: &str) -> Result<BTreeMap<String, String>, ConfigError> {
        match self.get(name) {
            None => Ok(BTreeMap::new()),
            Some(ConfigValue::Map(map)) => map
                .iter()
                .map(|(key, value)| {
                    value
                        .to_text()
                        .map(|text| (key.clone(), text))
                        .ok_or_else(|| invalid(name, "a map of strings"))
                })
                .collect(),
            Some(ConfigValue::List(items)) if items.is_empty() => Ok(BTreeMap::new()),
            Some(_) => Err(invalid(name, "a map of strings")),
        }
    }
}

fn invalid(option: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidType {
        option: option.to_string(),
        expected,
    }
}

/// A rule that inspects and rewrites the tokens of a PHP file
pub trait Fixer: Send + Sync {
    /// Internal name for this fixer
    fn name(&self) -> &'static str;

    /// PHP-CS-Fixer rule name (`YSDS/...`)
    fn php_cs_fixer_name(&self) -> &'static str;

    /// Human-readable description
    fn description(&self) -> &'static str;

    /// Execution priority (higher = runs first)
    fn priority(&self) -> i32 {
        0
    }

    /// Whether this fixer makes risky changes
    fn is_risky(&self) -> bool {
        false
    }

    /// Cheap check whether `fix` can change anything
    fn is_candidate(&self, tokens: &Tokens) -> bool;

    /// Rewrite `tokens` in place
    fn fix(&self, tokens: &mut Tokens, config: &FixerConfig) -> Result<(), ConfigError>;

    /// Get configurable options for this fixer
    fn options(&self) -> Vec<FixerOption> {
        vec![]
    }
}

/// A configurable option for a fixer
#[derive(Debug, Clone)]
pub struct FixerOption {
    pub name: &'static str,
    pub description: &'static str,
    pub option_type: OptionType,
    pub default: Option<ConfigValue>,
}

/// Type of a fixer option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionType {
    Bool,
    String,
    Number,
    StringArray,
    StringMap,
    /// List of `[subject, operator, argument]` triples
    Filter,
}
