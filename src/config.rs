//! Normalizer configuration: collapse rules, neutral values and policies
//!
//! The rule table is an explicit value handed to
//! [`Normalizer::new`](crate::normalizer::Normalizer::new). Configs load from
//! TOML or JSON:
//!
//! ```toml
//! pattern_key = "pattern"
//! fan_out = "warn"
//!
//! [rules.gain]
//! rule = "multiply"
//! neutral = 1.0
//!
//! [rules.pan]
//! rule = "last"
//! neutral = 0.0
//! ```
//!
//! A `[rules]` table in a file replaces the default table as a whole.

use crate::error::{ConfigError, ConfigResult};
use crate::graph::DEFAULT_PATTERN_KEY;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// How repeated occurrences of one property along a chain combine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CollapseRule {
    /// Numeric product, starting from 1
    Multiply,
    /// Later nodes win
    Last,
}

/// Collapse rule and neutral value for one property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PropertyRule {
    pub rule: CollapseRule,
    /// Value with no audible effect; dropped from the output once reached
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub neutral: Option<f64>,
}

impl PropertyRule {
    pub fn multiply(neutral: f64) -> Self {
        Self {
            rule: CollapseRule::Multiply,
            neutral: Some(neutral),
        }
    }

    pub fn last(neutral: f64) -> Self {
        Self {
            rule: CollapseRule::Last,
            neutral: Some(neutral),
        }
    }
}

/// Per-property collapse policy keyed by property name
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleTable {
    rules: BTreeMap<String, PropertyRule>,
}

impl RuleTable {
    /// A table with no rules; every property uses the default rule
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    pub fn with_rule(mut self, property: &str, rule: PropertyRule) -> Self {
        self.rules.insert(property.to_string(), rule);
        self
    }

    pub fn get(&self, property: &str) -> Option<&PropertyRule> {
        self.rules.get(property)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl Default for RuleTable {
    /// gain and speed multiply; pan, filters and delay keep the last value
    fn default() -> Self {
        Self::empty()
            .with_rule("gain", PropertyRule::multiply(1.0))
            .with_rule("speed", PropertyRule::multiply(1.0))
            .with_rule("pan", PropertyRule::last(0.0))
            .with_rule("delay", PropertyRule::last(0.0))
            .with_rule("lpf", PropertyRule::last(8000.0))
            .with_rule("hpf", PropertyRule::last(20.0))
            .with_rule("bpf", PropertyRule::last(1000.0))
    }
}

/// What linearization does with a node that feeds several targets
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FanOutPolicy {
    /// Follow the first edge and report the skipped branches
    #[default]
    Warn,
    /// Fail normalization
    Reject,
}

/// Immutable configuration held by a normalizer
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerConfig {
    /// Sub-mapping of node properties holding pattern properties
    pub pattern_key: String,
    pub fan_out: FanOutPolicy,
    /// Rule for properties absent from `rules`
    pub default_rule: CollapseRule,
    /// Tolerance when comparing against neutral values
    pub neutral_epsilon: f64,
    pub rules: RuleTable,
}

impl Default for NormalizerConfig {
    fn default() -> Self {
        Self {
            pattern_key: DEFAULT_PATTERN_KEY.to_string(),
            fan_out: FanOutPolicy::Warn,
            default_rule: CollapseRule::Last,
            neutral_epsilon: 1e-9,
            rules: RuleTable::default(),
        }
    }
}

impl NormalizerConfig {
    pub fn with_rules(mut self, rules: RuleTable) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_fan_out(mut self, policy: FanOutPolicy) -> Self {
        self.fan_out = policy;
        self
    }

    /// Load from a .toml or .json file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        load_document(path)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: None,
            message: e.to_string(),
        })
    }
}

/// Load a TOML or JSON document, picking the format from the extension
///
/// Files without an extension are tried as TOML first, then JSON.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> ConfigResult<T> {
    let content = std::fs::read_to_string(path)?;
    let with_path = |message: String| ConfigError::Parse {
        path: Some(path.to_path_buf()),
        message,
    };

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("toml") => toml::from_str(&content).map_err(|e| with_path(e.to_string())),
        Some("json") => serde_json::from_str(&content).map_err(|e| with_path(e.to_string())),
        None => parse_document(&content).map_err(|e| match e {
            ConfigError::Parse { message, .. } => with_path(message),
            other => other,
        }),
        Some(_) => Err(ConfigError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Parse TOML or JSON text
pub fn parse_document<T: DeserializeOwned>(content: &str) -> ConfigResult<T> {
    // Try TOML format first
    let toml_error = match toml::from_str(content) {
        Ok(value) => return Ok(value),
        Err(e) => e,
    };

    // Try JSON format
    serde_json::from_str(content).map_err(|json_error| ConfigError::Parse {
        path: None,
        message: format!("not TOML ({}) nor JSON ({})", toml_error, json_error),
    })
}
