//! Input graph model: nodes, connections and pattern property values
//!
//! These are plain-old-data records handed over by the editor. The
//! normalizer only reads them; everything it derives lives in
//! [`crate::chain`].

use crate::error::{NormalizeError, NormalizeResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Sub-mapping of `Node::properties` that holds pattern-relevant properties
pub const DEFAULT_PATTERN_KEY: &str = "pattern";

/// A primitive pattern property value
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropertyValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PropertyValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Convert a JSON value; arrays, objects and null are not primitive
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(PropertyValue::Bool(*b)),
            Value::Number(n) => n.as_f64().map(PropertyValue::Number),
            Value::String(s) => Some(PropertyValue::Text(s.clone())),
            Value::Null | Value::Array(_) | Value::Object(_) => None,
        }
    }

    fn json_kind(value: &Value) -> &'static str {
        match value {
            Value::Null => "null",
            Value::Array(_) => "an array",
            Value::Object(_) => "an object",
            Value::Bool(_) => "a bool",
            Value::Number(_) => "a number",
            Value::String(_) => "a string",
        }
    }
}

impl From<f64> for PropertyValue {
    fn from(n: f64) -> Self {
        PropertyValue::Number(n)
    }
}

impl From<bool> for PropertyValue {
    fn from(b: bool) -> Self {
        PropertyValue::Bool(b)
    }
}

impl From<&str> for PropertyValue {
    fn from(s: &str) -> Self {
        PropertyValue::Text(s.to_string())
    }
}

/// Renders the value as a literal in the emitted pattern code
impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Bool(b) => write!(f, "{}", b),
            PropertyValue::Number(n) => write!(f, "{}", n),
            // JSON string escaping is valid in the pattern language too
            PropertyValue::Text(s) => match serde_json::to_string(s) {
                Ok(quoted) => f.write_str(&quoted),
                Err(_) => Err(fmt::Error),
            },
        }
    }
}

/// A named pattern property
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

impl Property {
    pub fn new(name: &str, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.to_string(),
            value: value.into(),
        }
    }
}

/// A node placed by the editor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    /// Type name, looked up in the node schema
    #[serde(rename = "type")]
    pub node_type: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Node {
    pub fn new(id: &str, node_type: &str) -> Self {
        Self {
            id: id.to_string(),
            node_type: node_type.to_string(),
            properties: Map::new(),
        }
    }

    /// Set a pattern property under [`DEFAULT_PATTERN_KEY`]
    pub fn with_property(mut self, name: &str, value: impl Into<Value>) -> Self {
        let pattern = self
            .properties
            .entry(DEFAULT_PATTERN_KEY)
            .or_insert_with(|| Value::Object(Map::new()));
        if let Value::Object(map) = pattern {
            map.insert(name.to_string(), value.into());
        }
        self
    }

    /// Extract the pattern properties stored under `key`
    ///
    /// A missing sub-mapping means the node has no pattern properties.
    /// Properties come back in key order.
    pub fn pattern_properties(&self, key: &str) -> NormalizeResult<Vec<Property>> {
        let map = match self.properties.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(NormalizeError::MalformedProperties {
                    node: self.id.clone(),
                    property: key.to_string(),
                    reason: format!(
                        "expected an object of pattern properties, found {}",
                        PropertyValue::json_kind(other)
                    ),
                })
            }
        };

        map.iter()
            .map(|(name, raw)| match PropertyValue::from_json(raw) {
                Some(value) => Ok(Property {
                    name: name.clone(),
                    value,
                }),
                None => Err(NormalizeError::MalformedProperties {
                    node: self.id.clone(),
                    property: name.clone(),
                    reason: format!(
                        "expected a number, string or bool, found {}",
                        PropertyValue::json_kind(raw)
                    ),
                }),
            })
            .collect()
    }
}

/// Directed edge: output of `source` feeds input of `target`
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    #[serde(alias = "sourceNodeId")]
    pub source: String,
    #[serde(alias = "targetNodeId")]
    pub target: String,
}

impl Connection {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.to_string(),
            target: target.to_string(),
        }
    }
}

/// A user-built patch graph
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_node(mut self, node: Node) -> Self {
        self.nodes.push(node);
        self
    }

    /// Add a connection from `source` to `target`
    pub fn connect(mut self, source: &str, target: &str) -> Self {
        self.connections.push(Connection::new(source, target));
        self
    }

    /// Connect the given node ids in sequence
    pub fn chain(mut self, ids: &[&str]) -> Self {
        for pair in ids.windows(2) {
            self.connections.push(Connection::new(pair[0], pair[1]));
        }
        self
    }

    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        serde_json::from_str(content)
    }
}
