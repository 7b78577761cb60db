//! Node schema: the read-only registry of node types
//!
//! The editor describes every node type it can place on the canvas with a
//! category, an execution stage and a `wraps` flag. The normalizer looks each
//! node up exactly once (see [`crate::chain::ChainNode::resolve`]) and works
//! with the resolved enum values from then on.

use crate::config::load_document;
use crate::error::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

/// Category of a node type
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeCategory {
    Source,
    Structural,
    Rhythmic,
    Pitch,
    Modulation,
    Spectral,
    Space,
    Wrapper,
}

/// Execution stage of a node type
///
/// Stage names outside the fixed priority table are kept as `Other` so they
/// survive a schema round-trip; they sort with the default priority.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Stage {
    Source,
    Structural,
    Rhythmic,
    Pitch,
    Modulation,
    Spectral,
    Space,
    Wrapper,
    Other(String),
}

/// Priority used for unknown stages and for nodes missing from the schema
pub const DEFAULT_STAGE_PRIORITY: u8 = 50;

impl Stage {
    /// Fixed ordinal that decides effect order within a chain
    pub fn priority(&self) -> u8 {
        match self {
            Stage::Source => 10,
            Stage::Structural => 20,
            Stage::Rhythmic => 30,
            Stage::Pitch => 40,
            Stage::Modulation => 50,
            Stage::Spectral => 60,
            Stage::Space => 70,
            Stage::Wrapper => 80,
            Stage::Other(_) => DEFAULT_STAGE_PRIORITY,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Stage::Source => "source",
            Stage::Structural => "structural",
            Stage::Rhythmic => "rhythmic",
            Stage::Pitch => "pitch",
            Stage::Modulation => "modulation",
            Stage::Spectral => "spectral",
            Stage::Space => "space",
            Stage::Wrapper => "wrapper",
            Stage::Other(name) => name,
        }
    }
}

impl From<String> for Stage {
    fn from(name: String) -> Self {
        match name.as_str() {
            "source" => Stage::Source,
            "structural" => Stage::Structural,
            "rhythmic" => Stage::Rhythmic,
            "pitch" => Stage::Pitch,
            "modulation" => Stage::Modulation,
            "spectral" => Stage::Spectral,
            "space" => Stage::Space,
            "wrapper" => Stage::Wrapper,
            _ => Stage::Other(name),
        }
    }
}

impl From<&str> for Stage {
    fn from(name: &str) -> Self {
        Stage::from(name.to_string())
    }
}

impl From<Stage> for String {
    fn from(stage: Stage) -> Self {
        stage.as_str().to_string()
    }
}

impl From<NodeCategory> for Stage {
    fn from(category: NodeCategory) -> Self {
        match category {
            NodeCategory::Source => Stage::Source,
            NodeCategory::Structural => Stage::Structural,
            NodeCategory::Rhythmic => Stage::Rhythmic,
            NodeCategory::Pitch => Stage::Pitch,
            NodeCategory::Modulation => Stage::Modulation,
            NodeCategory::Spectral => Stage::Spectral,
            NodeCategory::Space => Stage::Space,
            NodeCategory::Wrapper => Stage::Wrapper,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combinator kind of a structural node type
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StructuralKind {
    /// Layers inputs on top of each other
    Stack,
    /// Plays inputs one after another
    Sequence,
    #[default]
    Other,
}

/// How a node type executes within a chain
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Execution {
    pub stage: Stage,
    /// Encloses the upstream expression instead of chaining after it
    #[serde(default)]
    pub wraps: bool,
}

/// A node type as declared by the schema
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    /// Type name; filled from the schema key when omitted
    #[serde(default)]
    pub id: String,
    pub category: NodeCategory,
    pub execution: Execution,
    /// Function or transform name in the emitted code (defaults to `id`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call: Option<String>,
    /// Pattern property rendered as the call's argument when the node heads
    /// an expression (a source, or the outermost wrapper)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    /// Combinator kind; only meaningful for structural types
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StructuralKind>,
}

impl NodeType {
    /// Create a node type whose stage matches its category
    pub fn new(id: &str, category: NodeCategory) -> Self {
        Self {
            id: id.to_string(),
            category,
            execution: Execution {
                stage: Stage::from(category),
                wraps: category == NodeCategory::Wrapper,
            },
            call: None,
            argument: None,
            kind: None,
        }
    }

    pub fn with_stage(mut self, stage: impl Into<Stage>) -> Self {
        self.execution.stage = stage.into();
        self
    }

    pub fn with_wraps(mut self, wraps: bool) -> Self {
        self.execution.wraps = wraps;
        self
    }

    pub fn with_call(mut self, call: &str) -> Self {
        self.call = Some(call.to_string());
        self
    }

    pub fn with_argument(mut self, property: &str) -> Self {
        self.argument = Some(property.to_string());
        self
    }

    pub fn with_kind(mut self, kind: StructuralKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Name emitted for this type
    pub fn call_name(&self) -> &str {
        self.call.as_deref().unwrap_or(&self.id)
    }
}

/// Registry of node types keyed by type name
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeSchema {
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeType>,
}

impl NodeSchema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a node type under its own id
    pub fn with_type(mut self, node_type: NodeType) -> Self {
        self.insert(node_type);
        self
    }

    pub fn insert(&mut self, node_type: NodeType) {
        self.nodes.insert(node_type.id.clone(), node_type);
    }

    /// Look up a node type by name
    pub fn get(&self, type_name: &str) -> Option<&NodeType> {
        self.nodes.get(type_name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Load a schema from a .toml or .json file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let schema: NodeSchema = load_document(path)?;
        Ok(schema.with_keyed_ids())
    }

    /// Parse a schema from JSON text
    pub fn from_json_str(content: &str) -> serde_json::Result<Self> {
        let schema: NodeSchema = serde_json::from_str(content)?;
        Ok(schema.with_keyed_ids())
    }

    fn with_keyed_ids(mut self) -> Self {
        for (key, node_type) in self.nodes.iter_mut() {
            if node_type.id.is_empty() {
                node_type.id = key.clone();
            }
        }
        self
    }
}
