//! Chains: linear source-to-effect paths extracted from the graph

use crate::diagnostics::Diagnostic;
use crate::error::NormalizeResult;
use crate::graph::{Node, Property, PropertyValue};
use crate::schema::{NodeCategory, NodeSchema, Stage, StructuralKind, DEFAULT_STAGE_PRIORITY};
use serde::{Deserialize, Serialize};

/// A node resolved against the schema
///
/// Resolution happens once after pruning; every later stage matches on
/// `category`, `stage` and `wraps` instead of consulting the schema.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainNode {
    pub id: String,
    pub node_type: String,
    /// `None` when the type is missing from the schema
    pub category: Option<NodeCategory>,
    pub stage: Option<Stage>,
    pub wraps: bool,
    /// Name emitted for this node when it heads an expression
    pub call: String,
    /// Property rendered as the call's argument when heading an expression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub argument: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<StructuralKind>,
    pub properties: Vec<Property>,
    /// Produced by collapse rather than taken from the graph
    #[serde(default)]
    pub synthetic: bool,
}

impl ChainNode {
    /// Resolve a graph node; unknown types fall back to default stage handling
    pub fn resolve(
        node: &Node,
        schema: &NodeSchema,
        pattern_key: &str,
    ) -> NormalizeResult<(Self, Option<Diagnostic>)> {
        let properties = node.pattern_properties(pattern_key)?;

        let resolved = match schema.get(&node.node_type) {
            Some(node_type) => (
                Self {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    category: Some(node_type.category),
                    stage: Some(node_type.execution.stage.clone()),
                    wraps: node_type.execution.wraps,
                    call: node_type.call_name().to_string(),
                    argument: node_type.argument.clone(),
                    kind: node_type.kind,
                    properties,
                    synthetic: false,
                },
                None,
            ),
            None => (
                Self {
                    id: node.id.clone(),
                    node_type: node.node_type.clone(),
                    category: None,
                    stage: None,
                    wraps: false,
                    call: node.node_type.clone(),
                    argument: None,
                    kind: None,
                    properties,
                    synthetic: false,
                },
                Some(Diagnostic::SchemaLookupMissing {
                    node: node.id.clone(),
                    node_type: node.node_type.clone(),
                }),
            ),
        };

        Ok(resolved)
    }

    pub fn priority(&self) -> u8 {
        self.stage
            .as_ref()
            .map(Stage::priority)
            .unwrap_or(DEFAULT_STAGE_PRIORITY)
    }

    pub fn is_source(&self) -> bool {
        self.category == Some(NodeCategory::Source)
    }

    pub fn is_structural(&self) -> bool {
        self.category == Some(NodeCategory::Structural)
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }

    /// Value of the declared argument property, if both exist
    pub fn argument_value(&self) -> Option<&PropertyValue> {
        self.argument
            .as_deref()
            .and_then(|name| self.property(name))
    }
}

/// Ordered `[head, effect, ...]`
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chain {
    pub nodes: Vec<ChainNode>,
}

impl Chain {
    pub fn new(nodes: Vec<ChainNode>) -> Self {
        Self { nodes }
    }

    pub fn head(&self) -> Option<&ChainNode> {
        self.nodes.first()
    }

    /// Every node after the head
    pub fn effects(&self) -> &[ChainNode] {
        self.nodes.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.nodes.iter().map(|n| n.id.as_str()).collect()
    }
}

/// A chain enclosed by its outermost wrapper
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WrappedChain {
    pub wrapper: ChainNode,
    /// Nodes up to and including the wrapper
    pub inner_chain: Chain,
    /// The wrapper followed by anything ranked after it
    pub outer_chain: Chain,
}

/// A chain as it leaves wrapper lifting
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum NormalizedChain {
    Plain(Chain),
    Wrapped(WrappedChain),
}

impl NormalizedChain {
    pub fn as_plain(&self) -> Option<&Chain> {
        match self {
            NormalizedChain::Plain(chain) => Some(chain),
            NormalizedChain::Wrapped(_) => None,
        }
    }

    pub fn as_wrapped(&self) -> Option<&WrappedChain> {
        match self {
            NormalizedChain::Plain(_) => None,
            NormalizedChain::Wrapped(wrapped) => Some(wrapped),
        }
    }
}
