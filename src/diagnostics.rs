//! Recovered, non-fatal conditions reported alongside a successful result

use serde::{Deserialize, Serialize};
use std::fmt;

/// A condition the normalizer recovered from
///
/// Diagnostics never change whether normalization succeeds; they tell the
/// caller which parts of the graph did not make it into the code as drawn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// Node type missing from the schema; default stage priority and no wrapping
    SchemaLookupMissing { node: String, node_type: String },
    /// Connection endpoint names a node that is not in the graph
    DanglingConnection { source: String, target: String },
    /// Node feeds several targets; only `followed` was linearized
    FanOut {
        node: String,
        followed: Option<String>,
        skipped: Vec<String>,
    },
    /// Connected node that ended up in no chain
    StrandedNode { node: String },
    /// Chain starts at a node that is not a source
    HeadNotSource { node: String },
    /// Structural node with inputs that were not merged into its chain
    UnmergedInputs { node: String, inputs: usize },
    /// Chain head with pattern properties besides its argument; they are not rendered
    HeadPropertiesDropped {
        node: String,
        properties: Vec<String>,
    },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::SchemaLookupMissing { node, node_type } => write!(
                f,
                "Node '{}' has unknown type '{}'; using default stage",
                node, node_type
            ),
            Diagnostic::DanglingConnection { source, target } => write!(
                f,
                "Ignoring connection {} -> {}: endpoint not in graph",
                source, target
            ),
            Diagnostic::FanOut {
                node,
                followed,
                skipped,
            } => match followed {
                Some(next) => write!(
                    f,
                    "Node '{}' fans out; followed '{}', skipped {}",
                    node,
                    next,
                    skipped.join(", ")
                ),
                None => write!(
                    f,
                    "Node '{}' fans out; all targets already linearized ({})",
                    node,
                    skipped.join(", ")
                ),
            },
            Diagnostic::StrandedNode { node } => {
                write!(f, "Node '{}' is not reachable along any chain", node)
            }
            Diagnostic::HeadNotSource { node } => {
                write!(f, "Chain starts at '{}', which is not a source node", node)
            }
            Diagnostic::UnmergedInputs { node, inputs } => write!(
                f,
                "Structural node '{}' has {} inputs; only its own chain is rendered",
                node, inputs
            ),
            Diagnostic::HeadPropertiesDropped { node, properties } => write!(
                f,
                "Chain head '{}' renders only its argument; dropped {}",
                node,
                properties.join(", ")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serializes_with_kind_tag() {
        let diag = Diagnostic::StrandedNode {
            node: "hpf2".to_string(),
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "strandedNode");
        assert_eq!(json["node"], "hpf2");
    }

    #[test]
    fn test_fan_out_display() {
        let diag = Diagnostic::FanOut {
            node: "src".to_string(),
            followed: Some("a".to_string()),
            skipped: vec!["b".to_string(), "c".to_string()],
        };
        assert_eq!(diag.to_string(), "Node 'src' fans out; followed 'a', skipped b, c");
    }

    #[test]
    fn test_head_properties_dropped_serializes_property_names() {
        let diag = Diagnostic::HeadPropertiesDropped {
            node: "kick".to_string(),
            properties: vec!["gain".to_string()],
        };
        let json = serde_json::to_value(&diag).unwrap();
        assert_eq!(json["kind"], "headPropertiesDropped");
        assert_eq!(json["properties"][0], "gain");
        assert_eq!(diag.to_string(), "Chain head 'kick' renders only its argument; dropped gain");
    }
}
