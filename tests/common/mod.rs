//! Shared fixtures for the integration tests
#![allow(dead_code)]

use patchcode::graph::{Graph, Node};
use patchcode::schema::StructuralKind;
use patchcode::{NodeCategory, NodeSchema, NodeType, Normalizer};

/// Schema of a small strudel-flavoured node palette
pub fn palette() -> NodeSchema {
    NodeSchema::new()
        .with_type(
            NodeType::new("drums", NodeCategory::Source)
                .with_call("s")
                .with_argument("sound"),
        )
        .with_type(
            NodeType::new("synth", NodeCategory::Source)
                .with_call("note")
                .with_argument("notes"),
        )
        .with_type(
            NodeType::new("stack", NodeCategory::Structural).with_kind(StructuralKind::Stack),
        )
        .with_type(NodeType::new("fast", NodeCategory::Rhythmic))
        .with_type(NodeType::new("transpose", NodeCategory::Pitch))
        .with_type(NodeType::new("gain", NodeCategory::Modulation))
        .with_type(NodeType::new("pan", NodeCategory::Modulation))
        .with_type(NodeType::new("lpf", NodeCategory::Spectral))
        .with_type(NodeType::new("hpf", NodeCategory::Spectral))
        .with_type(NodeType::new("room", NodeCategory::Space))
        .with_type(NodeType::new("delay", NodeCategory::Space))
        .with_type(NodeType::new("jux", NodeCategory::Wrapper).with_argument("jux"))
        .with_type(NodeType::new("chop", NodeCategory::Wrapper).with_argument("chop"))
}

pub fn normalizer() -> Normalizer {
    Normalizer::with_schema(palette())
}

pub fn kick() -> Node {
    Node::new("kick", "drums").with_property("sound", "bd*2 sd")
}

/// kick → gain(g) as a complete graph
pub fn kick_with_gain(g: f64) -> Graph {
    Graph::new()
        .with_node(kick())
        .with_node(Node::new("g", "gain").with_property("gain", g))
        .connect("kick", "g")
}
