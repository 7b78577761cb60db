//! # Patchcode - patch graph to pattern code compiler
//!
//! Patchcode takes the node graph a user wires up in a visual patch editor
//! (sound sources feeding chains of effects) and compiles it into one
//! canonical pattern expression. The same graph always produces the same
//! text, no matter in which order the nodes were dropped onto the canvas.
//!
//! ## Quick Start
//!
//! ```rust
//! use patchcode::graph::{Graph, Node};
//! use patchcode::normalizer::Normalizer;
//! use patchcode::schema::{NodeCategory, NodeSchema, NodeType};
//!
//! let schema = NodeSchema::new()
//!     .with_type(
//!         NodeType::new("drums", NodeCategory::Source)
//!             .with_call("s")
//!             .with_argument("sound"),
//!     )
//!     .with_type(NodeType::new("lpf", NodeCategory::Spectral))
//!     .with_type(NodeType::new("gain", NodeCategory::Modulation));
//!
//! // Effects connected in "wrong" order: filter before gain
//! let graph = Graph::new()
//!     .with_node(Node::new("kick", "drums").with_property("sound", "bd*4"))
//!     .with_node(Node::new("filter", "lpf").with_property("lpf", 900.0))
//!     .with_node(Node::new("level", "gain").with_property("gain", 0.8))
//!     .chain(&["kick", "filter", "level"]);
//!
//! let result = Normalizer::with_schema(schema).normalize_graph(&graph);
//! assert!(result.success);
//! assert_eq!(result.code, r#"s("bd*4").gain(0.8).lpf(900)"#);
//! ```
//!
//! ## Pipeline
//!
//! 1. [`prune`] - drop unconnected nodes, reject cycles
//! 2. [`linearize`] - walk each source into a chain
//! 3. [`structural`] - merge strategies for stack/sequence nodes
//! 4. [`stage_sort`] - order effects by execution stage
//! 5. [`wrap`] - lift the outermost wrapper
//! 6. [`collapse`] - fold repeated properties, drop neutral values
//! 7. [`emit`] - render the expression tree
//!
//! [`normalizer::Normalizer`] runs all of them; configuration lives in
//! [`config`] and the node type registry in [`schema`].

pub mod chain;
pub mod collapse;
pub mod config;
pub mod diagnostics;
pub mod emit;
pub mod error;
pub mod graph;
pub mod linearize;
pub mod normalizer;
pub mod prune;
pub mod schema;
pub mod stage_sort;
pub mod structural;
pub mod wrap;

pub use config::NormalizerConfig;
pub use error::{ConfigError, NormalizeError};
pub use graph::{Connection, Graph, Node};
pub use normalizer::{NormalizationResult, Normalizer};
pub use schema::{NodeCategory, NodeSchema, NodeType};
