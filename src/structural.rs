//! Stage 3: structural merge resolution
//!
//! Structural nodes (stack, sequence and similar combinators) can take
//! several inputs. Their [`StructuralKind`] comes from the schema and is
//! dispatched to a [`MergeStrategy`]; the only strategy today is
//! pass-through, which leaves the node in its chain unchanged. Inputs that were not merged are reported so the caller can
//! tell the rendered code is missing them.

use crate::chain::{Chain, ChainNode};
use crate::diagnostics::Diagnostic;
use crate::prune::PrunedGraph;
use crate::schema::StructuralKind;
use tracing::debug;

/// Kind of a resolved node; structural types without a declared kind are `Other`
pub fn kind_of(node: &ChainNode) -> StructuralKind {
    node.kind.unwrap_or_default()
}

/// Merge strategy for each combinator kind
pub fn strategy(kind: StructuralKind) -> MergeStrategy {
    match kind {
        StructuralKind::Stack | StructuralKind::Sequence | StructuralKind::Other => {
            MergeStrategy::PassThrough
        }
    }
}

/// How a structural node's inputs are combined into its chain
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Keep the node as an ordinary chain member
    PassThrough,
}

/// Apply the merge strategy of every structural node in every chain
pub fn resolve_structural_merges(
    chains: Vec<Chain>,
    pruned: &PrunedGraph<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Chain> {
    chains
        .into_iter()
        .map(|chain| resolve_chain(chain, pruned, diagnostics))
        .collect()
}

fn resolve_chain(
    chain: Chain,
    pruned: &PrunedGraph<'_>,
    diagnostics: &mut Vec<Diagnostic>,
) -> Chain {
    for node in chain.nodes.iter().filter(|n| n.is_structural()) {
        let kind = kind_of(node);
        match strategy(kind) {
            MergeStrategy::PassThrough => {
                let inputs = incoming_count(pruned, &node.id);
                debug!(
                    "Structural node '{}' ({:?}) passes through with {} input(s)",
                    node.id, kind, inputs
                );
                if inputs > 1 {
                    diagnostics.push(Diagnostic::UnmergedInputs {
                        node: node.id.clone(),
                        inputs,
                    });
                }
            }
        }
    }
    chain
}

fn incoming_count(pruned: &PrunedGraph<'_>, id: &str) -> usize {
    (0..pruned.len())
        .find(|&pos| pruned.node_id(pos) == id)
        .map(|pos| pruned.incoming[pos])
        .unwrap_or(0)
}
