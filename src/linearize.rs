//! Stage 2: linearize the pruned graph into chains
//!
//! Each root (a node without inputs) starts a chain. From there the walk is
//! greedy: at every node take the first outgoing connection whose target has
//! not been placed in a chain yet. Every node lands in at most one chain.

use crate::chain::{Chain, ChainNode};
use crate::config::{FanOutPolicy, NormalizerConfig};
use crate::diagnostics::Diagnostic;
use crate::error::{NormalizeError, NormalizeResult};
use crate::prune::PrunedGraph;
use crate::schema::NodeSchema;
use tracing::{debug, warn};

/// Walk the pruned graph and resolve each visited node against the schema
pub fn linearize_chains(
    pruned: &PrunedGraph<'_>,
    schema: &NodeSchema,
    config: &NormalizerConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizeResult<Vec<Chain>> {
    let mut processed = vec![false; pruned.len()];
    let mut paths: Vec<Vec<usize>> = Vec::new();

    for root in pruned.roots() {
        if processed[root] {
            continue;
        }

        let mut path = vec![root];
        processed[root] = true;
        let mut current = root;

        loop {
            let targets = distinct_targets(&pruned.outgoing[current]);
            let next = targets.iter().copied().find(|&t| !processed[t]);

            if targets.len() > 1 {
                report_fan_out(pruned, current, &targets, next, config, diagnostics)?;
            }

            match next {
                Some(next) => {
                    processed[next] = true;
                    path.push(next);
                    current = next;
                }
                None => break,
            }
        }

        paths.push(path);
    }

    for pos in (0..pruned.len()).filter(|&p| !processed[p]) {
        let node = pruned.node_id(pos);
        warn!("Node '{}' was not placed in any chain", node);
        diagnostics.push(Diagnostic::StrandedNode {
            node: node.to_string(),
        });
    }

    let mut chains = Vec::with_capacity(paths.len());
    for path in paths {
        let mut nodes = Vec::with_capacity(path.len());
        for pos in path {
            let node = &pruned.graph.nodes[pruned.nodes[pos]];
            let (resolved, missing) = ChainNode::resolve(node, schema, &config.pattern_key)?;
            if let Some(diag) = missing {
                warn!("{}", diag);
                diagnostics.push(diag);
            }
            nodes.push(resolved);
        }

        let chain = Chain::new(nodes);
        if let Some(head) = chain.head() {
            if !head.is_source() {
                diagnostics.push(Diagnostic::HeadNotSource {
                    node: head.id.clone(),
                });
            }
            if let Some(diag) = unrendered_head_properties(head) {
                warn!("{}", diag);
                diagnostics.push(diag);
            }
        }
        debug!("Linearized chain: {}", chain.ids().join(" -> "));
        chains.push(chain);
    }

    Ok(chains)
}

/// Head properties other than the call argument never reach the code
fn unrendered_head_properties(head: &ChainNode) -> Option<Diagnostic> {
    let dropped: Vec<String> = head
        .properties
        .iter()
        .filter(|p| head.argument.as_deref() != Some(p.name.as_str()))
        .map(|p| p.name.clone())
        .collect();
    if dropped.is_empty() {
        None
    } else {
        Some(Diagnostic::HeadPropertiesDropped {
            node: head.id.clone(),
            properties: dropped,
        })
    }
}

/// Targets in connection order with parallel edges folded together
fn distinct_targets(outgoing: &[usize]) -> Vec<usize> {
    let mut targets: Vec<usize> = Vec::with_capacity(outgoing.len());
    for &target in outgoing {
        if !targets.contains(&target) {
            targets.push(target);
        }
    }
    targets
}

fn report_fan_out(
    pruned: &PrunedGraph<'_>,
    node: usize,
    targets: &[usize],
    followed: Option<usize>,
    config: &NormalizerConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> NormalizeResult<()> {
    let id = pruned.node_id(node).to_string();

    if config.fan_out == FanOutPolicy::Reject {
        return Err(NormalizeError::FanOutRejected {
            node: id,
            targets: targets
                .iter()
                .map(|&t| pruned.node_id(t).to_string())
                .collect(),
        });
    }

    let skipped: Vec<String> = targets
        .iter()
        .filter(|&&t| Some(t) != followed)
        .map(|&t| pruned.node_id(t).to_string())
        .collect();

    let diag = Diagnostic::FanOut {
        node: id,
        followed: followed.map(|t| pruned.node_id(t).to_string()),
        skipped,
    };
    warn!("{}", diag);
    diagnostics.push(diag);
    Ok(())
}
