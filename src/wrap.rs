//! Stage 5: lift the outermost wrapper out of a chain
//!
//! The last wrapping node in chain order wins. Earlier wrappers stay in the
//! inner chain and render as ordinary effects.

use crate::chain::{Chain, NormalizedChain, WrappedChain};
use tracing::debug;

pub fn lift_wrappers(chain: Chain) -> NormalizedChain {
    // A wrapping head has nothing upstream to enclose
    let found = chain.nodes.iter().skip(1).rposition(|node| node.wraps);
    let position = match found {
        Some(offset) => offset + 1,
        None => return NormalizedChain::Plain(chain),
    };

    let mut inner = chain.nodes;
    let trailing = inner.split_off(position + 1);
    let wrapper = inner[position].clone();

    debug!(
        "Lifting wrapper '{}' over {} inner node(s)",
        wrapper.id,
        inner.len()
    );

    let mut outer = Vec::with_capacity(1 + trailing.len());
    outer.push(wrapper.clone());
    outer.extend(trailing);

    NormalizedChain::Wrapped(WrappedChain {
        wrapper,
        inner_chain: Chain::new(inner),
        outer_chain: Chain::new(outer),
    })
}
