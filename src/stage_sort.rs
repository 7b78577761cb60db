//! Stage 4: order effects by execution stage
//!
//! The head stays first. Effects are stable-sorted by stage priority, so
//! effects of the same stage keep the order they were connected in and the
//! result does not depend on the order they were placed in the editor.

use crate::chain::Chain;

pub fn sort_effects_by_stage(mut chain: Chain) -> Chain {
    if chain.len() > 2 {
        // slice::sort_by_key is stable
        chain.nodes[1..].sort_by_key(|node| node.priority());
    }
    chain
}
