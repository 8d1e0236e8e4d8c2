//! Deselection: choose which replica to drop when shrinking.

use tracing::debug;

use storgrid_core::{Candidate, NodeName};

use crate::ranking::rank_candidates;

/// Return the node holding the lowest-scoring used candidate.
///
/// Only the score is considered. Same/different property rules and
/// provider kinds are ignored, and `fixed_nodes` is accepted but not
/// consulted yet.
// TODO: skip `fixed_nodes` and re-check the replicas_on_same/different rules
// for the remaining set before returning a victim.
pub fn deselect(used: &[Candidate], fixed_nodes: &[NodeName]) -> Option<NodeName> {
    let victim = rank_candidates(used).pop()?;
    debug!(
        node = %victim.node,
        stor_pool = %victim.stor_pool,
        score = victim.score,
        fixed = fixed_nodes.len(),
        "deselecting lowest scoring storage pool"
    );
    Some(victim.node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use storgrid_core::ProviderKind;

    fn cand(node: &str, score: f64) -> Candidate {
        Candidate {
            stor_pool: "p".to_string(),
            node: node.to_string(),
            shared_name: None,
            provider_kind: ProviderKind::Zfs,
            score,
        }
    }

    #[test]
    fn empty_input_has_no_victim() {
        assert_eq!(deselect(&[], &[]), None);
    }

    #[test]
    fn picks_lowest_score() {
        let used = vec![cand("a", 4.0), cand("b", 1.5), cand("c", 9.0)];
        assert_eq!(deselect(&used, &[]).as_deref(), Some("b"));
    }

    #[test]
    fn lowest_tie_goes_to_last_enumerated() {
        let used = vec![cand("a", 1.0), cand("b", 3.0), cand("c", 1.0)];
        assert_eq!(deselect(&used, &[]).as_deref(), Some("c"));
    }

    #[test]
    fn fixed_nodes_are_not_consulted() {
        let used = vec![cand("a", 4.0), cand("b", 1.0)];
        let fixed = vec!["b".to_string()];
        assert_eq!(deselect(&used, &fixed).as_deref(), Some("b"));
    }
}
