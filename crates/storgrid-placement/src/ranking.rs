//! Candidate scoring and ordering.
//!
//! The search walks candidates best-first. Ordering is applied here, at
//! the point of sorting, rather than being baked into `Candidate`:
//! - score descending
//! - ties keep their original enumeration order (stable sort)
//! - non-finite scores are dropped

use std::cmp::Ordering;

use tracing::warn;

use storgrid_core::{Candidate, ScoreProvider, StorPoolInfo};

/// Score every pool with the external provider.
pub fn score_pools(pools: &[StorPoolInfo], scorer: &dyn ScoreProvider) -> Vec<Candidate> {
    pools
        .iter()
        .map(|pool| Candidate::from_scored(pool, scorer.score(pool)))
        .collect()
}

/// Comparator placing higher scores first.
pub fn by_score_desc(a: &Candidate, b: &Candidate) -> Ordering {
    b.score.total_cmp(&a.score)
}

/// Return the candidates in search order (best first).
pub fn rank_candidates(candidates: &[Candidate]) -> Vec<Candidate> {
    let mut ranked: Vec<Candidate> = candidates
        .iter()
        .filter(|c| {
            let finite = c.score.is_finite();
            if !finite {
                warn!(
                    node = %c.node,
                    stor_pool = %c.stor_pool,
                    score = c.score,
                    "ignoring candidate with non-finite score"
                );
            }
            finite
        })
        .cloned()
        .collect();

    // `sort_by` is stable, so equal scores keep enumeration order.
    ranked.sort_by(by_score_desc);
    ranked
}

#[cfg(test)]
mod tests {
    use super::*;
    use storgrid_core::ProviderKind;

    fn pool(node: &str, name: &str) -> StorPoolInfo {
        StorPoolInfo {
            stor_pool: name.to_string(),
            node: node.to_string(),
            shared_name: None,
            provider_kind: ProviderKind::Lvm,
        }
    }

    fn cand(node: &str, score: f64) -> Candidate {
        Candidate::from_scored(&pool(node, "p"), score)
    }

    #[test]
    fn scores_pools_with_provider() {
        let pools = vec![pool("a", "p1"), pool("b", "p2")];
        let scorer = |p: &StorPoolInfo| if p.node == "a" { 10.0 } else { 2.5 };

        let scored = score_pools(&pools, &scorer);

        assert_eq!(scored.len(), 2);
        assert_eq!(scored[0].score, 10.0);
        assert_eq!(scored[1].score, 2.5);
        assert_eq!(scored[1].stor_pool, "p2");
    }

    #[test]
    fn ranks_descending() {
        let ranked = rank_candidates(&[cand("a", 1.0), cand("b", 3.0), cand("c", 2.0)]);
        let nodes: Vec<&str> = ranked.iter().map(|c| c.node.as_str()).collect();
        assert_eq!(nodes, ["b", "c", "a"]);
    }

    #[test]
    fn ties_keep_enumeration_order() {
        let ranked = rank_candidates(&[
            cand("first", 5.0),
            cand("top", 7.0),
            cand("second", 5.0),
            cand("third", 5.0),
        ]);
        let nodes: Vec<&str> = ranked.iter().map(|c| c.node.as_str()).collect();
        assert_eq!(nodes, ["top", "first", "second", "third"]);
    }

    #[test]
    fn drops_non_finite_scores() {
        let ranked = rank_candidates(&[
            cand("a", f64::NAN),
            cand("b", 1.0),
            cand("c", f64::INFINITY),
        ]);
        assert_eq!(ranked.len(), 1);
        assert_eq!(ranked[0].node, "b");
    }
}
