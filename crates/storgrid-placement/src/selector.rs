//! Selection engine: picks the best-scoring admissible set of storage pools.
//!
//! For start index `s = 0, 1, …` over the ranked candidates, a depth-first
//! search greedily builds exactly `required` admissible picks from
//! `candidates[s..]`, backtracking when a branch cannot be completed. Each
//! complete combination competes on summed score. Between attempts the
//! search stops when:
//! 1. fewer than `required` candidates remain after `s`
//! 2. the top `required` scores from `s` cannot beat the best so far
//! 3. an attempt finds no complete combination

use serde::Serialize;
use tracing::{debug, info, trace};

use storgrid_core::{
    Candidate, MixingPolicy, NodeName, PlacementFilter, PropertyAccess, ResourceSnapshot,
    ResourceStateAccess,
};

use crate::deselect;
use crate::error::PlacementResult;
use crate::ranking::rank_candidates;
use crate::scanner::{self, DeploymentContext};
use crate::tracker::ConstraintTracker;

/// Result of a successful selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selection {
    /// Newly chosen candidates, best first. Empty when nothing needs adding.
    pub candidates: Vec<Candidate>,
    /// Sum of the chosen candidates' scores.
    pub score: f64,
}

impl Selection {
    fn empty() -> Self {
        Self {
            candidates: Vec::new(),
            score: 0.0,
        }
    }

    fn from_picks(picks: &[&Candidate]) -> Self {
        Self {
            candidates: picks.iter().map(|&c| c.clone()).collect(),
            score: summed_score(picks),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &str> {
        self.candidates.iter().map(|c| c.node.as_str())
    }
}

/// Number of additional replicas to select.
///
/// `existing` is the diskful or diskless count, matching the filter.
pub fn resolve_replica_count(filter: &PlacementFilter, existing: u32) -> u32 {
    match (filter.replica_count, filter.additional_replica_count) {
        (Some(target), _) if target > existing => target - existing,
        (_, Some(additional)) if additional > 0 => additional,
        _ => 0,
    }
}

/// Placement engine entry point. Stateless between calls.
pub struct Selector<'a> {
    props: &'a dyn PropertyAccess,
    mixing: &'a dyn MixingPolicy,
    prune: bool,
}

impl<'a> Selector<'a> {
    pub fn new(props: &'a dyn PropertyAccess, mixing: &'a dyn MixingPolicy) -> Self {
        Self {
            props,
            mixing,
            prune: true,
        }
    }

    /// Disable the score upper-bound cut-off. Results are identical but
    /// every start index is tried, which is useful for verification.
    pub fn without_pruning(mut self) -> Self {
        self.prune = false;
        self
    }

    /// Choose the best admissible combination for `filter`.
    ///
    /// `resource` is `None` for a resource that has no definition yet.
    /// Returns `Ok(None)` when no combination of the required size exists.
    pub fn select(
        &self,
        filter: &PlacementFilter,
        resource: Option<&ResourceSnapshot>,
        candidates: &[Candidate],
    ) -> PlacementResult<Option<Selection>> {
        let ranked = rank_candidates(candidates);
        for c in &ranked {
            trace!(score = c.score, stor_pool = %c.stor_pool, node = %c.node, "candidate");
        }

        let ctx = match resource {
            Some(rsc) => scanner::scan(rsc, filter, self.mixing)?,
            None => DeploymentContext::default(),
        };

        let required = resolve_replica_count(filter, ctx.existing_count(filter)) as usize;
        if required == 0 {
            debug!("replica count already satisfied, nothing to select");
            return Ok(Some(Selection::empty()));
        }
        debug!(required, candidates = ranked.len(), "starting selection");

        let mut tracker = ConstraintTracker::new(filter, &ctx, self.props, self.mixing)?;
        let best = self.search(&mut tracker, &ranked, required)?;

        match &best {
            Some(selection) => info!(
                nodes = ?selection.nodes().collect::<Vec<_>>(),
                score = selection.score,
                "selected storage pools"
            ),
            None => info!(required, "no feasible selection"),
        }
        Ok(best)
    }

    /// Like [`Self::select`], but reads the resource through `state`.
    pub fn select_for(
        &self,
        filter: &PlacementFilter,
        resource: &str,
        state: &dyn ResourceStateAccess,
        candidates: &[Candidate],
    ) -> PlacementResult<Option<Selection>> {
        let snapshot = state.resource(resource)?;
        self.select(filter, snapshot.as_ref(), candidates)
    }

    /// Choose the node to drop a replica from. See [`deselect::deselect`].
    pub fn deselect(&self, used: &[Candidate], fixed_nodes: &[NodeName]) -> Option<NodeName> {
        deselect::deselect(used, fixed_nodes)
    }

    fn search<'c>(
        &self,
        tracker: &mut ConstraintTracker<'c>,
        ranked: &'c [Candidate],
        required: usize,
    ) -> PlacementResult<Option<Selection>> {
        let mut best: Option<Selection> = None;
        let mut start = 0;

        loop {
            if ranked.len().saturating_sub(start) < required {
                trace!(start, "not enough remaining storage pools, search finished");
                break;
            }

            tracker.reset()?;
            if !complete_from(tracker, ranked, start, required)? {
                trace!(start, "no more candidates found");
                break;
            }

            let current = Selection::from_picks(tracker.selection());
            let described = describe(&current.candidates);
            let best_score = best.as_ref().map_or(f64::NEG_INFINITY, |b| b.score);
            if current.score > best_score {
                trace!(combination = %described, score = current.score, "found combination");
                best = Some(current);
            } else {
                trace!(
                    combination = %described,
                    score = current.score,
                    best = best_score,
                    "skipping combination, score not higher than best"
                );
            }

            start += 1;
            if self.prune && start + required <= ranked.len() {
                // Ignores every constraint: only a best-case bound.
                let bound: f64 = ranked[start..start + required].iter().map(|c| c.score).sum();
                let best_score = best.as_ref().map_or(f64::NEG_INFINITY, |b| b.score);
                if bound <= best_score {
                    trace!(
                        start,
                        bound,
                        best = best_score,
                        "remaining combinations cannot score higher, search finished"
                    );
                    break;
                }
                trace!(start, bound, "continuing search for better candidates");
            }
        }

        Ok(best)
    }
}

/// Depth-first search for `required` picks among `ranked[from..]`.
///
/// On `Ok(true)` the tracker holds a complete selection; on `Ok(false)`
/// every pick made here has been undone.
fn complete_from<'c>(
    tracker: &mut ConstraintTracker<'c>,
    ranked: &'c [Candidate],
    from: usize,
    required: usize,
) -> PlacementResult<bool> {
    for (idx, candidate) in ranked.iter().enumerate().skip(from) {
        if !tracker.admissible(candidate)? {
            continue;
        }
        tracker.select(candidate)?;
        if tracker.len() == required || complete_from(tracker, ranked, idx + 1, required)? {
            return Ok(true);
        }
        tracker.unselect(candidate)?;
    }
    Ok(tracker.len() == required)
}

fn summed_score(picks: &[&Candidate]) -> f64 {
    picks.iter().map(|c| c.score).sum()
}

fn describe(candidates: &[Candidate]) -> String {
    candidates
        .iter()
        .map(|c| format!("{}@{} ({})", c.stor_pool, c.node, c.score))
        .collect::<Vec<_>>()
        .join(", ")
}
