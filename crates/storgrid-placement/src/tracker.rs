//! Constraint tracking for one selection search.
//!
//! The tracker answers "may this candidate join the current selection?"
//! and keeps its bookkeeping consistent while the search adds and removes
//! candidates. Property maps are rebuilt from the remaining selection on
//! every removal instead of being patched: removing a node can change
//! which node fixed a same-property value.

use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;

use storgrid_core::{
    Candidate, MixingPolicy, NodeName, PlacementFilter, PropertyAccess, ProviderKind,
    SharedStorPoolName,
};

use crate::error::PlacementResult;
use crate::scanner::DeploymentContext;

/// Incremental constraint state, owned by a single search.
pub struct ConstraintTracker<'a> {
    filter: &'a PlacementFilter,
    ctx: &'a DeploymentContext,
    props: &'a dyn PropertyAccess,
    mixing: &'a dyn MixingPolicy,
    /// Kinds every selection starts with and must keep.
    seed_kinds: Vec<ProviderKind>,

    selected_nodes: BTreeSet<NodeName>,
    selected_shared_names: BTreeSet<SharedStorPoolName>,
    selected_kinds: Vec<ProviderKind>,
    selection: Vec<&'a Candidate>,

    /// key → value all selected nodes must expose (`None` = not fixed yet).
    same_props: BTreeMap<String, Option<String>>,
    /// key → values already claimed by selected nodes.
    diff_props: BTreeMap<String, Vec<String>>,
}

impl<'a> ConstraintTracker<'a> {
    /// Create a tracker already reset to the deployment context.
    pub fn new(
        filter: &'a PlacementFilter,
        ctx: &'a DeploymentContext,
        props: &'a dyn PropertyAccess,
        mixing: &'a dyn MixingPolicy,
    ) -> PlacementResult<Self> {
        let seed_kinds = if filter.is_diskless() {
            vec![ProviderKind::Diskless]
        } else {
            ctx.already_used_provider_kinds.clone()
        };

        let mut tracker = Self {
            filter,
            ctx,
            props,
            mixing,
            seed_kinds,
            selected_nodes: BTreeSet::new(),
            selected_shared_names: BTreeSet::new(),
            selected_kinds: Vec::new(),
            selection: Vec::new(),
            same_props: BTreeMap::new(),
            diff_props: BTreeMap::new(),
        };
        tracker.reset()?;
        Ok(tracker)
    }

    /// Drop the current selection and start over from the existing deployment.
    pub fn reset(&mut self) -> PlacementResult<()> {
        self.selected_nodes = self.ctx.already_used_nodes.clone();
        self.selected_shared_names = self.ctx.already_used_shared_names.clone();
        self.selected_kinds = self.seed_kinds.clone();
        self.selection.clear();
        self.rebuild_prop_maps()
    }

    /// Newly selected candidates, in selection order.
    pub fn selection(&self) -> &[&'a Candidate] {
        &self.selection
    }

    pub fn len(&self) -> usize {
        self.selection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selection.is_empty()
    }

    /// Whether `candidate` can be added without breaking any constraint.
    pub fn admissible(&self, candidate: &Candidate) -> PlacementResult<bool> {
        if self.selected_nodes.contains(&candidate.node) {
            trace!(
                node = %candidate.node,
                stor_pool = %candidate.stor_pool,
                "rejected: node already holds a selected storage pool"
            );
            return Ok(false);
        }
        if let Some(shared) = &candidate.shared_name {
            if self.selected_shared_names.contains(shared) {
                trace!(
                    node = %candidate.node,
                    stor_pool = %candidate.stor_pool,
                    shared_name = %shared,
                    "rejected: shared backend already selected"
                );
                return Ok(false);
            }
        }
        if let Some(kind) = self
            .selected_kinds
            .iter()
            .find(|&&k| !self.mixing.is_mixing_allowed(candidate.provider_kind, k))
        {
            trace!(
                node = %candidate.node,
                stor_pool = %candidate.stor_pool,
                kind = %candidate.provider_kind,
                selected_kind = %kind,
                "rejected: provider kind cannot mix with selection"
            );
            return Ok(false);
        }

        for (key, expected) in &self.same_props {
            let Some(expected) = expected else { continue };
            let actual = self.props.node_prop(&candidate.node, key)?;
            if actual.as_deref() != Some(expected.as_str()) {
                trace!(
                    node = %candidate.node,
                    stor_pool = %candidate.stor_pool,
                    key = %key,
                    actual = ?actual,
                    expected = %expected,
                    "rejected: property differs from selected nodes"
                );
                return Ok(false);
            }
        }

        for (key, seen) in &self.diff_props {
            let Some(actual) = self.props.node_prop(&candidate.node, key)? else {
                continue;
            };
            if seen.contains(&actual) {
                trace!(
                    node = %candidate.node,
                    stor_pool = %candidate.stor_pool,
                    key = %key,
                    value = %actual,
                    "rejected: property value already taken by selection"
                );
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Add `candidate` to the selection. Caller checks [`Self::admissible`] first.
    pub fn select(&mut self, candidate: &'a Candidate) -> PlacementResult<()> {
        trace!(
            node = %candidate.node,
            stor_pool = %candidate.stor_pool,
            score = candidate.score,
            "adding storage pool to selection"
        );

        // The first selected node exposing a same-property fixes its value.
        for (key, expected) in self.same_props.iter_mut() {
            if expected.is_none() {
                *expected = self.props.node_prop(&candidate.node, key)?;
            }
        }
        for (key, seen) in self.diff_props.iter_mut() {
            if let Some(value) = self.props.node_prop(&candidate.node, key)? {
                seen.push(value);
            }
        }

        self.selected_nodes.insert(candidate.node.clone());
        if let Some(shared) = &candidate.shared_name {
            self.selected_shared_names.insert(shared.clone());
        }
        self.selected_kinds.push(candidate.provider_kind);
        self.selection.push(candidate);
        Ok(())
    }

    /// Remove `candidate` and recompute the property maps from what remains.
    pub fn unselect(&mut self, candidate: &Candidate) -> PlacementResult<()> {
        trace!(
            node = %candidate.node,
            stor_pool = %candidate.stor_pool,
            "removing storage pool from selection"
        );

        self.selection.retain(|c| !c.same_placement(candidate));
        self.selected_nodes.remove(&candidate.node);
        if let Some(shared) = &candidate.shared_name {
            self.selected_shared_names.remove(shared);
        }
        if let Some(pos) = self
            .selected_kinds
            .iter()
            .rposition(|&k| k == candidate.provider_kind)
        {
            self.selected_kinds.remove(pos);
        }
        debug_assert!(
            self.seed_kinds.iter().all(|k| self.selected_kinds.contains(k)),
            "selection lost a provider kind required by existing replicas"
        );

        self.rebuild_prop_maps()
    }

    fn rebuild_prop_maps(&mut self) -> PlacementResult<()> {
        let filter = self.filter;

        self.same_props.clear();
        for rule in &filter.replicas_on_same {
            let expected = match &rule.value {
                Some(value) => Some(value.clone()),
                None => self.first_selected_value(&rule.key)?,
            };
            self.same_props.insert(rule.key.clone(), expected);
        }

        self.diff_props.clear();
        for rule in &filter.replicas_on_different {
            let mut seen: Vec<String> = rule.value.iter().cloned().collect();
            for node in &self.selected_nodes {
                if let Some(value) = self.props.node_prop(node, &rule.key)? {
                    seen.push(value);
                }
            }
            self.diff_props.insert(rule.key.clone(), seen);
        }
        Ok(())
    }

    fn first_selected_value(&self, key: &str) -> PlacementResult<Option<String>> {
        for node in &self.selected_nodes {
            if let Some(value) = self.props.node_prop(node, key)? {
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storgrid_core::{DefaultMixingPolicy, PropRule, StaticCluster};

    use crate::error::PlacementError;

    fn cand(node: &str, pool: &str, kind: ProviderKind, shared: Option<&str>) -> Candidate {
        Candidate {
            stor_pool: pool.to_string(),
            node: node.to_string(),
            shared_name: shared.map(str::to_string),
            provider_kind: kind,
            score: 1.0,
        }
    }

    fn lvm(node: &str) -> Candidate {
        cand(node, "pool", ProviderKind::Lvm, None)
    }

    #[test]
    fn reset_seeds_existing_deployment() {
        let ctx = DeploymentContext {
            already_used_nodes: ["a".to_string()].into(),
            already_used_shared_names: ["san".to_string()].into(),
            already_used_provider_kinds: vec![ProviderKind::Lvm],
            ..Default::default()
        };
        let filter = PlacementFilter::default();
        let cluster = StaticCluster::new();
        let tracker = ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        assert!(!tracker.admissible(&lvm("a")).unwrap());
        assert!(!tracker
            .admissible(&cand("b", "p", ProviderKind::Lvm, Some("san")))
            .unwrap());
        assert!(!tracker
            .admissible(&cand("b", "p", ProviderKind::Zfs, None))
            .unwrap());
        assert!(tracker.admissible(&lvm("b")).unwrap());
        assert!(tracker.is_empty());
    }

    #[test]
    fn one_pool_per_node() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter::default();
        let cluster = StaticCluster::new();
        let mut tracker =
            ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        let first = lvm("a");
        let second = cand("a", "other", ProviderKind::Lvm, None);
        tracker.select(&first).unwrap();

        assert!(!tracker.admissible(&second).unwrap());
        tracker.unselect(&first).unwrap();
        assert!(tracker.admissible(&second).unwrap());
    }

    #[test]
    fn same_prop_fixed_by_first_exposing_node() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter {
            replicas_on_same: vec![PropRule::key("site")],
            ..Default::default()
        };
        let cluster = StaticCluster::new()
            .with_prop("b", "site", "berlin")
            .with_prop("c", "site", "vienna")
            .with_prop("d", "site", "berlin");
        let mut tracker =
            ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        // A node without the property leaves the expectation open.
        let a = lvm("a");
        tracker.select(&a).unwrap();
        assert!(tracker.admissible(&lvm("c")).unwrap());

        let b = lvm("b");
        tracker.select(&b).unwrap();
        assert!(!tracker.admissible(&lvm("c")).unwrap());
        assert!(tracker.admissible(&lvm("d")).unwrap());
        // Once fixed, nodes lacking the property are rejected.
        assert!(!tracker.admissible(&lvm("e")).unwrap());
    }

    #[test]
    fn unselect_releases_same_prop_expectation() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter {
            replicas_on_same: vec![PropRule::key("site")],
            ..Default::default()
        };
        let cluster = StaticCluster::new()
            .with_prop("a", "site", "berlin")
            .with_prop("b", "site", "vienna");
        let mut tracker =
            ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        let a = lvm("a");
        tracker.select(&a).unwrap();
        assert!(!tracker.admissible(&lvm("b")).unwrap());

        tracker.unselect(&a).unwrap();
        assert!(tracker.admissible(&lvm("b")).unwrap());
    }

    #[test]
    fn valued_same_rule_is_fixed_from_start() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter {
            replicas_on_same: vec![PropRule::with_value("site", "berlin")],
            ..Default::default()
        };
        let cluster = StaticCluster::new()
            .with_prop("a", "site", "berlin")
            .with_prop("b", "site", "vienna");
        let tracker = ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        assert!(tracker.admissible(&lvm("a")).unwrap());
        assert!(!tracker.admissible(&lvm("b")).unwrap());
    }

    #[test]
    fn different_prop_values_are_exclusive() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter {
            replicas_on_different: vec![PropRule::key("rack"), PropRule::with_value("zone", "z9")],
            ..Default::default()
        };
        let cluster = StaticCluster::new()
            .with_prop("a", "rack", "r1")
            .with_prop("b", "rack", "r1")
            .with_prop("c", "rack", "r2")
            .with_prop("d", "zone", "z9");
        let mut tracker =
            ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        // Pre-seeded value excludes `d` before anything is selected.
        assert!(!tracker.admissible(&lvm("d")).unwrap());

        let a = lvm("a");
        tracker.select(&a).unwrap();
        assert!(!tracker.admissible(&lvm("b")).unwrap());
        assert!(tracker.admissible(&lvm("c")).unwrap());
        // Nodes without the property are unconstrained.
        assert!(tracker.admissible(&lvm("e")).unwrap());

        tracker.unselect(&a).unwrap();
        assert!(tracker.admissible(&lvm("b")).unwrap());
        assert!(!tracker.admissible(&lvm("d")).unwrap());
    }

    #[test]
    fn existing_nodes_constrain_properties() {
        let ctx = DeploymentContext {
            already_used_nodes: ["a".to_string()].into(),
            ..Default::default()
        };
        let filter = PlacementFilter {
            replicas_on_different: vec![PropRule::key("rack")],
            ..Default::default()
        };
        let cluster = StaticCluster::new()
            .with_prop("a", "rack", "r1")
            .with_prop("b", "rack", "r1");
        let tracker = ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        assert!(!tracker.admissible(&lvm("b")).unwrap());
    }

    #[test]
    fn unselect_keeps_existing_kinds() {
        let ctx = DeploymentContext {
            already_used_provider_kinds: vec![ProviderKind::Lvm],
            ..Default::default()
        };
        let filter = PlacementFilter::default();
        let cluster = StaticCluster::new();
        let mut tracker =
            ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        let thin = cand("b", "thin", ProviderKind::LvmThin, None);
        let thick = lvm("c");
        tracker.select(&thin).unwrap();
        tracker.select(&thick).unwrap();
        tracker.unselect(&thick).unwrap();
        tracker.unselect(&thin).unwrap();

        // Existing LVM still rules out ZFS.
        assert!(!tracker
            .admissible(&cand("d", "p", ProviderKind::Zfs, None))
            .unwrap());
    }

    #[test]
    fn diskless_selection_seeds_diskless_kind() {
        let ctx = DeploymentContext {
            already_used_provider_kinds: vec![ProviderKind::Lvm],
            ..Default::default()
        };
        let filter = PlacementFilter {
            diskless_type: Some(storgrid_core::DisklessType::Drbd),
            ..Default::default()
        };
        let cluster = StaticCluster::new();
        let tracker = ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        assert!(tracker
            .admissible(&cand("b", "dl", ProviderKind::Diskless, None))
            .unwrap());
    }

    #[test]
    fn access_denied_propagates() {
        let ctx = DeploymentContext::default();
        let filter = PlacementFilter {
            replicas_on_different: vec![PropRule::key("secret")],
            ..Default::default()
        };
        let cluster = StaticCluster::new().deny_prop("secret");

        // Nothing is selected yet, so no property is read during reset.
        let tracker = ConstraintTracker::new(&filter, &ctx, &cluster, &DefaultMixingPolicy).unwrap();

        let err = tracker.admissible(&lvm("a")).unwrap_err();
        assert!(matches!(err, PlacementError::AccessDenied(_)));
    }
}
