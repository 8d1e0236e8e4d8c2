//! Existing deployment scanner.
//!
//! Before searching, the selector needs to know what a resource already
//! occupies: which nodes, how many diskful/diskless replicas count toward
//! the target, which shared backends and provider kinds are in use.

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::trace;

use storgrid_core::{
    MixingPolicy, NodeName, PlacementFilter, ProviderKind, ResourceSnapshot, SharedStorPoolName,
    VolumeRole,
};

use crate::error::{PlacementError, PlacementResult};

/// What a resource already occupies. Built fresh for every selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeploymentContext {
    /// Nodes that already host the resource, counted or not.
    pub already_used_nodes: BTreeSet<NodeName>,
    pub diskful_count: u32,
    pub diskless_count: u32,
    pub already_used_shared_names: BTreeSet<SharedStorPoolName>,
    /// Non-diskless kinds of the existing data volumes, with multiplicity.
    pub already_used_provider_kinds: Vec<ProviderKind>,
}

impl DeploymentContext {
    /// The replica count relevant for `filter` (diskless or diskful).
    pub fn existing_count(&self, filter: &PlacementFilter) -> u32 {
        if filter.is_diskless() {
            self.diskless_count
        } else {
            self.diskful_count
        }
    }
}

/// Build the [`DeploymentContext`] for `resource`.
///
/// Fails with [`PlacementError::InternalConsistency`] if the existing data
/// volumes already mix provider kinds that `mixing` forbids.
pub fn scan(
    resource: &ResourceSnapshot,
    filter: &PlacementFilter,
    mixing: &dyn MixingPolicy,
) -> PlacementResult<DeploymentContext> {
    let mut ctx = DeploymentContext::default();

    for rsc in &resource.deployed {
        if rsc.flags.deleting || rsc.flags.evicted {
            continue;
        }

        let counted = !filter.skips_node(&rsc.node)
            && !rsc.flags.evacuating
            && !rsc.node_evacuating;
        if counted {
            if rsc.flags.diskless {
                ctx.diskless_count += 1;
            } else {
                ctx.diskful_count += 1;
            }
        }
        // An uncounted replica still occupies its node.
        ctx.already_used_nodes.insert(rsc.node.clone());

        for vlm in rsc.volumes.iter().filter(|v| v.role == VolumeRole::Data) {
            if let Some(shared) = &vlm.shared_name {
                ctx.already_used_shared_names.insert(shared.clone());
            }
            if vlm.provider_kind.is_diskless() {
                continue;
            }
            if let Some(&existing) = ctx
                .already_used_provider_kinds
                .iter()
                .find(|&&k| !mixing.is_mixing_allowed(k, vlm.provider_kind))
            {
                return Err(PlacementError::InternalConsistency {
                    resource: resource.name.clone(),
                    existing,
                    found: vlm.provider_kind,
                });
            }
            ctx.already_used_provider_kinds.push(vlm.provider_kind);
        }
    }

    if ctx.already_used_nodes.is_empty() {
        trace!(resource = %resource.name, "resource not deployed yet");
    } else {
        trace!(
            resource = %resource.name,
            nodes = ?ctx.already_used_nodes,
            diskful = ctx.diskful_count,
            diskless = ctx.diskless_count,
            "resource already deployed"
        );
    }

    Ok(ctx)
}
