//! Domain types shared by the placement engine and its callers.
//!
//! Candidates arrive pre-scored; deployed resources describe what already
//! exists in the cluster for the resource being placed.

use serde::{Deserialize, Serialize};

use crate::kinds::ProviderKind;

/// Unique name of a node in the cluster.
pub type NodeName = String;

/// Name of a storage pool (unique per node).
pub type StorPoolName = String;

/// Group key for pools that are the same physical backend.
pub type SharedStorPoolName = String;

/// Name of a resource definition.
pub type ResourceName = String;

// ── Storage pools ─────────────────────────────────────────────────

/// An unscored storage pool on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorPoolInfo {
    pub stor_pool: StorPoolName,
    pub node: NodeName,
    /// Pools exposing the same physical backend share this name.
    #[serde(default)]
    pub shared_name: Option<SharedStorPoolName>,
    pub provider_kind: ProviderKind,
}

/// A scored storage pool placement option.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub stor_pool: StorPoolName,
    pub node: NodeName,
    #[serde(default)]
    pub shared_name: Option<SharedStorPoolName>,
    pub provider_kind: ProviderKind,
    /// Higher is better.
    pub score: f64,
}

impl Candidate {
    pub fn from_scored(pool: &StorPoolInfo, score: f64) -> Self {
        Self {
            stor_pool: pool.stor_pool.clone(),
            node: pool.node.clone(),
            shared_name: pool.shared_name.clone(),
            provider_kind: pool.provider_kind,
            score,
        }
    }

    /// Two candidates are the same placement if they name the same pool
    /// on the same node.
    pub fn same_placement(&self, other: &Candidate) -> bool {
        self.node == other.node && self.stor_pool == other.stor_pool
    }
}

/// External heuristic producing a score per storage pool.
pub trait ScoreProvider {
    fn score(&self, pool: &StorPoolInfo) -> f64;
}

impl<F> ScoreProvider for F
where
    F: Fn(&StorPoolInfo) -> f64,
{
    fn score(&self, pool: &StorPoolInfo) -> f64 {
        self(pool)
    }
}

// ── Deployed resources ────────────────────────────────────────────

/// State flags of a deployed resource instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResourceFlags {
    pub diskless: bool,
    pub deleting: bool,
    pub evicted: bool,
    pub evacuating: bool,
}

/// Role of a volume within the storage layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeRole {
    #[default]
    Data,
    Metadata,
    Cache,
}

/// A storage-layer volume of a deployed resource and its backing pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedVolume {
    #[serde(default)]
    pub role: VolumeRole,
    pub stor_pool: StorPoolName,
    #[serde(default)]
    pub shared_name: Option<SharedStorPoolName>,
    pub provider_kind: ProviderKind,
}

/// One deployed instance of a resource on a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployedResource {
    pub node: NodeName,
    #[serde(default)]
    pub flags: ResourceFlags,
    /// Evacuate flag of the hosting node.
    #[serde(default)]
    pub node_evacuating: bool,
    #[serde(default)]
    pub volumes: Vec<DeployedVolume>,
}

/// A resource definition together with its deployed instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceSnapshot {
    pub name: ResourceName,
    #[serde(default)]
    pub deployed: Vec<DeployedResource>,
}
