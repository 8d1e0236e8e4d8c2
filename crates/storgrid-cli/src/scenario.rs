//! Placement scenario files.
//!
//! A scenario bundles everything one placement call needs: the filter,
//! the scored candidates, node properties and what is already deployed.
//!
//! ```toml
//! resource = "vol-1"
//!
//! [filter]
//! replica_count = 2
//! replicas_on_different = ["rack"]
//!
//! [[candidates]]
//! node = "alpha"
//! stor_pool = "thin"
//! provider_kind = "lvm_thin"
//! score = 9.0
//!
//! [cluster.node_props.alpha]
//! rack = "r1"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use storgrid_core::{
    Candidate, NodeName, PlacementFilter, ScoreProvider, StaticCluster, StorPoolInfo,
};
use storgrid_placement::score_pools;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Scenario {
    /// Resource being placed. Absent for a brand-new resource.
    pub resource: Option<String>,
    pub filter: PlacementFilter,
    /// Pre-scored candidates.
    pub candidates: Vec<Candidate>,
    /// Unscored pools, scored through `scores`.
    pub pools: Vec<StorPoolInfo>,
    /// `"node/stor_pool"` → score.
    pub scores: BTreeMap<String, f64>,
    pub cluster: StaticCluster,
    /// Nodes that must keep their replica when deselecting.
    pub fixed_nodes: Vec<NodeName>,
}

impl Scenario {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("invalid scenario {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let scenario: Scenario = toml::from_str(content)?;
        scenario.filter.validate()?;
        Ok(scenario)
    }

    /// Explicit candidates followed by the scored `pools`.
    pub fn all_candidates(&self) -> Vec<Candidate> {
        let scorer = TableScorer(&self.scores);
        let mut all = self.candidates.clone();
        all.extend(score_pools(&self.pools, &scorer));
        all
    }
}

/// Looks scores up by `node/stor_pool`; unknown pools score zero.
struct TableScorer<'a>(&'a BTreeMap<String, f64>);

impl ScoreProvider for TableScorer<'_> {
    fn score(&self, pool: &StorPoolInfo) -> f64 {
        self.0
            .get(&format!("{}/{}", pool.node, pool.stor_pool))
            .copied()
            .unwrap_or(0.0)
    }
}
