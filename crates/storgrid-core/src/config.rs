//! Placement filter configuration.
//!
//! A `PlacementFilter` is the user/policy-supplied description of where
//! replicas may go. Every field is optional; it can be built in code or
//! loaded from TOML:
//!
//! ```toml
//! replica_count = 3
//! replicas_on_same = ["site"]
//! replicas_on_different = ["rack", "zone=maintenance"]
//! ```

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::NodeName;

/// A `key` or `key=value` node property rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PropRule {
    pub key: String,
    pub value: Option<String>,
}

impl PropRule {
    pub fn key(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn with_value(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

impl FromStr for PropRule {
    type Err = CoreError;

    fn from_str(s: &str) -> CoreResult<Self> {
        let (key, value) = match s.split_once('=') {
            Some((k, v)) => (k.trim(), Some(v.trim().to_string())),
            None => (s.trim(), None),
        };
        if key.is_empty() {
            return Err(CoreError::InvalidRule(s.to_string()));
        }
        Ok(Self {
            key: key.to_string(),
            value,
        })
    }
}

impl TryFrom<String> for PropRule {
    type Error = CoreError;

    fn try_from(s: String) -> CoreResult<Self> {
        s.parse()
    }
}

impl From<PropRule> for String {
    fn from(rule: PropRule) -> Self {
        rule.to_string()
    }
}

impl fmt::Display for PropRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.value {
            Some(v) => write!(f, "{}={}", self.key, v),
            None => f.write_str(&self.key),
        }
    }
}

/// Diskless flavour requested when placing diskless replicas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisklessType {
    Drbd,
    NvmeInitiator,
}

/// User/policy-supplied placement configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementFilter {
    /// Target total replica count (diskful, or diskless if `diskless_type` is set).
    pub replica_count: Option<u32>,
    /// Replicas to add regardless of the current count.
    pub additional_replica_count: Option<u32>,
    /// Properties all selected nodes must agree on.
    pub replicas_on_same: Vec<PropRule>,
    /// Properties no two selected nodes may share.
    pub replicas_on_different: Vec<PropRule>,
    pub diskless_type: Option<DisklessType>,
    /// Nodes whose existing replicas are not counted.
    pub skip_already_placed_on_node_names_check: Vec<NodeName>,
    /// Disable counting of existing replicas entirely.
    pub skip_already_placed_on_all_node_check: bool,
}

impl PlacementFilter {
    pub fn from_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let filter: PlacementFilter = toml::from_str(content)?;
        filter.validate()?;
        Ok(filter)
    }

    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string_pretty(self).map_err(|e| CoreError::InvalidFilter(e.to_string()))
    }

    /// Reject filters that can never describe a meaningful placement.
    pub fn validate(&self) -> CoreResult<()> {
        if self.replica_count == Some(0) {
            return Err(CoreError::InvalidFilter(
                "replica_count must be at least 1".to_string(),
            ));
        }
        for rule in &self.replicas_on_same {
            if self.replicas_on_different.iter().any(|r| r.key == rule.key) {
                return Err(CoreError::InvalidFilter(format!(
                    "property '{}' cannot be both same and different",
                    rule.key
                )));
            }
        }
        Ok(())
    }

    pub fn is_diskless(&self) -> bool {
        self.diskless_type.is_some()
    }

    /// Whether existing replicas on `node` are excluded from counting.
    pub fn skips_node(&self, node: &str) -> bool {
        self.skip_already_placed_on_all_node_check
            || self
                .skip_already_placed_on_node_names_check
                .iter()
                .any(|n| n == node)
    }
}
