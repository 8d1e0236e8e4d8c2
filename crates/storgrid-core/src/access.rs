//! Collaborator seams for reading cluster state.
//!
//! The placement engine never owns node properties or deployment state.
//! It reads them through these traits, and every read may be refused by
//! the caller's security context.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{DeployedResource, NodeName, ResourceName, ResourceSnapshot};

/// A lookup refused by access control. Never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("access denied: cannot read {object} '{name}'")]
pub struct AccessDenied {
    pub object: String,
    pub name: String,
}

impl AccessDenied {
    pub fn node_prop(node: &str, key: &str) -> Self {
        Self {
            object: "property".to_string(),
            name: format!("{node}/{key}"),
        }
    }

    pub fn resource(name: &str) -> Self {
        Self {
            object: "resource".to_string(),
            name: name.to_string(),
        }
    }
}

/// Read access to node properties.
pub trait PropertyAccess {
    /// `Ok(None)` when the node does not expose `key`.
    fn node_prop(&self, node: &str, key: &str) -> Result<Option<String>, AccessDenied>;
}

/// Read access to the deployed instances of a resource.
pub trait ResourceStateAccess {
    /// `Ok(None)` when the resource definition does not exist yet.
    fn resource(&self, name: &str) -> Result<Option<ResourceSnapshot>, AccessDenied>;
}

/// In-memory cluster view backed by plain maps.
///
/// Used by the CLI scenarios and tests. Keys listed in `denied_props`
/// fail with [`AccessDenied`] on every node.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticCluster {
    pub node_props: BTreeMap<NodeName, BTreeMap<String, String>>,
    pub resources: BTreeMap<ResourceName, Vec<DeployedResource>>,
    pub denied_props: BTreeSet<String>,
}

impl StaticCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prop(mut self, node: &str, key: &str, value: &str) -> Self {
        self.node_props
            .entry(node.to_string())
            .or_default()
            .insert(key.to_string(), value.to_string());
        self
    }

    pub fn with_resource(mut self, name: &str, deployed: Vec<DeployedResource>) -> Self {
        self.resources.insert(name.to_string(), deployed);
        self
    }

    pub fn deny_prop(mut self, key: &str) -> Self {
        self.denied_props.insert(key.to_string());
        self
    }
}

impl PropertyAccess for StaticCluster {
    fn node_prop(&self, node: &str, key: &str) -> Result<Option<String>, AccessDenied> {
        if self.denied_props.contains(key) {
            return Err(AccessDenied::node_prop(node, key));
        }
        Ok(self
            .node_props
            .get(node)
            .and_then(|props| props.get(key))
            .cloned())
    }
}

impl ResourceStateAccess for StaticCluster {
    fn resource(&self, name: &str) -> Result<Option<ResourceSnapshot>, AccessDenied> {
        Ok(self.resources.get(name).map(|deployed| ResourceSnapshot {
            name: name.to_string(),
            deployed: deployed.clone(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_known_props() {
        let cluster = StaticCluster::new().with_prop("alpha", "rack", "r1");

        assert_eq!(cluster.node_prop("alpha", "rack").unwrap().as_deref(), Some("r1"));
        assert_eq!(cluster.node_prop("alpha", "site").unwrap(), None);
        assert_eq!(cluster.node_prop("beta", "rack").unwrap(), None);
    }

    #[test]
    fn denied_props_fail() {
        let cluster = StaticCluster::new()
            .with_prop("alpha", "secret", "x")
            .deny_prop("secret");

        let err = cluster.node_prop("alpha", "secret").unwrap_err();
        assert_eq!(err, AccessDenied::node_prop("alpha", "secret"));
        assert!(err.to_string().contains("alpha/secret"));
    }

    #[test]
    fn unknown_resource_is_none() {
        let cluster = StaticCluster::new().with_resource("vol-1", Vec::new());

        assert!(cluster.resource("vol-1").unwrap().is_some());
        assert!(cluster.resource("vol-2").unwrap().is_none());
    }
}
