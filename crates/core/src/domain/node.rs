// Node Domain Model

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::error::{DomainError, Result};

/// Node name (unique within one hardware instance)
pub type NodeName = String;

/// Role a node plays in the cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Master,
    Worker,
}

impl std::fmt::Display for NodeRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeRole::Master => write!(f, "master"),
            NodeRole::Worker => write!(f, "worker"),
        }
    }
}

impl FromStr for NodeRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "master" => Ok(NodeRole::Master),
            "worker" => Ok(NodeRole::Worker),
            other => Err(DomainError::InvalidRole(other.to_string())),
        }
    }
}

/// Everything a provisioner needs to create a node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub name: NodeName,
    pub role: NodeRole,
    pub tags: Vec<String>,
}

impl NodeSpec {
    /// Create a spec with no tags
    ///
    /// Names must be non-empty and free of whitespace, since they end up in
    /// hostnames and log fields.
    pub fn new(name: impl Into<String>, role: NodeRole) -> Result<Self> {
        let name = name.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(DomainError::InvalidNodeName(name));
        }
        Ok(Self {
            name,
            role,
            tags: Vec::new(),
        })
    }

    /// Spec for the `index`-th node of `role` in the cluster named `cluster`
    ///
    /// Produces `<cluster>-<role>-<index>`, e.g. `clustertest-1a2b3c4d-worker-2`.
    pub fn for_cluster(cluster: &str, role: NodeRole, index: u32) -> Result<Self> {
        Self::new(format!("{cluster}-{role}-{index}"), role)
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display_and_parse() {
        assert_eq!(NodeRole::Master.to_string(), "master");
        assert_eq!(NodeRole::Worker.to_string(), "worker");
        assert_eq!("MASTER".parse::<NodeRole>().unwrap(), NodeRole::Master);
        assert!("etcd".parse::<NodeRole>().is_err());
    }

    #[test]
    fn test_spec_for_cluster_naming() {
        let spec = NodeSpec::for_cluster("clustertest-abcd1234", NodeRole::Worker, 3).unwrap();
        assert_eq!(spec.name, "clustertest-abcd1234-worker-3");
        assert_eq!(spec.role, NodeRole::Worker);
        assert!(spec.tags.is_empty());
    }

    #[test]
    fn test_spec_rejects_bad_names() {
        assert!(NodeSpec::new("", NodeRole::Master).is_err());
        assert!(NodeSpec::new("two words", NodeRole::Master).is_err());
    }

    #[test]
    fn test_spec_tags() {
        let spec = NodeSpec::new("n1", NodeRole::Master)
            .unwrap()
            .with_tags(["storage", "gpu"]);
        assert_eq!(spec.tags, vec!["storage".to_string(), "gpu".to_string()]);
    }
}
