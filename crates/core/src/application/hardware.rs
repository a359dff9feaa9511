// Hardware lifecycle: owns the nodes of one ephemeral test cluster
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::constants::DEFAULT_CLUSTER_PREFIX;
use crate::domain::{DomainError, NodeRole, NodeSpec};
use crate::error::{HarnessError, Result};
use crate::port::{ClusterIdProvider, Node, Provisioner};

/// Where and under which name a hardware instance keeps its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareConfig {
    /// Parent directory of per-cluster working dirs
    pub workspace_dir: PathBuf,
    /// Prepended to the cluster id for working dirs and node names
    pub cluster_prefix: String,
}

impl HardwareConfig {
    pub fn new(workspace_dir: impl Into<PathBuf>) -> Self {
        Self {
            workspace_dir: workspace_dir.into(),
            cluster_prefix: DEFAULT_CLUSTER_PREFIX.to_string(),
        }
    }

    pub fn cluster_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.cluster_prefix = prefix.into();
        self
    }
}

/// One test cluster's worth of nodes on a provisioner backend
///
/// Nodes are kept in insertion order. Call `destroy` before dropping; the
/// working directory is intentionally left behind for debugging.
pub struct Hardware<P: Provisioner> {
    hardware_id: String,
    cluster_name: String,
    working_dir: PathBuf,
    provisioner: P,
    nodes: Vec<P::Node>,
}

impl<P: Provisioner> Hardware<P> {
    /// Create a hardware instance and its working directory
    ///
    /// The directory `<workspace_dir>/<cluster_prefix><id>` must not exist yet.
    pub fn new(
        config: &HardwareConfig,
        id_provider: &dyn ClusterIdProvider,
        provisioner: P,
    ) -> Result<Self> {
        let hardware_id = id_provider.generate_id();
        let cluster_name = format!("{}{}", config.cluster_prefix, hardware_id);

        std::fs::create_dir_all(&config.workspace_dir)?;
        let working_dir = config.workspace_dir.join(&cluster_name);
        std::fs::create_dir(&working_dir)?;

        info!(
            hardware_id = %hardware_id,
            working_dir = %working_dir.display(),
            "hardware: using working dir"
        );

        Ok(Self {
            hardware_id,
            cluster_name,
            working_dir,
            provisioner,
            nodes: Vec::new(),
        })
    }

    pub fn hardware_id(&self) -> &str {
        &self.hardware_id
    }

    /// `<cluster_prefix><hardware_id>`
    pub fn cluster_name(&self) -> &str {
        &self.cluster_name
    }

    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn provisioner(&self) -> &P {
        &self.provisioner
    }

    pub fn nodes(&self) -> &[P::Node] {
        &self.nodes
    }

    pub fn node(&self, name: &str) -> Option<&P::Node> {
        self.nodes.iter().find(|n| n.name() == name)
    }

    pub fn nodes_with_role(&self, role: NodeRole) -> impl Iterator<Item = &P::Node> {
        self.nodes.iter().filter(move |n| n.role() == role)
    }

    /// Register a node under its name
    pub fn node_add(&mut self, node: P::Node) -> Result<()> {
        if self.node(node.name()).is_some() {
            return Err(HarnessError::DuplicateNode(node.name().to_string()));
        }
        info!(
            node = %node.name(),
            hardware_id = %self.hardware_id,
            "adding new node to hardware"
        );
        self.nodes.push(node);
        Ok(())
    }

    /// Unregister a node and destroy it on the backend
    pub async fn node_remove(&mut self, name: &str) -> Result<()> {
        let index = self
            .nodes
            .iter()
            .position(|n| n.name() == name)
            .ok_or_else(|| HarnessError::NodeNotFound(name.to_string()))?;

        info!(
            node = %name,
            hardware_id = %self.hardware_id,
            "removing node from hardware"
        );
        let mut node = self.nodes.remove(index);
        node.destroy().await
    }

    /// Create, boot and register `masters` masters followed by `workers` workers
    ///
    /// Node indices start at `offset`, so repeated calls can grow the cluster
    /// without name clashes. A node that fails to boot is destroyed before the
    /// error is returned; nodes booted earlier in the call stay registered.
    pub async fn boot_nodes(&mut self, masters: u32, workers: u32, offset: u32) -> Result<()> {
        info!(
            masters = masters,
            workers = workers,
            offset = offset,
            hardware_id = %self.hardware_id,
            "boot nodes"
        );

        let per_role = masters.max(workers);
        if per_role > 0 && offset.checked_add(per_role - 1).is_none() {
            return Err(DomainError::NodeIndexOverflow {
                offset,
                count: per_role,
            }
            .into());
        }

        let roles = std::iter::repeat(NodeRole::Master)
            .take(masters as usize)
            .enumerate()
            .chain(
                std::iter::repeat(NodeRole::Worker)
                    .take(workers as usize)
                    .enumerate(),
            );

        for (i, role) in roles {
            // in range: checked against per_role above
            let spec = NodeSpec::for_cluster(&self.cluster_name, role, offset + i as u32)?;
            if self.node(&spec.name).is_some() {
                return Err(HarnessError::DuplicateNode(spec.name));
            }

            let mut node = self.provisioner.create_node(spec).await?;
            if let Err(e) = node.boot().await {
                warn!(node = %node.name(), error = %e, "boot failed, destroying node");
                if let Err(destroy_err) = node.destroy().await {
                    warn!(node = %node.name(), error = %destroy_err, "failed to destroy node");
                }
                return Err(e);
            }
            self.node_add(node)?;
        }
        Ok(())
    }

    /// Remove every node; all nodes are attempted and the first error is returned
    pub async fn destroy(&mut self) -> Result<()> {
        let names: Vec<String> = self.nodes.iter().map(|n| n.name().to_string()).collect();
        let mut first_error = None;

        for name in names {
            if let Err(e) = self.node_remove(&name).await {
                warn!(node = %name, error = %e, "failed to destroy node");
                first_error.get_or_insert(e);
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl<P: Provisioner> Drop for Hardware<P> {
    fn drop(&mut self) {
        if !self.nodes.is_empty() {
            warn!(
                hardware_id = %self.hardware_id,
                nodes = self.nodes.len(),
                "hardware dropped with live nodes; call destroy() first"
            );
        }
    }
}
