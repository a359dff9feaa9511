// Node & Provisioner Ports
// Backends (cloud, bare metal, VMs) plug in here; none ship with core

use async_trait::async_trait;

use crate::domain::{NodeRole, NodeSpec};
use crate::error::Result;

/// A single machine in the test cluster
#[async_trait]
pub trait Node: Send + Sync {
    fn name(&self) -> &str;

    fn role(&self) -> NodeRole;

    fn tags(&self) -> &[String];

    /// Boot the node so it is ready to be used (e.g. reachable via `ssh_ip`)
    async fn boot(&mut self) -> Result<()>;

    /// Address that can be used to ssh into the node
    async fn ssh_ip(&self) -> Result<String>;

    /// Release the node on the backend
    async fn destroy(&mut self) -> Result<()>;
}

/// Creates nodes on a particular backend
#[async_trait]
pub trait Provisioner: Send + Sync {
    type Node: Node;

    /// Create (but do not boot) a node described by `spec`
    async fn create_node(&self, spec: NodeSpec) -> Result<Self::Node>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::HarnessError;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::{Arc, Mutex};

    /// Shared record of what happened to mock nodes
    #[derive(Debug, Default)]
    pub struct MockEvents {
        pub booted: Vec<String>,
        pub destroyed: Vec<String>,
    }

    /// In-memory node handed out by `MockProvisioner`
    pub struct MockNode {
        spec: NodeSpec,
        ip: String,
        booted: bool,
        fail_boot: bool,
        fail_destroy: bool,
        events: Arc<Mutex<MockEvents>>,
    }

    impl MockNode {
        pub fn is_booted(&self) -> bool {
            self.booted
        }
    }

    #[async_trait]
    impl Node for MockNode {
        fn name(&self) -> &str {
            &self.spec.name
        }

        fn role(&self) -> NodeRole {
            self.spec.role
        }

        fn tags(&self) -> &[String] {
            &self.spec.tags
        }

        async fn boot(&mut self) -> Result<()> {
            if self.fail_boot {
                return Err(HarnessError::Node {
                    node: self.spec.name.clone(),
                    message: "mock boot failure".to_string(),
                });
            }
            self.booted = true;
            self.events.lock().unwrap().booted.push(self.spec.name.clone());
            Ok(())
        }

        async fn ssh_ip(&self) -> Result<String> {
            if !self.booted {
                return Err(HarnessError::Node {
                    node: self.spec.name.clone(),
                    message: "node has not been booted".to_string(),
                });
            }
            Ok(self.ip.clone())
        }

        async fn destroy(&mut self) -> Result<()> {
            self.events
                .lock()
                .unwrap()
                .destroyed
                .push(self.spec.name.clone());
            if self.fail_destroy {
                return Err(HarnessError::Node {
                    node: self.spec.name.clone(),
                    message: "mock destroy failure".to_string(),
                });
            }
            self.booted = false;
            Ok(())
        }
    }

    /// Mock provisioner handing out `10.0.0.x` addresses in creation order
    #[derive(Default)]
    pub struct MockProvisioner {
        next_host: AtomicU32,
        fail_boot: HashSet<String>,
        fail_destroy: HashSet<String>,
        events: Arc<Mutex<MockEvents>>,
    }

    impl MockProvisioner {
        pub fn new() -> Self {
            Self::default()
        }

        /// Nodes with these names fail when booted
        pub fn failing_boot<I, S>(mut self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.fail_boot = names.into_iter().map(Into::into).collect();
            self
        }

        /// Nodes with these names fail when destroyed
        pub fn failing_destroy<I, S>(mut self, names: I) -> Self
        where
            I: IntoIterator<Item = S>,
            S: Into<String>,
        {
            self.fail_destroy = names.into_iter().map(Into::into).collect();
            self
        }

        pub fn booted(&self) -> Vec<String> {
            self.events.lock().unwrap().booted.clone()
        }

        pub fn destroyed(&self) -> Vec<String> {
            self.events.lock().unwrap().destroyed.clone()
        }

        /// Build a node outside of the provisioner flow
        pub fn node(&self, spec: NodeSpec) -> MockNode {
            let host = self.next_host.fetch_add(1, Ordering::SeqCst) + 1;
            MockNode {
                fail_boot: self.fail_boot.contains(&spec.name),
                fail_destroy: self.fail_destroy.contains(&spec.name),
                spec,
                ip: format!("10.0.0.{host}"),
                booted: false,
                events: Arc::clone(&self.events),
            }
        }
    }

    #[async_trait]
    impl Provisioner for MockProvisioner {
        type Node = MockNode;

        async fn create_node(&self, spec: NodeSpec) -> Result<MockNode> {
            Ok(self.node(spec))
        }
    }
}
