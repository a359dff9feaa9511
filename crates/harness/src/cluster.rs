//! High-level cluster handle for tests

use tracing::info;

use clustertest_core::application::{wait_for_command, Hardware, Matcher, PollPolicy};
use clustertest_core::port::{
    ClusterIdProvider, CommandOutput, ExecuteOptions, Provisioner, UuidClusterIdProvider,
};
use clustertest_core::Result;
use clustertest_infra_system::SubprocessExecutor;

use crate::Settings;

/// Hardware plus a local command runner and the configured poll policy
pub struct TestCluster<P: Provisioner> {
    hardware: Hardware<P>,
    executor: SubprocessExecutor,
    poll_policy: PollPolicy,
}

impl<P: Provisioner> TestCluster<P> {
    /// Create the cluster's working directory; no nodes are booted yet
    pub fn new(settings: &Settings, provisioner: P) -> Result<Self> {
        Self::with_id_provider(settings, &UuidClusterIdProvider, provisioner)
    }

    pub fn with_id_provider(
        settings: &Settings,
        id_provider: &dyn ClusterIdProvider,
        provisioner: P,
    ) -> Result<Self> {
        let hardware = Hardware::new(&settings.hardware_config(), id_provider, provisioner)?;
        Ok(Self {
            hardware,
            executor: SubprocessExecutor::new(),
            poll_policy: settings.poll_policy(),
        })
    }

    pub fn hardware(&self) -> &Hardware<P> {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut Hardware<P> {
        &mut self.hardware
    }

    pub fn poll_policy(&self) -> &PollPolicy {
        &self.poll_policy
    }

    /// Boot masters and workers, numbering from `offset`
    pub async fn boot(&mut self, masters: u32, workers: u32, offset: u32) -> Result<()> {
        self.hardware.boot_nodes(masters, workers, offset).await
    }

    /// Run a shell command on the test host
    pub async fn execute(&self, command: &str, opts: &ExecuteOptions) -> Result<CommandOutput> {
        Ok(self.executor.run(command, opts).await?)
    }

    /// Poll `command` until its stdout satisfies `matcher`
    ///
    /// A non-zero exit counts as "not yet" rather than aborting the wait.
    pub async fn wait_for<M>(&self, command: &str, matcher: &M) -> Result<String>
    where
        M: Matcher<String> + ?Sized,
    {
        wait_for_command(
            &self.executor,
            command,
            &ExecuteOptions::captured().check(false),
            matcher,
            &self.poll_policy,
        )
        .await
    }

    /// Destroy every node; the working directory stays for debugging
    pub async fn teardown(mut self) -> Result<()> {
        info!(
            hardware_id = %self.hardware.hardware_id(),
            working_dir = %self.hardware.working_dir().display(),
            "tearing down test cluster"
        );
        self.hardware.destroy().await
    }
}
