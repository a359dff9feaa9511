//! Cluster test harness
//!
//! Entry point for end-to-end suites that need a throwaway cluster:
//! - settings from defaults, an optional file and `CLUSTERTEST_*` env vars
//! - tracing setup that plays well with libtest
//! - [`TestCluster`], tying hardware, command execution and polling together

pub mod cluster;
pub mod logging;
pub mod settings;

pub use cluster::TestCluster;
pub use logging::{init_logging, init_test_logging};
pub use settings::Settings;

pub use clustertest_core::application::{
    decode, predicate, regex_count_matcher, regex_matcher, simple_matcher, wait_for_command,
    wait_for_result, wait_for_success, Hardware, HardwareConfig, Matcher, PollPolicy,
};
pub use clustertest_core::domain::{NodeRole, NodeSpec};
pub use clustertest_core::port::{
    CommandOutput, CommandRunner, ExecuteOptions, ExecutionError, Node, Provisioner,
};
pub use clustertest_core::{HarnessError, Result};
pub use clustertest_infra_system::SubprocessExecutor;
