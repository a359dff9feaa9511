// Port Layer - Interfaces for external dependencies

pub mod command_runner;
pub mod id_provider; // For deterministic testing
pub mod node;

// Re-exports
pub use command_runner::{CommandOutput, CommandRunner, ExecuteOptions, ExecutionError};
pub use id_provider::{ClusterIdProvider, UuidClusterIdProvider};
pub use node::{Node, Provisioner};
