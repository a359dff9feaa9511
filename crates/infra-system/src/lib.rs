// Clustertest Infrastructure - System Adapters
// Implements: CommandRunner

pub mod subprocess_executor;

pub use subprocess_executor::SubprocessExecutor;
