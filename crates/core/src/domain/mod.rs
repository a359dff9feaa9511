// Domain Layer - Cluster nodes and their roles

pub mod error;
pub mod node;

// Re-exports
pub use error::DomainError;
pub use node::{NodeName, NodeRole, NodeSpec};
