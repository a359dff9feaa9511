// Clustertest Core - Domain, Ports & Application Services
// NO process or cloud adapters here (hexagonal layering)

pub mod application;
pub mod domain;
pub mod error;
pub mod port;

pub use error::{HarnessError, Result};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
