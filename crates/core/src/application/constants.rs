// Harness constants (no magic values)
use std::time::Duration;

/// Default number of polling attempts
pub const DEFAULT_POLL_ATTEMPTS: u32 = 20;

/// Default pause between polling attempts (5s)
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Default prefix for cluster working dirs and node names
pub const DEFAULT_CLUSTER_PREFIX: &str = "clustertest-";
