// Cluster ID Provider Port (for deterministic testing)

/// Length of generated cluster ids
pub const CLUSTER_ID_LEN: usize = 8;

/// Cluster id interface (allows deterministic ids in tests)
pub trait ClusterIdProvider: Send + Sync {
    /// Generate a new short cluster id
    fn generate_id(&self) -> String;
}

/// UUID v4 provider (production), truncated to `CLUSTER_ID_LEN`
pub struct UuidClusterIdProvider;

impl ClusterIdProvider for UuidClusterIdProvider {
    fn generate_id(&self) -> String {
        let mut id = uuid::Uuid::new_v4().simple().to_string();
        id.truncate(CLUSTER_ID_LEN);
        id
    }
}

/// Fixed id provider for tests
pub struct FixedClusterIdProvider(pub String);

impl ClusterIdProvider for FixedClusterIdProvider {
    fn generate_id(&self) -> String {
        self.0.clone()
    }
}
