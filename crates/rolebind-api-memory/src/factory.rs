use std::sync::Arc;

use rolebind_api::DynClusterRoleApi;
use serde::{Deserialize, Serialize};

use crate::InMemoryClusterApi;

/// Supported API backend types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiBackend {
    /// Eventually consistent simulator backed by papaya::HashMap
    #[default]
    InMemory,
}

/// How the simulator paces state transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationOptions {
    /// Describe calls an added role reports `PENDING` before `ACTIVE`.
    pub pending_polls: u32,
    /// Describe calls a removed role reports `DELETING` before it disappears.
    pub deleting_polls: u32,
    /// Maximum number of roles per cluster; unlimited when unset.
    pub max_roles_per_cluster: Option<usize>,
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self {
            pending_polls: 2,
            deleting_polls: 2,
            max_roles_per_cluster: None,
        }
    }
}

/// Factory configuration to construct an API client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    pub kind: ApiBackend,
    pub simulation: SimulationOptions,
    /// Clusters that exist when the backend starts.
    pub clusters: Vec<String>,
}

/// Create an API client based on the provided configuration.
pub fn create_api(config: &BackendConfig) -> DynClusterRoleApi {
    match config.kind {
        ApiBackend::InMemory => {
            let api = InMemoryClusterApi::with_options(config.simulation.clone());
            for cluster in &config.clusters {
                api.create_cluster(cluster.clone());
            }
            Arc::new(api)
        }
    }
}
