//! Application wiring for the role association reconciler.
//!
//! Loads [`AppConfig`] from `rolebind.toml` and `ROLEBIND__*` environment
//! variables, sets up tracing, and builds an [`AssociationReconciler`] over
//! the configured API backend.

pub mod config;
pub mod observability;

pub use config::loader::{DEFAULT_CONFIG_PATH, load_config};
pub use config::{AppConfig, ConfigError, LoggingConfig, ReconcilerSection};

pub use rolebind_api::{ApiError, ClusterRoleApi, DynClusterRoleApi};
pub use rolebind_core::{
    AssociationAttributes, AssociationKey, AssociationRecord, AssociationStatus, decode_id,
    encode_id,
};
pub use rolebind_reconciler::{
    AssociationReconciler, CancellationToken, ReadOutcome, ReconcileError, ReconcilerConfig,
};

use rolebind_api_memory::create_api;
use tracing::info;

/// Builds a reconciler over the backend described by `config.backend`.
pub fn build_reconciler(config: &AppConfig) -> AssociationReconciler {
    build_reconciler_with_api(config, create_api(&config.backend))
}

/// Builds a reconciler over an already constructed API client.
pub fn build_reconciler_with_api(config: &AppConfig, api: DynClusterRoleApi) -> AssociationReconciler {
    let reconciler_config = config.to_reconciler_config();
    info!(
        backend = api.backend_name(),
        poll_interval = ?reconciler_config.poll_interval,
        create_timeout = ?reconciler_config.create_timeout,
        delete_timeout = ?reconciler_config.delete_timeout,
        "Association reconciler configured"
    );
    AssociationReconciler::new(api, reconciler_config)
}
