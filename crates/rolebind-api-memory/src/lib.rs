//! In-memory cluster role API for rolebind.
//!
//! This crate provides an eventually consistent implementation of the
//! `ClusterRoleApi` trait from `rolebind-api`, using a papaya lock-free
//! HashMap of clusters. It stands in for the cloud service in tests and
//! local runs.
//!
//! # Example
//!
//! ```ignore
//! use rolebind_api_memory::InMemoryClusterApi;
//! use rolebind_api::{AddRoleRequest, ClusterRoleApi};
//!
//! let api = InMemoryClusterApi::new();
//! api.create_cluster("cluster-A");
//! api.add_role_to_cluster(&request).await?;
//! // PENDING for the first describes, then ACTIVE
//! let roles = api.describe_cluster_roles("cluster-A").await?;
//! ```

pub mod factory;
pub mod simulator;

pub use rolebind_api::{ApiError, ClusterRoleApi, DynClusterRoleApi};

pub use factory::{ApiBackend, BackendConfig, SimulationOptions, create_api};
pub use simulator::{ApiOperation, InMemoryClusterApi};
