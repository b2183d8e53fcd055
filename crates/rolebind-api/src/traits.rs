//! The cloud API contract the reconciler is written against.

use async_trait::async_trait;

use crate::error::ApiError;
use crate::types::{AddRoleRequest, ClusterRole, RemoveRoleRequest};

/// Client for the role-association calls of the database service.
///
/// Mutating calls return as soon as the request is accepted; the association
/// then moves through intermediate states asynchronously. Implementations
/// must be thread-safe (`Send + Sync`) and hold no per-key state, so one
/// client can be shared by any number of reconcilers.
///
/// # Example
///
/// ```ignore
/// use rolebind_api::{ClusterRoleApi, ApiError, ClusterRole};
///
/// async fn role_status(
///     api: &dyn ClusterRoleApi,
///     cluster: &str,
///     role: &str,
/// ) -> Result<Option<String>, ApiError> {
///     let roles = api.describe_cluster_roles(cluster).await?;
///     Ok(roles.into_iter().find(|r| r.role_id == role).map(|r| r.status))
/// }
/// ```
#[async_trait]
pub trait ClusterRoleApi: Send + Sync {
    /// Requests that a role be associated with a cluster.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ClusterNotFound` if the cluster does not exist.
    /// Returns `ApiError::RoleAlreadyExists` if the role is already associated.
    async fn add_role_to_cluster(&self, request: &AddRoleRequest) -> Result<(), ApiError>;

    /// Requests that a role be removed from a cluster.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ClusterNotFound` if the cluster does not exist.
    /// Returns `ApiError::RoleNotFound` if the role is not associated.
    async fn remove_role_from_cluster(&self, request: &RemoveRoleRequest) -> Result<(), ApiError>;

    /// Lists the roles currently associated with a cluster, in any state.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ClusterNotFound` if the cluster does not exist.
    async fn describe_cluster_roles(&self, cluster_id: &str) -> Result<Vec<ClusterRole>, ApiError>;

    /// Returns the name of this backend for logging/debugging.
    fn backend_name(&self) -> &'static str;
}
