//! Error types returned by the cloud API.
//!
//! The variants mirror the fault classes the database service reports for
//! role add/remove/describe calls, plus the transport-level failures any
//! client can hit.

use std::fmt;

/// Errors that can occur while talking to the cluster role API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// The parent cluster does not exist.
    #[error("DB cluster not found: {cluster_id}")]
    ClusterNotFound {
        /// Identifier of the missing cluster.
        cluster_id: String,
    },

    /// The cluster exists but the role is not associated with it.
    #[error("Role {role_id} is not associated with DB cluster {cluster_id}")]
    RoleNotFound {
        /// Identifier of the cluster.
        cluster_id: String,
        /// Identifier of the role.
        role_id: String,
    },

    /// The role is already associated with the cluster.
    #[error("Role {role_id} is already associated with DB cluster {cluster_id}")]
    RoleAlreadyExists {
        /// Identifier of the cluster.
        cluster_id: String,
        /// Identifier of the role.
        role_id: String,
    },

    /// The cluster is not in a state that accepts the request.
    #[error("DB cluster {cluster_id} is in an invalid state: {message}")]
    InvalidClusterState {
        /// Identifier of the cluster.
        cluster_id: String,
        /// Description reported by the service.
        message: String,
    },

    /// The cluster has reached its maximum number of associated roles.
    #[error("Role quota exceeded for DB cluster {cluster_id}")]
    QuotaExceeded {
        /// Identifier of the cluster.
        cluster_id: String,
    },

    /// The request was throttled.
    #[error("Request throttled: {message}")]
    Throttled {
        /// Description of the throttling response.
        message: String,
    },

    /// The request could not be delivered or the response was lost.
    #[error("Transport error: {message}")]
    Transport {
        /// Description of the transport failure.
        message: String,
    },

    /// The caller's credentials do not permit the request.
    #[error("Access denied: {message}")]
    AccessDenied {
        /// Description of the authorization failure.
        message: String,
    },

    /// Any other unexpected service response.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the error.
        message: String,
    },
}

impl ApiError {
    /// Creates a new `ClusterNotFound` error.
    #[must_use]
    pub fn cluster_not_found(cluster_id: impl Into<String>) -> Self {
        Self::ClusterNotFound {
            cluster_id: cluster_id.into(),
        }
    }

    /// Creates a new `RoleNotFound` error.
    #[must_use]
    pub fn role_not_found(cluster_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self::RoleNotFound {
            cluster_id: cluster_id.into(),
            role_id: role_id.into(),
        }
    }

    /// Creates a new `RoleAlreadyExists` error.
    #[must_use]
    pub fn role_already_exists(cluster_id: impl Into<String>, role_id: impl Into<String>) -> Self {
        Self::RoleAlreadyExists {
            cluster_id: cluster_id.into(),
            role_id: role_id.into(),
        }
    }

    /// Creates a new `InvalidClusterState` error.
    #[must_use]
    pub fn invalid_cluster_state(
        cluster_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidClusterState {
            cluster_id: cluster_id.into(),
            message: message.into(),
        }
    }

    /// Creates a new `QuotaExceeded` error.
    #[must_use]
    pub fn quota_exceeded(cluster_id: impl Into<String>) -> Self {
        Self::QuotaExceeded {
            cluster_id: cluster_id.into(),
        }
    }

    /// Creates a new `Throttled` error.
    #[must_use]
    pub fn throttled(message: impl Into<String>) -> Self {
        Self::Throttled {
            message: message.into(),
        }
    }

    /// Creates a new `Transport` error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a new `AccessDenied` error.
    #[must_use]
    pub fn access_denied(message: impl Into<String>) -> Self {
        Self::AccessDenied {
            message: message.into(),
        }
    }

    /// Creates a new `Internal` error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns `true` if the parent cluster does not exist.
    #[must_use]
    pub fn is_cluster_not_found(&self) -> bool {
        matches!(self, Self::ClusterNotFound { .. })
    }

    /// Returns `true` if the role is not associated with an existing cluster.
    #[must_use]
    pub fn is_role_not_found(&self) -> bool {
        matches!(self, Self::RoleNotFound { .. })
    }

    /// Returns `true` if the association is already in place.
    #[must_use]
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::RoleAlreadyExists { .. })
    }

    /// Returns `true` if the association is gone, at either granularity.
    #[must_use]
    pub fn is_already_absent(&self) -> bool {
        self.is_cluster_not_found() || self.is_role_not_found()
    }

    /// Returns `true` if repeating the same request later may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled { .. } | Self::Transport { .. } | Self::InvalidClusterState { .. }
        )
    }

    /// Returns the error category for logging/monitoring purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ClusterNotFound { .. } | Self::RoleNotFound { .. } => ErrorCategory::NotFound,
            Self::RoleAlreadyExists { .. } | Self::InvalidClusterState { .. } => {
                ErrorCategory::Conflict
            }
            Self::QuotaExceeded { .. } | Self::Throttled { .. } => ErrorCategory::Limit,
            Self::Transport { .. } => ErrorCategory::Infrastructure,
            Self::AccessDenied { .. } => ErrorCategory::Auth,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }
}

/// Categories of API errors for logging and monitoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Cluster or association not found.
    NotFound,
    /// Conflict with the current remote state.
    Conflict,
    /// Throttling or quota limits.
    Limit,
    /// Transport/connection error.
    Infrastructure,
    /// Authentication or authorization failure.
    Auth,
    /// Internal error.
    Internal,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Limit => write!(f, "limit"),
            Self::Infrastructure => write!(f, "infrastructure"),
            Self::Auth => write!(f, "auth"),
            Self::Internal => write!(f, "internal"),
        }
    }
}
