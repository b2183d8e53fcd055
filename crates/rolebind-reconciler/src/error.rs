//! Error types for reconciliation.
//!
//! Every variant carries the association key it concerns so failures can be
//! traced back to a composite ID in logs.

use std::fmt;
use std::time::Duration;

use rolebind_api::ApiError;
use rolebind_core::{AssociationKey, AssociationStatus, CoreError};
use thiserror::Error;

/// Remote state last seen by a wait, reported when it gives up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedState {
    /// No lookup completed before the wait ended.
    Unobserved,
    /// The parent cluster existed but the association did not.
    Absent,
    /// The parent cluster did not exist.
    ParentMissing,
    /// The association existed in the given state.
    Status(AssociationStatus),
}

impl fmt::Display for ObservedState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unobserved => write!(f, "nothing observed"),
            Self::Absent => write!(f, "absent"),
            Self::ParentMissing => write!(f, "parent missing"),
            Self::Status(status) => write!(f, "{status}"),
        }
    }
}

/// Main error type for reconciler operations
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Invalid key or malformed composite ID
    #[error(transparent)]
    Identifier(#[from] CoreError),

    /// Throttling or transport failure; the whole operation may be retried
    #[error("transient API error for {key}: {source}")]
    TransientApi {
        /// Association the call was made for
        key: AssociationKey,
        /// Underlying API error
        #[source]
        source: ApiError,
    },

    /// Any other API failure
    #[error("API error for {key}: {source}")]
    Api {
        /// Association the call was made for
        key: AssociationKey,
        /// Underlying API error
        #[source]
        source: ApiError,
    },

    /// The parent cluster vanished while an association was being created
    #[error("DB cluster {} not found while reconciling {key}", .key.parent_id())]
    ParentNotFound {
        /// Association being reconciled
        key: AssociationKey,
    },

    /// The remote state did not reach the target within the budget
    #[error("timed out after {waited:?} waiting for {key} to become {target} (last observed: {last_observed})")]
    ConvergenceTimeout {
        /// Association being waited on
        key: AssociationKey,
        /// Description of the target condition
        target: &'static str,
        /// Time spent waiting
        waited: Duration,
        /// Last state seen before giving up
        last_observed: ObservedState,
    },

    /// The caller cancelled the wait
    #[error("wait for {key} was cancelled")]
    Cancelled {
        /// Association being waited on
        key: AssociationKey,
    },

    /// The observed state does not satisfy the operation's precondition
    #[error("association {key} is {actual}, expected {expected}")]
    UnexpectedState {
        /// Association that was checked
        key: AssociationKey,
        /// State the operation required
        expected: String,
        /// State actually observed
        actual: String,
    },

    /// The association does not exist
    #[error("association {key} not found")]
    NotFound {
        /// Association that was looked up
        key: AssociationKey,
    },
}

impl ReconcileError {
    /// Wraps an API error, separating retryable failures from the rest.
    pub fn from_api(key: &AssociationKey, source: ApiError) -> Self {
        if source.is_retryable() {
            Self::TransientApi {
                key: key.clone(),
                source,
            }
        } else {
            Self::Api {
                key: key.clone(),
                source,
            }
        }
    }

    /// Create an UnexpectedState error
    pub fn unexpected_state(
        key: &AssociationKey,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::UnexpectedState {
            key: key.clone(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a NotFound error
    pub fn not_found(key: &AssociationKey) -> Self {
        Self::NotFound { key: key.clone() }
    }

    /// Whether retrying the whole operation is expected to help.
    ///
    /// All mutating calls are idempotent, so a retry after a timeout or a
    /// transient failure is always safe.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::TransientApi { .. } | Self::ConvergenceTimeout { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::ConvergenceTimeout { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }

    /// Errors caused by caller input rather than remote state.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::Identifier(_))
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Identifier(_) => ErrorCategory::Input,
            Self::TransientApi { .. } => ErrorCategory::Transient,
            Self::Api { .. } => ErrorCategory::Api,
            Self::ParentNotFound { .. } | Self::NotFound { .. } => ErrorCategory::NotFound,
            Self::ConvergenceTimeout { .. } => ErrorCategory::Timeout,
            Self::Cancelled { .. } => ErrorCategory::Cancelled,
            Self::UnexpectedState { .. } => ErrorCategory::Conflict,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Transient,
    Api,
    NotFound,
    Timeout,
    Cancelled,
    Conflict,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Input => write!(f, "input"),
            Self::Transient => write!(f, "transient"),
            Self::Api => write!(f, "api"),
            Self::NotFound => write!(f, "not_found"),
            Self::Timeout => write!(f, "timeout"),
            Self::Cancelled => write!(f, "cancelled"),
            Self::Conflict => write!(f, "conflict"),
        }
    }
}

/// Result type alias for reconciler operations
pub type Result<T> = std::result::Result<T, ReconcileError>;
