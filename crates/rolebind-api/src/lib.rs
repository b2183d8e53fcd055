//! # rolebind-api
//!
//! Contract for the cloud API that owns role associations.
//!
//! This crate defines the trait and wire types a backend must provide. It does
//! not contain any implementations; the in-memory simulator lives in
//! `rolebind-api-memory`.
//!
//! ## Overview
//!
//! [`ClusterRoleApi`] covers the three calls the reconciler needs:
//! - add a role to a cluster
//! - remove a role from a cluster
//! - describe the roles attached to a cluster
//!
//! Errors are reported through [`ApiError`], whose predicates
//! ([`ApiError::is_already_absent`], [`ApiError::is_already_exists`],
//! [`ApiError::is_retryable`]) let callers treat replayed requests as
//! successes.

mod error;
mod traits;
mod types;

pub use error::{ApiError, ErrorCategory};
pub use traits::ClusterRoleApi;
pub use types::{AddRoleRequest, ClusterRole, RemoveRoleRequest};

/// Type alias for an API result.
pub type ApiResult<T> = Result<T, ApiError>;

/// Type alias for a shared API client.
pub type DynClusterRoleApi = std::sync::Arc<dyn ClusterRoleApi>;
