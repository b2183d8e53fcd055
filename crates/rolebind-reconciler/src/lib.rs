//! Reconciliation of role associations against an eventually consistent API.
//!
//! Adding or removing a role returns immediately, but the association moves
//! through `PENDING`/`DELETING` before it is observably `ACTIVE` or gone.
//! This crate turns those calls into operations that only return once the
//! remote side matches:
//!
//! - [`RemoteStateReader`] looks an association up, treating a missing parent
//!   and a missing association alike as "absent"
//! - [`ConvergencePoller`] polls a lookup until a [`WaitCondition`] holds,
//!   with a timeout and a cancellation token
//! - [`AssociationReconciler`] builds create, read (drift detection), delete,
//!   the ACTIVE exists-check, forced removal, import and the destroy check on
//!   top of them
//!
//! # Example
//!
//! ```ignore
//! use rolebind_reconciler::{AssociationReconciler, ReconcilerConfig};
//! use rolebind_core::{AssociationAttributes, AssociationKey};
//! use tokio_util::sync::CancellationToken;
//!
//! let reconciler = AssociationReconciler::new(api, ReconcilerConfig::default());
//! let key = AssociationKey::new("cluster-A", "arn:aws:iam::123456789012:role/rds-s3")?;
//! let attrs = AssociationAttributes::new().with_feature_name("s3Import");
//!
//! let record = reconciler.create(&key, &attrs, &CancellationToken::new()).await?;
//! assert!(record.is_active());
//! ```

pub mod config;
pub mod error;
pub mod poller;
pub mod reader;
pub mod reconciler;

pub use config::ReconcilerConfig;
pub use error::{ErrorCategory, ObservedState, ReconcileError, Result};
pub use poller::{ConvergencePoller, ParentGonePolicy, WaitCondition, associated, disassociated};
pub use reader::{AssociationLookup, Observation, RemoteStateReader};
pub use reconciler::{AssociationReconciler, ReadOutcome};

pub use tokio_util::sync::CancellationToken;
