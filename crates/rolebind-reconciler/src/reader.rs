//! Remote state lookup for a single association.

use async_trait::async_trait;
use rolebind_api::{ApiError, ClusterRole, DynClusterRoleApi};
use rolebind_core::{AssociationKey, AssociationRecord, AssociationStatus};
use tracing::debug;

use crate::error::ObservedState;

/// What a single lookup saw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observation {
    /// The association exists in the reported state.
    Present(AssociationRecord),
    /// The parent exists but the association does not.
    Absent,
    /// The parent itself does not exist.
    ParentMissing,
}

impl Observation {
    /// Collapses both "absent" cases into `None`.
    pub fn into_record(self) -> Option<AssociationRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Absent | Self::ParentMissing => None,
        }
    }

    pub fn state(&self) -> ObservedState {
        match self {
            Self::Present(record) => ObservedState::Status(record.status.clone()),
            Self::Absent => ObservedState::Absent,
            Self::ParentMissing => ObservedState::ParentMissing,
        }
    }
}

/// Source of association state the poller can wait on.
///
/// Implementations never report "not found" as an error: errors are reserved
/// for transport, authorization and unexpected API failures.
#[async_trait]
pub trait AssociationLookup: Send + Sync {
    /// Fetches the current state of `key`, distinguishing a missing parent
    /// from a missing association.
    async fn observe(&self, key: &AssociationKey) -> Result<Observation, ApiError>;

    /// Fetches the current record for `key`, or `None` when either the
    /// parent or the association is absent.
    async fn lookup(&self, key: &AssociationKey) -> Result<Option<AssociationRecord>, ApiError> {
        Ok(self.observe(key).await?.into_record())
    }
}

/// Reads association state by describing the parent cluster's roles.
#[derive(Clone)]
pub struct RemoteStateReader {
    api: DynClusterRoleApi,
}

impl RemoteStateReader {
    pub fn new(api: DynClusterRoleApi) -> Self {
        Self { api }
    }

    fn to_record(key: &AssociationKey, role: ClusterRole) -> AssociationRecord {
        AssociationRecord::new(key.clone(), AssociationStatus::from_raw(&role.status))
            .with_feature_name(role.feature_name)
    }
}

impl std::fmt::Debug for RemoteStateReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteStateReader")
            .field("backend", &self.api.backend_name())
            .finish()
    }
}

#[async_trait]
impl AssociationLookup for RemoteStateReader {
    /// Matches on the role alone. The feature name is reported on the
    /// record but not used to select it, so a role attached under a
    /// different feature still counts as present.
    async fn observe(&self, key: &AssociationKey) -> Result<Observation, ApiError> {
        let roles = match self.api.describe_cluster_roles(key.parent_id()).await {
            Ok(roles) => roles,
            Err(e) if e.is_cluster_not_found() => {
                debug!(key = %key, "Parent cluster not found");
                return Ok(Observation::ParentMissing);
            }
            Err(e) => return Err(e),
        };

        let observation = roles
            .into_iter()
            .find(|role| role.role_id == key.member_id())
            .map(|role| Observation::Present(Self::to_record(key, role)))
            .unwrap_or(Observation::Absent);

        debug!(key = %key, state = %observation.state(), "Observed association");
        Ok(observation)
    }
}
