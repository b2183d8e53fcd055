use rolebind_api::{AddRoleRequest, DynClusterRoleApi, RemoveRoleRequest};
use rolebind_core::{AssociationAttributes, AssociationKey, AssociationRecord, decode_id};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ReconcilerConfig;
use crate::error::{ReconcileError, Result};
use crate::poller::{ConvergencePoller, WaitCondition};
use crate::reader::{AssociationLookup, RemoteStateReader};

/// Result of reading an association back from the remote side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    /// The association exists.
    Present(AssociationRecord),
    /// The association (or its parent) no longer exists. The persisted
    /// composite ID should be dropped or the association re-created.
    Drifted,
}

impl ReadOutcome {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn record(&self) -> Option<&AssociationRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Drifted => None,
        }
    }

    pub fn into_record(self) -> Option<AssociationRecord> {
        match self {
            Self::Present(record) => Some(record),
            Self::Drifted => None,
        }
    }
}

/// Drives associations between clusters and roles to their desired state.
///
/// Each mutating operation issues its API call and then waits until the
/// remote side is observed in the expected end state before returning, so a
/// successful return means the remote state matches. The reconciler keeps no
/// state of its own and does no locking: callers must not run two mutating
/// operations for the same key at once, while operations on different keys
/// can share one reconciler freely.
#[derive(Clone)]
pub struct AssociationReconciler {
    api: DynClusterRoleApi,
    reader: RemoteStateReader,
    poller: ConvergencePoller,
    config: ReconcilerConfig,
}

impl std::fmt::Debug for AssociationReconciler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AssociationReconciler")
            .field("backend", &self.api.backend_name())
            .field("config", &self.config)
            .finish()
    }
}

impl AssociationReconciler {
    pub fn new(api: DynClusterRoleApi, config: ReconcilerConfig) -> Self {
        let poller = ConvergencePoller::new(config.poll_interval).with_jitter(config.jitter_ratio);
        Self {
            reader: RemoteStateReader::new(api.clone()),
            api,
            poller,
            config,
        }
    }

    pub fn config(&self) -> &ReconcilerConfig {
        &self.config
    }

    pub fn reader(&self) -> &RemoteStateReader {
        &self.reader
    }

    /// Associates the role with the cluster and waits until it is ACTIVE.
    ///
    /// An association that already exists is not an error: the call then
    /// only waits for it to be ACTIVE. On timeout the association may still
    /// be forming remotely and the whole call can be retried.
    pub async fn create(
        &self,
        key: &AssociationKey,
        attrs: &AssociationAttributes,
        cancel: &CancellationToken,
    ) -> Result<AssociationRecord> {
        match self
            .api
            .add_role_to_cluster(&AddRoleRequest::new(key, attrs))
            .await
        {
            Ok(()) => debug!(key = %key, "Role association requested"),
            Err(e) if e.is_already_exists() => {
                debug!(key = %key, "Role already associated, waiting for ACTIVE");
            }
            Err(e) if e.is_cluster_not_found() => {
                return Err(ReconcileError::ParentNotFound { key: key.clone() });
            }
            Err(e) => return Err(ReconcileError::from_api(key, e)),
        }

        let record = self
            .poller
            .wait_for(
                &self.reader,
                key,
                &WaitCondition::associated(),
                self.config.create_timeout,
                cancel,
            )
            .await?
            .ok_or_else(|| ReconcileError::not_found(key))?;

        info!(
            key = %key,
            feature_name = ?record.feature_name,
            "Role association is active"
        );
        Ok(record)
    }

    /// Reads the association once.
    ///
    /// A missing association, or a missing parent cluster, is reported as
    /// [`ReadOutcome::Drifted`] rather than an error.
    pub async fn read(&self, key: &AssociationKey) -> Result<ReadOutcome> {
        let record = self
            .reader
            .lookup(key)
            .await
            .map_err(|e| ReconcileError::from_api(key, e))?;

        match record {
            Some(record) => Ok(ReadOutcome::Present(record)),
            None => {
                warn!(key = %key, "Role association not found, removing from state");
                Ok(ReadOutcome::Drifted)
            }
        }
    }

    /// [`read`](Self::read) addressed by composite ID.
    pub async fn read_id(&self, id: &str) -> Result<ReadOutcome> {
        let key = decode_id(id)?;
        self.read(&key).await
    }

    /// Removes the role from the cluster and waits until it is gone.
    ///
    /// A missing cluster or an association that is already gone counts as
    /// success without waiting.
    pub async fn delete(
        &self,
        key: &AssociationKey,
        attrs: &AssociationAttributes,
        cancel: &CancellationToken,
    ) -> Result<()> {
        match self
            .api
            .remove_role_from_cluster(&RemoveRoleRequest::new(key, attrs))
            .await
        {
            Ok(()) => debug!(key = %key, "Role removal requested"),
            Err(e) if e.is_already_absent() => {
                debug!(key = %key, error = %e, "Role association already gone");
                return Ok(());
            }
            Err(e) => return Err(ReconcileError::from_api(key, e)),
        }

        self.wait_disassociated(key, cancel).await?;
        info!(key = %key, "Role association removed");
        Ok(())
    }

    /// [`delete`](Self::delete) addressed by composite ID.
    pub async fn delete_id(
        &self,
        id: &str,
        attrs: &AssociationAttributes,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let key = decode_id(id)?;
        self.delete(&key, attrs, cancel).await
    }

    /// Fails with [`ReconcileError::UnexpectedState`] unless the association
    /// currently exists and is ACTIVE.
    pub async fn ensure_active(&self, key: &AssociationKey) -> Result<AssociationRecord> {
        let record = self
            .reader
            .lookup(key)
            .await
            .map_err(|e| ReconcileError::from_api(key, e))?
            .ok_or_else(|| ReconcileError::unexpected_state(key, "ACTIVE", "absent"))?;

        if !record.is_active() {
            return Err(ReconcileError::unexpected_state(
                key,
                "ACTIVE",
                record.status.as_str(),
            ));
        }
        Ok(record)
    }

    /// Removes an ACTIVE association from outside the normal delete flow.
    ///
    /// Refuses to touch an association that is still transitioning, so a
    /// concurrent create or delete is never raced. The feature name for the
    /// remove call is taken from the observed record.
    pub async fn force_remove(
        &self,
        key: &AssociationKey,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let record = self.ensure_active(key).await?;

        match self
            .api
            .remove_role_from_cluster(&RemoveRoleRequest::new(key, &record.attributes()))
            .await
        {
            Ok(()) => {}
            Err(e) if e.is_already_absent() => return Ok(()),
            Err(e) => return Err(ReconcileError::from_api(key, e)),
        }

        self.wait_disassociated(key, cancel).await?;
        info!(key = %key, "Role association forcibly removed");
        Ok(())
    }

    /// Resolves a composite ID into the record to persist for it.
    pub async fn import(&self, id: &str) -> Result<AssociationRecord> {
        let key = decode_id(id)?;
        self.read(&key)
            .await?
            .into_record()
            .ok_or_else(|| ReconcileError::not_found(&key))
    }

    /// Checks that none of `keys` still exists remotely.
    ///
    /// A missing parent cluster counts as destroyed.
    pub async fn verify_destroyed<'a, I>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = &'a AssociationKey>,
    {
        for key in keys {
            let record = self
                .reader
                .lookup(key)
                .await
                .map_err(|e| ReconcileError::from_api(key, e))?;

            if let Some(record) = record {
                return Err(ReconcileError::unexpected_state(
                    key,
                    "absent",
                    record.status.as_str(),
                ));
            }
        }
        Ok(())
    }

    async fn wait_disassociated(
        &self,
        key: &AssociationKey,
        cancel: &CancellationToken,
    ) -> Result<()> {
        self.poller
            .wait_for(
                &self.reader,
                key,
                &WaitCondition::disassociated(),
                self.config.delete_timeout,
                cancel,
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rolebind_api::{ApiError, ClusterRoleApi};
    use rolebind_api_memory::{ApiOperation, InMemoryClusterApi, SimulationOptions};
    use rolebind_core::AssociationStatus;
    use std::sync::Arc;
    use std::time::Duration;
    use tokio::time::Instant;

    const INTERVAL: Duration = Duration::from_secs(5);

    fn key() -> AssociationKey {
        AssociationKey::new("cluster-A", "role-arn-X").unwrap()
    }

    fn attrs() -> AssociationAttributes {
        AssociationAttributes::new().with_feature_name("s3Import")
    }

    fn setup(
        pending_polls: u32,
        deleting_polls: u32,
    ) -> (Arc<InMemoryClusterApi>, AssociationReconciler) {
        let api = Arc::new(InMemoryClusterApi::with_options(SimulationOptions {
            pending_polls,
            deleting_polls,
            max_roles_per_cluster: None,
        }));
        api.create_cluster("cluster-A");
        let config = ReconcilerConfig::fixed(
            INTERVAL,
            Duration::from_secs(60),
            Duration::from_secs(120),
        );
        let reconciler = AssociationReconciler::new(api.clone(), config);
        (api, reconciler)
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_waits_for_active() {
        let (api, reconciler) = setup(2, 0);
        let started = Instant::now();

        let record = reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(record.status, AssociationStatus::Active);
        assert_eq!(record.feature_name.as_deref(), Some("s3Import"));
        assert_eq!(api.call_count(ApiOperation::AddRole), 1);
        assert_eq!(api.call_count(ApiOperation::DescribeRoles), 3);
        assert_eq!(started.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_twice_is_idempotent() {
        let (api, reconciler) = setup(1, 0);
        let cancel = CancellationToken::new();

        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();
        let record = reconciler.create(&key(), &attrs(), &cancel).await.unwrap();

        assert!(record.is_active());
        assert_eq!(api.role_count("cluster-A").await, 1);
        assert_eq!(api.call_count(ApiOperation::AddRole), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_times_out() {
        let (api, _) = setup(100, 0);
        let reconciler = AssociationReconciler::new(
            api.clone(),
            ReconcilerConfig::fixed(INTERVAL, INTERVAL * 2, INTERVAL * 2),
        );

        let err = reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert!(err.is_retryable());

        // The association keeps forming remotely; a retry picks it up.
        assert_eq!(api.role_count("cluster-A").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_on_missing_cluster() {
        let (api, reconciler) = setup(0, 0);
        api.delete_cluster("cluster-A");

        let err = reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::ParentNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_create_propagates_transient_add_failure() {
        let (api, reconciler) = setup(0, 0);
        api.inject_fault(ApiOperation::AddRole, ApiError::throttled("Rate exceeded"))
            .await;

        let err = reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::TransientApi { .. }));
        assert_eq!(api.call_count(ApiOperation::DescribeRoles), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_present_and_drifted() {
        let (api, reconciler) = setup(0, 0);
        let cancel = CancellationToken::new();

        assert_eq!(reconciler.read(&key()).await.unwrap(), ReadOutcome::Drifted);

        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();
        let outcome = reconciler.read(&key()).await.unwrap();
        assert!(outcome.is_present());
        assert!(outcome.record().unwrap().is_active());

        api.remove_role_out_of_band("cluster-A", "role-arn-X").await;
        let outcome = reconciler.read_id("cluster-A,role-arn-X").await.unwrap();
        assert!(!outcome.is_present());
        assert!(outcome.record().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_rejects_malformed_id() {
        let (_, reconciler) = setup(0, 0);
        let err = reconciler.read_id("cluster-A").await.unwrap_err();
        assert!(err.is_invalid_input());
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_waits_until_gone() {
        let (api, reconciler) = setup(0, 2);
        let cancel = CancellationToken::new();
        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();

        let started = Instant::now();
        reconciler.delete(&key(), &attrs(), &cancel).await.unwrap();

        assert_eq!(api.role_count("cluster-A").await, 0);
        assert_eq!(started.elapsed(), INTERVAL * 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_times_out() {
        let (api, reconciler) = setup(0, 100);
        let cancel = CancellationToken::new();
        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();

        let started = Instant::now();
        let err = reconciler
            .delete(&key(), &attrs(), &cancel)
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            ReconcileError::ConvergenceTimeout { target: "disassociated", .. }
        ));
        assert_eq!(started.elapsed(), reconciler.config().delete_timeout);
        // Still DELETING remotely; a retry keeps waiting on the same removal.
        assert_eq!(api.role_count("cluster-A").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_absent_is_success() {
        let (api, reconciler) = setup(0, 0);
        reconciler
            .delete(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(api.call_count(ApiOperation::DescribeRoles), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_parent_gone_is_success() {
        let (api, reconciler) = setup(0, 0);
        api.inject_fault(
            ApiOperation::RemoveRole,
            ApiError::cluster_not_found("cluster-A"),
        )
        .await;
        reconciler
            .delete(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_parent_deleted_mid_wait() {
        let (api, reconciler) = setup(0, 100);
        let cancel = CancellationToken::new();
        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();

        let remover = api.clone();
        tokio::spawn(async move {
            tokio::time::sleep(INTERVAL * 2 + Duration::from_secs(1)).await;
            remover.delete_cluster("cluster-A");
        });

        reconciler.delete(&key(), &attrs(), &cancel).await.unwrap();
        assert!(!api.cluster_exists("cluster-A"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_delete_cancelled() {
        let (api, reconciler) = setup(0, 100);
        reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(7)).await;
            trigger.cancel();
        });

        let err = reconciler
            .delete(&key(), &attrs(), &cancel)
            .await
            .unwrap_err();
        assert!(err.is_cancelled());
        assert!(!err.is_timeout());
        assert_eq!(api.role_count("cluster-A").await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_ensure_active() {
        let (api, reconciler) = setup(3, 0);

        let err = reconciler.ensure_active(&key()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnexpectedState { ref actual, .. } if actual == "absent"
        ));

        api.add_role_to_cluster(&AddRoleRequest::new(&key(), &attrs()))
            .await
            .unwrap();
        let err = reconciler.ensure_active(&key()).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnexpectedState { ref actual, .. } if actual == "PENDING"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_remove() {
        let (api, reconciler) = setup(0, 1);
        let cancel = CancellationToken::new();
        reconciler.create(&key(), &attrs(), &cancel).await.unwrap();

        reconciler.force_remove(&key(), &cancel).await.unwrap();
        assert_eq!(api.role_count("cluster-A").await, 0);
        assert_eq!(reconciler.read(&key()).await.unwrap(), ReadOutcome::Drifted);
    }

    #[tokio::test(start_paused = true)]
    async fn test_force_remove_refuses_transitional_state() {
        let (api, reconciler) = setup(5, 0);
        api.add_role_to_cluster(&AddRoleRequest::new(&key(), &attrs()))
            .await
            .unwrap();

        let err = reconciler
            .force_remove(&key(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, ReconcileError::UnexpectedState { .. }));
        assert_eq!(api.call_count(ApiOperation::RemoveRole), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_import() {
        let (_, reconciler) = setup(0, 0);
        let err = reconciler.import("cluster-A,role-arn-X").await.unwrap_err();
        assert!(matches!(err, ReconcileError::NotFound { .. }));

        reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();
        let record = reconciler.import("cluster-A,role-arn-X").await.unwrap();
        assert_eq!(record.key, key());
        assert_eq!(record.feature_name.as_deref(), Some("s3Import"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_verify_destroyed() {
        let (api, reconciler) = setup(0, 0);
        let other = AssociationKey::new("cluster-B", "role-arn-X").unwrap();
        reconciler.verify_destroyed([&key(), &other]).await.unwrap();

        reconciler
            .create(&key(), &attrs(), &CancellationToken::new())
            .await
            .unwrap();
        let err = reconciler.verify_destroyed([&key()]).await.unwrap_err();
        assert!(matches!(
            err,
            ReconcileError::UnexpectedState { ref expected, .. } if expected == "absent"
        ));

        api.delete_cluster("cluster-A");
        reconciler.verify_destroyed([&key()]).await.unwrap();
    }
}
