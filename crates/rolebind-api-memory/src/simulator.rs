use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use papaya::HashMap as PapayaHashMap;
use rolebind_api::{
    AddRoleRequest, ApiError, ClusterRole, ClusterRoleApi, RemoveRoleRequest,
};
use tokio::sync::Mutex;
use tracing::debug;

use crate::factory::SimulationOptions;

const STATUS_ACTIVE: &str = "ACTIVE";
const STATUS_PENDING: &str = "PENDING";
const STATUS_DELETING: &str = "DELETING";

/// The calls a fault can be injected into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApiOperation {
    AddRole,
    RemoveRole,
    DescribeRoles,
}

#[derive(Debug, Clone)]
struct SimRole {
    role_id: String,
    feature_name: Option<String>,
    status: String,
    /// Describe calls left before a transitional status advances.
    remaining_polls: u32,
}

impl SimRole {
    fn is_transitional(&self) -> bool {
        self.status == STATUS_PENDING || self.status == STATUS_DELETING
    }
}

#[derive(Debug, Default)]
struct ClusterEntry {
    roles: Vec<SimRole>,
}

/// In-memory simulation of the cluster role API.
///
/// Associations move through the same states the real service reports:
/// an added role is `PENDING` for [`SimulationOptions::pending_polls`]
/// describe calls before turning `ACTIVE`, and a removed role is `DELETING`
/// for [`SimulationOptions::deleting_polls`] describe calls before it
/// disappears. Time plays no part; state only advances when the cluster is
/// described, which keeps tests deterministic.
///
/// Besides the [`ClusterRoleApi`] calls, the simulator exposes out-of-band
/// hooks (deleting clusters, dropping roles, forcing statuses) and a fault
/// queue per operation.
#[derive(Debug)]
pub struct InMemoryClusterApi {
    clusters: Arc<PapayaHashMap<String, Arc<Mutex<ClusterEntry>>>>,
    faults: Mutex<VecDeque<(ApiOperation, ApiError)>>,
    add_calls: AtomicU64,
    remove_calls: AtomicU64,
    describe_calls: AtomicU64,
    options: SimulationOptions,
}

impl InMemoryClusterApi {
    /// Creates an empty simulator with default options.
    pub fn new() -> Self {
        Self::with_options(SimulationOptions::default())
    }

    /// Creates an empty simulator with the given options.
    pub fn with_options(options: SimulationOptions) -> Self {
        Self {
            clusters: Arc::new(PapayaHashMap::new()),
            faults: Mutex::new(VecDeque::new()),
            add_calls: AtomicU64::new(0),
            remove_calls: AtomicU64::new(0),
            describe_calls: AtomicU64::new(0),
            options,
        }
    }

    pub fn options(&self) -> &SimulationOptions {
        &self.options
    }

    /// Registers a cluster with no roles. Existing clusters are left as is.
    pub fn create_cluster(&self, cluster_id: impl Into<String>) {
        let guard = self.clusters.pin();
        let cluster_id = cluster_id.into();
        if !guard.contains_key(&cluster_id) {
            guard.insert(cluster_id, Arc::new(Mutex::new(ClusterEntry::default())));
        }
    }

    /// Deletes a cluster and every association under it, bypassing the API.
    pub fn delete_cluster(&self, cluster_id: &str) -> bool {
        self.clusters.pin().remove(cluster_id).is_some()
    }

    pub fn cluster_exists(&self, cluster_id: &str) -> bool {
        self.clusters.pin().contains_key(cluster_id)
    }

    /// Drops a role from a cluster immediately, bypassing the API.
    pub async fn remove_role_out_of_band(&self, cluster_id: &str, role_id: &str) -> bool {
        let Some(entry) = self.cluster(cluster_id) else {
            return false;
        };
        let mut entry = entry.lock().await;
        let before = entry.roles.len();
        entry.roles.retain(|r| r.role_id != role_id);
        entry.roles.len() != before
    }

    /// Overwrites the raw status of an associated role, bypassing the API.
    ///
    /// The forced status does not advance on describe unless it is
    /// `PENDING` or `DELETING`, in which case it advances on the next one.
    pub async fn set_role_status(&self, cluster_id: &str, role_id: &str, status: &str) -> bool {
        let Some(entry) = self.cluster(cluster_id) else {
            return false;
        };
        let mut entry = entry.lock().await;
        match entry.roles.iter_mut().find(|r| r.role_id == role_id) {
            Some(role) => {
                role.status = status.to_string();
                role.remaining_polls = 0;
                true
            }
            None => false,
        }
    }

    /// Number of roles currently attached to a cluster, in any state.
    pub async fn role_count(&self, cluster_id: &str) -> usize {
        match self.cluster(cluster_id) {
            Some(entry) => entry.lock().await.roles.len(),
            None => 0,
        }
    }

    /// Queues a fault returned by the next call of `operation`.
    ///
    /// Faults for the same operation are consumed in the order queued.
    pub async fn inject_fault(&self, operation: ApiOperation, error: ApiError) {
        self.faults.lock().await.push_back((operation, error));
    }

    /// How many times `operation` has been called, including faulted calls.
    pub fn call_count(&self, operation: ApiOperation) -> u64 {
        self.counter(operation).load(Ordering::SeqCst)
    }

    fn counter(&self, operation: ApiOperation) -> &AtomicU64 {
        match operation {
            ApiOperation::AddRole => &self.add_calls,
            ApiOperation::RemoveRole => &self.remove_calls,
            ApiOperation::DescribeRoles => &self.describe_calls,
        }
    }

    fn cluster(&self, cluster_id: &str) -> Option<Arc<Mutex<ClusterEntry>>> {
        self.clusters.pin().get(cluster_id).cloned()
    }

    async fn enter(&self, operation: ApiOperation) -> Result<(), ApiError> {
        self.counter(operation).fetch_add(1, Ordering::SeqCst);
        let mut faults = self.faults.lock().await;
        if let Some(pos) = faults.iter().position(|(op, _)| *op == operation) {
            if let Some((_, error)) = faults.remove(pos) {
                debug!(operation = ?operation, error = %error, "Injected fault");
                return Err(error);
            }
        }
        Ok(())
    }
}

impl Default for InMemoryClusterApi {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ClusterRoleApi for InMemoryClusterApi {
    async fn add_role_to_cluster(&self, request: &AddRoleRequest) -> Result<(), ApiError> {
        self.enter(ApiOperation::AddRole).await?;

        let entry = self
            .cluster(&request.cluster_id)
            .ok_or_else(|| ApiError::cluster_not_found(&request.cluster_id))?;
        let mut entry = entry.lock().await;

        if let Some(existing) = entry.roles.iter().find(|r| r.role_id == request.role_id) {
            if existing.status == STATUS_DELETING {
                return Err(ApiError::invalid_cluster_state(
                    &request.cluster_id,
                    format!("role {} is being removed", request.role_id),
                ));
            }
            return Err(ApiError::role_already_exists(
                &request.cluster_id,
                &request.role_id,
            ));
        }

        if let Some(max) = self.options.max_roles_per_cluster {
            if entry.roles.len() >= max {
                return Err(ApiError::quota_exceeded(&request.cluster_id));
            }
        }

        entry.roles.push(SimRole {
            role_id: request.role_id.clone(),
            feature_name: request.feature_name.clone(),
            status: STATUS_PENDING.to_string(),
            remaining_polls: self.options.pending_polls,
        });
        debug!(
            cluster_id = %request.cluster_id,
            role_id = %request.role_id,
            "Role association accepted"
        );
        Ok(())
    }

    async fn remove_role_from_cluster(&self, request: &RemoveRoleRequest) -> Result<(), ApiError> {
        self.enter(ApiOperation::RemoveRole).await?;

        let entry = self
            .cluster(&request.cluster_id)
            .ok_or_else(|| ApiError::cluster_not_found(&request.cluster_id))?;
        let mut entry = entry.lock().await;

        let role = entry
            .roles
            .iter_mut()
            .find(|r| r.role_id == request.role_id)
            .ok_or_else(|| ApiError::role_not_found(&request.cluster_id, &request.role_id))?;

        if role.status != STATUS_DELETING {
            role.status = STATUS_DELETING.to_string();
            role.remaining_polls = self.options.deleting_polls;
        }
        debug!(
            cluster_id = %request.cluster_id,
            role_id = %request.role_id,
            "Role removal accepted"
        );
        Ok(())
    }

    async fn describe_cluster_roles(&self, cluster_id: &str) -> Result<Vec<ClusterRole>, ApiError> {
        self.enter(ApiOperation::DescribeRoles).await?;

        let entry = self
            .cluster(cluster_id)
            .ok_or_else(|| ApiError::cluster_not_found(cluster_id))?;
        let mut entry = entry.lock().await;

        // Advance transitions that have run out of polls before reporting.
        entry.roles.retain(|r| !(r.status == STATUS_DELETING && r.remaining_polls == 0));
        for role in entry.roles.iter_mut() {
            if role.status == STATUS_PENDING && role.remaining_polls == 0 {
                role.status = STATUS_ACTIVE.to_string();
            }
        }

        let roles = entry
            .roles
            .iter()
            .map(|r| {
                ClusterRole::new(&r.role_id, &r.status).with_feature_name(r.feature_name.clone())
            })
            .collect();

        for role in entry.roles.iter_mut().filter(|r| r.is_transitional()) {
            role.remaining_polls = role.remaining_polls.saturating_sub(1);
        }

        Ok(roles)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory"
    }
}
