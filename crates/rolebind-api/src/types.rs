//! Request and response types for the cluster role API.

use rolebind_core::{AssociationAttributes, AssociationKey};
use serde::{Deserialize, Serialize};

/// Input for associating a role with a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddRoleRequest {
    /// The cluster to attach the role to.
    #[serde(rename = "DBClusterIdentifier")]
    pub cluster_id: String,
    /// The role to attach.
    #[serde(rename = "RoleArn")]
    pub role_id: String,
    /// Feature the role is attached for, if any.
    #[serde(rename = "FeatureName", skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
}

impl AddRoleRequest {
    /// Builds a request addressing `key` with the given attributes.
    #[must_use]
    pub fn new(key: &AssociationKey, attrs: &AssociationAttributes) -> Self {
        Self {
            cluster_id: key.parent_id().to_string(),
            role_id: key.member_id().to_string(),
            feature_name: attrs.feature_name.clone(),
        }
    }
}

/// Input for removing a role from a cluster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveRoleRequest {
    /// The cluster to detach the role from.
    #[serde(rename = "DBClusterIdentifier")]
    pub cluster_id: String,
    /// The role to detach.
    #[serde(rename = "RoleArn")]
    pub role_id: String,
    /// Feature the role was attached for, if any.
    #[serde(rename = "FeatureName", skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
}

impl RemoveRoleRequest {
    /// Builds a request addressing `key` with the given attributes.
    #[must_use]
    pub fn new(key: &AssociationKey, attrs: &AssociationAttributes) -> Self {
        Self {
            cluster_id: key.parent_id().to_string(),
            role_id: key.member_id().to_string(),
            feature_name: attrs.feature_name.clone(),
        }
    }
}

/// One role entry as listed on a cluster description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterRole {
    /// The associated role.
    #[serde(rename = "RoleArn")]
    pub role_id: String,
    /// Raw lifecycle status (`ACTIVE`, `PENDING`, `INVALID`, ...).
    #[serde(rename = "Status")]
    pub status: String,
    /// Feature the role is attached for, if any.
    #[serde(rename = "FeatureName", skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
}

impl ClusterRole {
    /// Creates a new `ClusterRole`.
    #[must_use]
    pub fn new(role_id: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            role_id: role_id.into(),
            status: status.into(),
            feature_name: None,
        }
    }

    /// Sets the feature name.
    #[must_use]
    pub fn with_feature_name(mut self, feature_name: Option<String>) -> Self {
        self.feature_name = feature_name;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requests_from_key() {
        let key = AssociationKey::new("cluster-A", "role-arn-X").unwrap();
        let attrs = AssociationAttributes::new().with_feature_name("s3Import");

        let add = AddRoleRequest::new(&key, &attrs);
        assert_eq!(add.cluster_id, "cluster-A");
        assert_eq!(add.role_id, "role-arn-X");
        assert_eq!(add.feature_name.as_deref(), Some("s3Import"));

        let remove = RemoveRoleRequest::new(&key, &AssociationAttributes::new());
        assert_eq!(remove.feature_name, None);
    }

    #[test]
    fn test_cluster_role_wire_names() {
        let role = ClusterRole::new("role-arn-X", "PENDING")
            .with_feature_name(Some("s3Import".to_string()));
        let json = serde_json::to_value(&role).unwrap();
        assert_eq!(json["RoleArn"], "role-arn-X");
        assert_eq!(json["Status"], "PENDING");
        assert_eq!(json["FeatureName"], "s3Import");
    }
}
