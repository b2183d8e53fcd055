use std::fmt;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::id::AssociationKey;

/// Lifecycle state of an association as reported by the remote API.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AssociationStatus {
    Active,
    Pending,
    Deleting,
    /// Any status the API reports that is not one of the above, kept verbatim.
    Unknown(String),
}

impl AssociationStatus {
    pub fn from_raw(raw: &str) -> Self {
        match raw {
            "ACTIVE" => Self::Active,
            "PENDING" => Self::Pending,
            "DELETING" => Self::Deleting,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "ACTIVE",
            Self::Pending => "PENDING",
            Self::Deleting => "DELETING",
            Self::Unknown(raw) => raw,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl From<String> for AssociationStatus {
    fn from(raw: String) -> Self {
        Self::from_raw(&raw)
    }
}

impl From<AssociationStatus> for String {
    fn from(status: AssociationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for AssociationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attributes sent along with add/remove calls.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationAttributes {
    /// Feature discriminator the role is attached for (e.g. `s3Import`).
    #[serde(rename = "featureName", skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
}

impl AssociationAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feature_name(mut self, feature_name: impl Into<String>) -> Self {
        self.feature_name = Some(feature_name.into());
        self
    }
}

/// Snapshot of one association as observed on the remote side.
///
/// Never cached: a record describes the instant it was fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssociationRecord {
    pub key: AssociationKey,
    pub status: AssociationStatus,
    #[serde(rename = "featureName", skip_serializing_if = "Option::is_none")]
    pub feature_name: Option<String>,
    #[serde(rename = "observedAt", with = "time::serde::rfc3339")]
    pub observed_at: OffsetDateTime,
}

impl AssociationRecord {
    pub fn new(key: AssociationKey, status: AssociationStatus) -> Self {
        Self {
            key,
            status,
            feature_name: None,
            observed_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn with_feature_name(mut self, feature_name: Option<String>) -> Self {
        self.feature_name = feature_name;
        self
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }

    /// Attributes needed to address this association in a remove call.
    pub fn attributes(&self) -> AssociationAttributes {
        AssociationAttributes {
            feature_name: self.feature_name.clone(),
        }
    }
}
