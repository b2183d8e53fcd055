//! Association keys and their composite identifier form.
//!
//! An association is addressed by the ordered pair (parent cluster identifier,
//! member role identifier). The pair is persisted as a single opaque string
//! `<parent><ID_DELIMITER><member>`, so neither component may contain the
//! delimiter. Keys are validated on construction; an `AssociationKey` value is
//! always encodable.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{CoreError, Result};

/// Reserved separator between the two key components.
pub const ID_DELIMITER: char = ',';

/// Ordered (parent, member) pair identifying one association.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AssociationKey {
    parent_id: String,
    member_id: String,
}

impl AssociationKey {
    /// Builds a key, rejecting empty components and components containing
    /// [`ID_DELIMITER`].
    pub fn new(parent_id: impl Into<String>, member_id: impl Into<String>) -> Result<Self> {
        let parent_id = parent_id.into();
        let member_id = member_id.into();
        validate_component("parent_id", &parent_id)?;
        validate_component("member_id", &member_id)?;
        Ok(Self {
            parent_id,
            member_id,
        })
    }

    /// Identifier of the parent resource (the data cluster).
    pub fn parent_id(&self) -> &str {
        &self.parent_id
    }

    /// Identifier of the associated member (the role).
    pub fn member_id(&self) -> &str {
        &self.member_id
    }

    /// The composite identifier for this key.
    pub fn composite_id(&self) -> String {
        format!("{}{ID_DELIMITER}{}", self.parent_id, self.member_id)
    }
}

fn validate_component(field: &'static str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::invalid_key(field, "must not be empty"));
    }
    if value.contains(ID_DELIMITER) {
        return Err(CoreError::invalid_key(
            field,
            format!("must not contain the reserved delimiter {ID_DELIMITER:?}: {value:?}"),
        ));
    }
    Ok(())
}

/// Encodes a (parent, member) pair into its composite identifier.
pub fn encode_id(parent_id: &str, member_id: &str) -> Result<String> {
    AssociationKey::new(parent_id, member_id).map(|key| key.composite_id())
}

/// Decodes a composite identifier back into its key.
///
/// Fails unless the identifier splits into exactly two non-empty segments.
pub fn decode_id(id: &str) -> Result<AssociationKey> {
    let segments: Vec<&str> = id.split(ID_DELIMITER).collect();
    match segments.as_slice() {
        [parent, member] if !parent.is_empty() && !member.is_empty() => Ok(AssociationKey {
            parent_id: (*parent).to_string(),
            member_id: (*member).to_string(),
        }),
        [_, _] => Err(CoreError::malformed_id(id, "empty segment")),
        other => Err(CoreError::malformed_id(
            id,
            format!(
                "expected 2 segments separated by {ID_DELIMITER:?}, found {}",
                other.len()
            ),
        )),
    }
}

impl fmt::Display for AssociationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{ID_DELIMITER}{}", self.parent_id, self.member_id)
    }
}

impl FromStr for AssociationKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        decode_id(s)
    }
}

impl Serialize for AssociationKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for AssociationKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        decode_id(&raw).map_err(serde::de::Error::custom)
    }
}
