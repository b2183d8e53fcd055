pub mod association;
pub mod error;
pub mod id;

pub use association::{AssociationAttributes, AssociationRecord, AssociationStatus};
pub use error::{CoreError, ErrorCategory, Result};
pub use id::{AssociationKey, ID_DELIMITER, decode_id, encode_id};
