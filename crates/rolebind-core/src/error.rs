use thiserror::Error;

/// Core error types for association keys and identifiers
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error("Invalid association key ({field}): {reason}")]
    InvalidKey { field: &'static str, reason: String },

    #[error("Malformed association ID {id:?}: {reason}")]
    MalformedId { id: String, reason: String },
}

impl CoreError {
    /// Create a new InvalidKey error for the named key component
    pub fn invalid_key(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidKey {
            field,
            reason: reason.into(),
        }
    }

    /// Create a new MalformedId error
    pub fn malformed_id(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::MalformedId {
            id: id.into(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidKey { .. } => ErrorCategory::Validation,
            Self::MalformedId { .. } => ErrorCategory::Parse,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Parse,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::Parse => write!(f, "parse"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_key_error() {
        let err = CoreError::invalid_key("parent_id", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid association key (parent_id): must not be empty"
        );
        assert_eq!(err.category(), ErrorCategory::Validation);
    }

    #[test]
    fn test_malformed_id_error() {
        let err = CoreError::malformed_id("a,b,c", "expected 2 segments, found 3");
        assert_eq!(
            err.to_string(),
            "Malformed association ID \"a,b,c\": expected 2 segments, found 3"
        );
        assert_eq!(err.category(), ErrorCategory::Parse);
    }

    #[test]
    fn test_error_categories_display() {
        assert_eq!(ErrorCategory::Validation.to_string(), "validation");
        assert_eq!(ErrorCategory::Parse.to_string(), "parse");
    }
}
