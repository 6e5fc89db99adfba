//! Error types for Tradepost.

use thiserror::Error;

/// Main error type for marketplace operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketError {
    /// Resource not found.
    #[error("{resource_type} {id} not found")]
    NotFound { resource_type: String, id: String },

    /// The resource has already moved past the requested state, or the
    /// request competes with state that cannot satisfy it (stock, uniqueness).
    #[error("{message}")]
    Conflict { message: String },

    /// The resource is in a shape that makes the operation impossible.
    #[error("{message}")]
    InvalidState { message: String },

    /// The caller is known but may not act on this resource.
    #[error("{message}")]
    Forbidden { message: String },

    /// No caller identity was supplied, or it is not a registered user.
    #[error("Unauthenticated")]
    Unauthenticated,

    /// Malformed input.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// Underlying storage failed; the unit of work was rolled back.
    #[error("Storage failure: {message}")]
    Transient { message: String },

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error (should not happen).
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MarketError {
    pub fn not_found(resource_type: impl Into<String>, id: impl ToString) -> Self {
        MarketError::NotFound {
            resource_type: resource_type.into(),
            id: id.to_string(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        MarketError::Conflict {
            message: message.into(),
        }
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        MarketError::InvalidState {
            message: message.into(),
        }
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        MarketError::Forbidden {
            message: message.into(),
        }
    }

    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        MarketError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        MarketError::Transient {
            message: message.into(),
        }
    }

    /// Returns true if the caller may retry the same request unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, MarketError::Transient { .. })
    }

    /// Returns true if this error reports a broken business rule that the
    /// client should see verbatim.
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            MarketError::NotFound { .. }
                | MarketError::Conflict { .. }
                | MarketError::InvalidState { .. }
                | MarketError::Forbidden { .. }
                | MarketError::Unauthenticated
                | MarketError::Validation { .. }
        )
    }
}

/// Convenience Result type for marketplace operations.
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<serde_json::Error> for MarketError {
    fn from(err: serde_json::Error) -> Self {
        MarketError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(MarketError::transient("disk full").is_retryable());
        assert!(!MarketError::conflict("Order already processed.").is_retryable());
        assert!(!MarketError::Internal("boom".into()).is_retryable());
    }

    #[test]
    fn test_business_rule_messages_are_verbatim() {
        let err = MarketError::conflict("Not enough quantity available.");
        assert!(err.is_business_rule());
        assert_eq!(err.to_string(), "Not enough quantity available.");

        let err = MarketError::not_found("Order", 7);
        assert_eq!(err.to_string(), "Order 7 not found");
        assert!(!MarketError::transient("x").is_business_rule());
    }
}
