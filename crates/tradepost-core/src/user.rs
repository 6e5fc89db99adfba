//! Users and request-scoped caller identity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{MarketError, Result};
use crate::types::Role;

/// Longest name accepted for users and items.
pub const MAX_NAME_LEN: usize = 255;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// Payload for registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl UserDraft {
    /// Validate and normalise the draft.
    pub fn validate(mut self) -> Result<Self> {
        self.name = validate_name(&self.name)?;
        self.email = self.email.trim().to_lowercase();
        let valid_email = self
            .email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
        if !valid_email {
            return Err(MarketError::validation("email", "must be a valid email address"));
        }
        Ok(self)
    }

    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            name: self.name,
            email: self.email,
            role: self.role,
            created_at: Utc::now(),
        }
    }
}

pub(crate) fn validate_name(name: &str) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(MarketError::validation("name", "is required"));
    }
    if name.chars().count() > MAX_NAME_LEN {
        return Err(MarketError::validation(
            "name",
            format!("must be at most {} characters", MAX_NAME_LEN),
        ));
    }
    Ok(name.to_string())
}

/// The caller of an operation, resolved once per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub role: Role,
    pub name: String,
}

impl Identity {
    pub fn new(user_id: Uuid, role: Role, name: impl Into<String>) -> Self {
        Self {
            user_id,
            role,
            name: name.into(),
        }
    }

    /// Fails with `Forbidden` unless the caller has `role`.
    pub fn require(&self, role: Role) -> Result<()> {
        if self.role == role {
            Ok(())
        } else {
            Err(MarketError::forbidden(format!("Only a {} may do this.", role)))
        }
    }
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Identity::new(user.id, user.role, user.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(name: &str, email: &str) -> UserDraft {
        UserDraft {
            name: name.to_string(),
            email: email.to_string(),
            role: Role::Customer,
        }
    }

    #[test]
    fn test_draft_normalises_email() {
        let d = draft("  Alice ", " Alice@Example.com ").validate().unwrap();
        assert_eq!(d.name, "Alice");
        assert_eq!(d.email, "alice@example.com");
    }

    #[test]
    fn test_draft_rejects_bad_input() {
        assert!(matches!(
            draft("", "a@b.io").validate(),
            Err(MarketError::Validation { field, .. }) if field == "name"
        ));
        assert!(matches!(
            draft("Bob", "not-an-email").validate(),
            Err(MarketError::Validation { field, .. }) if field == "email"
        ));
        assert!(draft(&"x".repeat(MAX_NAME_LEN + 1), "a@b.io").validate().is_err());
    }

    #[test]
    fn test_identity_require() {
        let who = Identity::new(Uuid::new_v4(), Role::Customer, "Carol");
        assert!(who.require(Role::Customer).is_ok());
        assert!(matches!(who.require(Role::Employee), Err(MarketError::Forbidden { .. })));
    }
}
