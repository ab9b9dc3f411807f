//! Authenticated-request context and role checks
//!
//! After the bearer token is validated and the user row is loaded from
//! storage, a [`CurrentUser`] is inserted into the request extensions.
//! Handlers extract it and gate themselves with a role allow-list, a flat
//! set-membership test: there is no role hierarchy, each endpoint simply
//! declares which roles may call it.
//!
//! # Example
//!
//! ```
//! use axum::Extension;
//! use tillpoint_shared::auth::session::CurrentUser;
//! use tillpoint_shared::models::user::UserRole;
//!
//! async fn handler(Extension(current): Extension<CurrentUser>) -> Result<String, String> {
//!     current
//!         .require_role(&[UserRole::Admin])
//!         .map_err(|e| e.to_string())?;
//!     Ok(format!("hello, {}", current.user.username))
//! }
//! ```

use uuid::Uuid;

use crate::models::user::{User, UserRole};

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AccessError {
    /// The caller's role is not in the endpoint's allow-list
    #[error("Insufficient permissions")]
    Forbidden,
}

/// The authenticated user attached to a request
///
/// Cloned into request extensions by the auth middleware; carries the
/// freshly-loaded user row, so role and active checks reflect the database
/// rather than the (possibly stale) token claims.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    /// The user row resolved from the bearer token
    pub user: User,
}

impl CurrentUser {
    /// Creates a session context from a resolved user row
    pub fn new(user: User) -> Self {
        Self { user }
    }

    /// The tenant every query in this request is scoped to
    pub fn tenant_id(&self) -> Uuid {
        self.user.tenant_id
    }

    /// The caller's user id
    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    /// The caller's role
    pub fn role(&self) -> UserRole {
        self.user.role
    }

    /// Checks membership in an endpoint's role allow-list
    pub fn require_role(&self, allowed: &[UserRole]) -> Result<(), AccessError> {
        if allowed.contains(&self.user.role) {
            Ok(())
        } else {
            Err(AccessError::Forbidden)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user_with_role(role: UserRole) -> CurrentUser {
        CurrentUser::new(User {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            username: "till1".to_string(),
            email: None,
            password_hash: "$argon2id$x".to_string(),
            first_name: None,
            last_name: None,
            role,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        })
    }

    #[test]
    fn test_require_role_allows_listed_roles() {
        let cashier = user_with_role(UserRole::Cashier);

        assert!(cashier
            .require_role(&[UserRole::Admin, UserRole::Cashier])
            .is_ok());
    }

    #[test]
    fn test_require_role_rejects_unlisted_roles() {
        let staff = user_with_role(UserRole::Staff);

        assert!(matches!(
            staff.require_role(&[UserRole::Admin]),
            Err(AccessError::Forbidden)
        ));
        assert!(matches!(
            staff.require_role(&[UserRole::Admin, UserRole::Cashier]),
            Err(AccessError::Forbidden)
        ));
    }

    #[test]
    fn test_roles_are_flat_not_hierarchical() {
        // An admin is NOT implicitly allowed where only cashiers are listed
        let admin = user_with_role(UserRole::Admin);

        assert!(admin.require_role(&[UserRole::Cashier]).is_err());
    }

    #[test]
    fn test_session_accessors() {
        let current = user_with_role(UserRole::SalesAttendant);

        assert_eq!(current.tenant_id(), current.user.tenant_id);
        assert_eq!(current.user_id(), current.user.id);
        assert_eq!(current.role(), UserRole::SalesAttendant);
    }
}
