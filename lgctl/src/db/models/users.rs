//! Database models for account roles.

use sqlx::FromRow;

use crate::types::UserId;

/// Role flags for an account, read from `user_roles` and `office_assignments`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, FromRow)]
pub struct AccountRoles {
    pub is_admin: bool,
    pub is_office_staff: bool,
}

/// Database request for mirroring an account from the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountUpsertDBRequest {
    pub user_id: UserId,
    pub email: String,
    /// Written to `user_roles`; office assignments are left alone
    pub is_admin: bool,
}
