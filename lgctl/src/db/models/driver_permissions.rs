//! Database models for driver permissions.

use crate::types::{DriverPermissionId, UserId};
use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database entity model
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DriverPermission {
    pub id: DriverPermissionId,
    pub user_id: UserId,
    pub is_approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Audit fields written when a permission is approved
#[derive(Debug, Clone, Copy)]
pub struct DriverPermissionApproval {
    pub approved_by: UserId,
    pub approved_at: DateTime<Utc>,
}

/// Database request for changing the approval flag of an existing permission
#[derive(Debug, Clone, Copy)]
pub struct DriverPermissionUpdateDBRequest {
    pub is_approved: bool,
    /// The administrator making the change, recorded for grants and revocations alike
    pub approved_by: UserId,
    /// Written as-is; `None` clears the column
    pub approved_at: Option<DateTime<Utc>>,
}

impl DriverPermissionUpdateDBRequest {
    pub fn grant(approval: DriverPermissionApproval) -> Self {
        Self {
            is_approved: true,
            approved_by: approval.approved_by,
            approved_at: Some(approval.approved_at),
        }
    }

    /// Revocation clears the timestamp and records who revoked
    pub fn revoke(revoked_by: UserId) -> Self {
        Self {
            is_approved: false,
            approved_by: revoked_by,
            approved_at: None,
        }
    }
}

/// Row of `driver_permissions_view`: a permission joined with the user's email
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DriverPermissionView {
    pub id: DriverPermissionId,
    pub user_id: UserId,
    pub user_email: String,
    pub is_approved: bool,
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}
