//! Database repository for driver permissions.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::driver_permissions::{
            DriverPermission, DriverPermissionApproval, DriverPermissionUpdateDBRequest, DriverPermissionView,
        },
    },
    types::{UserId, abbrev_uuid},
};

const PERMISSION_COLUMNS: &str = "id, user_id, is_approved, approved_by, approved_at, created_at";

pub struct DriverPermissions<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DriverPermissions<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<DriverPermission>> {
        let query = format!("SELECT {PERMISSION_COLUMNS} FROM driver_permissions WHERE user_id = $1");
        let permission = sqlx::query_as::<_, DriverPermission>(&query)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(permission)
    }

    /// Insert an unapproved permission row unless one already exists.
    ///
    /// Returns `true` when a row was created. An existing row is never touched, so calling this
    /// again after a partial failure is safe.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn create_unapproved(&mut self, user_id: UserId) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO driver_permissions (user_id, is_approved)
            VALUES ($1, FALSE)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *self.db)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark the user's permission approved, creating the row if it is missing
    #[instrument(skip(self, approval), fields(user_id = %abbrev_uuid(&user_id), approved_by = %abbrev_uuid(&approval.approved_by)), err)]
    pub async fn approve(&mut self, user_id: UserId, approval: &DriverPermissionApproval) -> Result<DriverPermission> {
        let query = format!(
            r#"
            INSERT INTO driver_permissions (user_id, is_approved, approved_by, approved_at)
            VALUES ($1, TRUE, $2, $3)
            ON CONFLICT (user_id) DO UPDATE
            SET is_approved = TRUE, approved_by = EXCLUDED.approved_by, approved_at = EXCLUDED.approved_at
            RETURNING {PERMISSION_COLUMNS}
            "#
        );
        let permission = sqlx::query_as::<_, DriverPermission>(&query)
            .bind(user_id)
            .bind(approval.approved_by)
            .bind(approval.approved_at)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(permission)
    }

    /// Update the approval flag of an existing row. Returns `None` if the user has no row.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&user_id), is_approved = request.is_approved), err)]
    pub async fn update_approval(
        &mut self,
        user_id: UserId,
        request: &DriverPermissionUpdateDBRequest,
    ) -> Result<Option<DriverPermission>> {
        let query = format!(
            r#"
            UPDATE driver_permissions
            SET is_approved = $2, approved_by = $3, approved_at = $4
            WHERE user_id = $1
            RETURNING {PERMISSION_COLUMNS}
            "#
        );
        let permission = sqlx::query_as::<_, DriverPermission>(&query)
            .bind(user_id)
            .bind(request.is_approved)
            .bind(request.approved_by)
            .bind(request.approved_at)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(permission)
    }

    /// All permissions with user emails, newest first
    #[instrument(skip(self), err)]
    pub async fn list_view(&mut self) -> Result<Vec<DriverPermissionView>> {
        let permissions = sqlx::query_as::<_, DriverPermissionView>(
            r#"
            SELECT id, user_id, user_email, is_approved, approved_by, approved_at, created_at
            FROM driver_permissions_view
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(permissions)
    }
}
