//! Database repository for mirrored accounts and their roles.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{errors::Result, models::users::{AccountRoles, AccountUpsertDBRequest}},
    types::{UserId, abbrev_uuid},
};

pub struct UserRoles<'c> {
    db: &'c mut PgConnection,
}

impl<'c> UserRoles<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Role flags for a user. A missing `user_roles` row means not an admin.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_account_roles(&mut self, user_id: UserId) -> Result<AccountRoles> {
        let roles = sqlx::query_as::<_, AccountRoles>(
            r#"
            SELECT
                COALESCE((SELECT is_admin FROM user_roles WHERE id = $1), FALSE) AS is_admin,
                EXISTS (SELECT 1 FROM office_assignments WHERE user_id = $1) AS is_office_staff
            "#,
        )
        .bind(user_id)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(roles)
    }

    /// Insert or refresh an account and its `user_roles` row.
    ///
    /// Run inside a transaction so a failed role write doesn't leave a bare account behind.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id), is_admin = request.is_admin), err)]
    pub async fn upsert_account(&mut self, request: &AccountUpsertDBRequest) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_accounts (id, email)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET email = EXCLUDED.email
            "#,
        )
        .bind(request.user_id)
        .bind(&request.email)
        .execute(&mut *self.db)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO user_roles (id, is_admin)
            VALUES ($1, $2)
            ON CONFLICT (id) DO UPDATE SET is_admin = EXCLUDED.is_admin
            "#,
        )
        .bind(request.user_id)
        .bind(request.is_admin)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }
}
