//! PostgreSQL-backed store.

use async_trait::async_trait;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    config::PoolSettings,
    db::{
        errors::Result,
        handlers::{DriverPermissions, DriverSurveys, UserRoles},
        models::{
            driver_permissions::{DriverPermission, DriverPermissionApproval, DriverPermissionUpdateDBRequest, DriverPermissionView},
            driver_surveys::{DriverSurvey, DriverSurveyCreateDBRequest, DriverSurveyView, SurveyStatus},
            users::{AccountRoles, AccountUpsertDBRequest},
        },
    },
    store::DriverStore,
    types::UserId,
};

/// Store that runs every call on its own pooled connection.
///
/// Onboarding calls are not grouped into transactions: each one commits on its own, matching
/// the single-row semantics of the hosted backend. Only account mirroring, which spans two
/// tables, uses a transaction.
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Connect a pool with the given settings
    pub async fn connect(url: &str, settings: &PoolSettings) -> anyhow::Result<Self> {
        let mut options = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .min_connections(settings.min_connections)
            .acquire_timeout(settings.acquire_timeout);

        // Zero disables idle reaping
        if !settings.idle_timeout.is_zero() {
            options = options.idle_timeout(settings.idle_timeout);
        }

        let pool = options.connect(url).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations
    pub async fn migrate(&self) -> anyhow::Result<()> {
        crate::migrator().run(&self.pool).await?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl DriverStore for PostgresStore {
    async fn get_survey(&self, user_id: UserId) -> Result<Option<DriverSurvey>> {
        let mut conn = self.pool.acquire().await?;
        DriverSurveys::new(&mut conn).get_by_user(user_id).await
    }

    async fn insert_survey(&self, request: &DriverSurveyCreateDBRequest) -> Result<DriverSurvey> {
        let mut conn = self.pool.acquire().await?;
        DriverSurveys::new(&mut conn).create(request).await
    }

    async fn update_survey_status(&self, user_id: UserId, status: SurveyStatus) -> Result<Option<DriverSurvey>> {
        let mut conn = self.pool.acquire().await?;
        DriverSurveys::new(&mut conn).update_status(user_id, status).await
    }

    async fn list_surveys(&self) -> Result<Vec<DriverSurveyView>> {
        let mut conn = self.pool.acquire().await?;
        DriverSurveys::new(&mut conn).list_view().await
    }

    async fn get_permission(&self, user_id: UserId) -> Result<Option<DriverPermission>> {
        let mut conn = self.pool.acquire().await?;
        DriverPermissions::new(&mut conn).get_by_user(user_id).await
    }

    async fn insert_unapproved_permission(&self, user_id: UserId) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        DriverPermissions::new(&mut conn).create_unapproved(user_id).await
    }

    async fn approve_permission(&self, user_id: UserId, approval: &DriverPermissionApproval) -> Result<DriverPermission> {
        let mut conn = self.pool.acquire().await?;
        DriverPermissions::new(&mut conn).approve(user_id, approval).await
    }

    async fn update_permission_approval(
        &self,
        user_id: UserId,
        request: &DriverPermissionUpdateDBRequest,
    ) -> Result<Option<DriverPermission>> {
        let mut conn = self.pool.acquire().await?;
        DriverPermissions::new(&mut conn).update_approval(user_id, request).await
    }

    async fn list_permissions(&self) -> Result<Vec<DriverPermissionView>> {
        let mut conn = self.pool.acquire().await?;
        DriverPermissions::new(&mut conn).list_view().await
    }

    async fn get_account_roles(&self, user_id: UserId) -> Result<AccountRoles> {
        let mut conn = self.pool.acquire().await?;
        UserRoles::new(&mut conn).get_account_roles(user_id).await
    }

    async fn upsert_account(&self, request: &AccountUpsertDBRequest) -> Result<()> {
        // Account and role rows land together or not at all
        let mut tx = self.pool.begin().await?;
        UserRoles::new(&mut tx).upsert_account(request).await?;
        tx.commit().await?;
        Ok(())
    }
}
