//! Backend store abstraction.
//!
//! The driver gate never talks to a database directly. It goes through the [`DriverStore`]
//! trait, which models the hosted backend as a set of row reads and writes against the
//! `driver_surveys` and `driver_permissions` collections (plus the role lookups used for
//! routing). Two implementations exist:
//!
//! - [`postgres::PostgresStore`]: PostgreSQL via the [`crate::db`] repositories
//! - [`memory::InMemoryStore`]: process-local maps, for development and tests
//!
//! Reads return `Option` so that "no row" is ordinary state rather than an error. No method
//! spans both collections; callers sequence the writes themselves. Survey and permission rows
//! must reference an existing account: both implementations fail those writes with a foreign
//! key violation otherwise.

use std::sync::Arc;

use async_trait::async_trait;
use anyhow::Context;
use tracing::{info, warn};

use crate::{
    config::{Config, DatabaseConfig},
    db::{
        errors::Result,
        models::{
            driver_permissions::{DriverPermission, DriverPermissionApproval, DriverPermissionUpdateDBRequest, DriverPermissionView},
            driver_surveys::{DriverSurvey, DriverSurveyCreateDBRequest, DriverSurveyView, SurveyStatus},
            users::{AccountRoles, AccountUpsertDBRequest},
        },
    },
    types::UserId,
};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;

/// Create a store from configuration.
///
/// For an external database this connects the pool and runs migrations before returning.
pub async fn create_store(config: &DatabaseConfig) -> anyhow::Result<Arc<dyn DriverStore>> {
    match config {
        DatabaseConfig::Memory => {
            info!("Using in-memory store: data will be lost on shutdown");
            Ok(Arc::new(InMemoryStore::new()))
        }
        DatabaseConfig::External { url, pool } => {
            info!("Using external database");
            let store = PostgresStore::connect(url, pool).await?;
            store.migrate().await?;
            Ok(Arc::new(store))
        }
    }
}

/// Mirror the configured administrator and seed accounts into the store.
///
/// Idempotent: existing accounts get their email and admin flag refreshed.
pub async fn seed_accounts(store: &dyn DriverStore, config: &Config) -> anyhow::Result<()> {
    if config.admin_user_id.is_none() {
        warn!("No admin_user_id configured: administrator endpoints are unreachable until an admin account exists");
    }

    for seed in config.seed_accounts() {
        store
            .upsert_account(&seed)
            .await
            .with_context(|| format!("Failed to seed account {}", seed.email))?;
        info!(email = %seed.email, is_admin = seed.is_admin, "Seeded account");
    }
    Ok(())
}

/// Row-level access to the driver onboarding collections
#[async_trait]
pub trait DriverStore: Send + Sync {
    /// Fetch the survey owned by a user
    async fn get_survey(&self, user_id: UserId) -> Result<Option<DriverSurvey>>;

    /// Insert a new pending survey.
    ///
    /// Fails with a unique violation on `driver_surveys_user_id_unique` if the user already has
    /// one.
    async fn insert_survey(&self, request: &DriverSurveyCreateDBRequest) -> Result<DriverSurvey>;

    /// Set a survey's status. `None` if the user has no survey.
    async fn update_survey_status(&self, user_id: UserId, status: SurveyStatus) -> Result<Option<DriverSurvey>>;

    /// Every survey joined with the applicant's email, newest first
    async fn list_surveys(&self) -> Result<Vec<DriverSurveyView>>;

    /// Fetch the permission row owned by a user
    async fn get_permission(&self, user_id: UserId) -> Result<Option<DriverPermission>>;

    /// Insert an unapproved permission unless one exists. `true` if a row was created.
    async fn insert_unapproved_permission(&self, user_id: UserId) -> Result<bool>;

    /// Approve a user's permission, creating the row if needed
    async fn approve_permission(&self, user_id: UserId, approval: &DriverPermissionApproval) -> Result<DriverPermission>;

    /// Change the approval flag of an existing permission. `None` if the user has no row.
    async fn update_permission_approval(
        &self,
        user_id: UserId,
        request: &DriverPermissionUpdateDBRequest,
    ) -> Result<Option<DriverPermission>>;

    /// Every permission joined with the user's email, newest first
    async fn list_permissions(&self) -> Result<Vec<DriverPermissionView>>;

    /// Admin and office-staff flags for a user
    async fn get_account_roles(&self, user_id: UserId) -> Result<AccountRoles>;

    /// Create or update a mirrored account and its admin flag
    async fn upsert_account(&self, request: &AccountUpsertDBRequest) -> Result<()>;
}
