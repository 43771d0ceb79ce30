//! In-process store backed by concurrent maps.
//!
//! Mirrors the constraints of the PostgreSQL schema: one survey and one permission per user,
//! rows must reference a known account, inner-join semantics for the list views, newest-first
//! ordering. Used when the configured
//! database type is `memory` and by the test suite, which can also inject failures into
//! individual operations to exercise partially applied writes.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::{DashMap, mapref::entry::Entry};
use uuid::Uuid;

use crate::{
    db::{
        errors::{DbError, Result},
        handlers::driver_surveys::SURVEY_PER_USER_CONSTRAINT,
        models::{
            driver_permissions::{DriverPermission, DriverPermissionApproval, DriverPermissionUpdateDBRequest, DriverPermissionView},
            driver_surveys::{DriverSurvey, DriverSurveyCreateDBRequest, DriverSurveyView, SurveyStatus},
            users::{AccountRoles, AccountUpsertDBRequest},
        },
    },
    store::DriverStore,
    types::UserId,
};

/// Store operations that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    GetSurvey,
    InsertSurvey,
    UpdateSurveyStatus,
    ListSurveys,
    GetPermission,
    InsertPermission,
    ApprovePermission,
    UpdatePermission,
    ListPermissions,
    GetAccountRoles,
    UpsertAccount,
}

#[derive(Debug, Clone)]
struct Account {
    email: String,
    roles: AccountRoles,
}

#[derive(Default)]
pub struct InMemoryStore {
    accounts: DashMap<UserId, Account>,
    surveys: DashMap<UserId, DriverSurvey>,
    permissions: DashMap<UserId, DriverPermission>,
    failures: DashMap<StoreOp, String>,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an account mirrored from the auth provider
    pub fn register_account(&self, user_id: UserId, email: impl Into<String>, roles: AccountRoles) {
        self.accounts.insert(
            user_id,
            Account {
                email: email.into(),
                roles,
            },
        );
    }

    /// Make every subsequent call of `op` fail with `message` until cleared
    pub fn fail_on(&self, op: StoreOp, message: impl Into<String>) {
        self.failures.insert(op, message.into());
    }

    pub fn clear_failure(&self, op: StoreOp) {
        self.failures.remove(&op);
    }

    /// Number of successful mutating calls so far
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check(&self, op: StoreOp) -> Result<()> {
        match self.failures.get(&op) {
            Some(message) => Err(DbError::Other(anyhow::anyhow!(message.value().clone()))),
            None => Ok(()),
        }
    }

    fn record_write(&self) {
        self.writes.fetch_add(1, Ordering::SeqCst);
    }

    fn email_of(&self, user_id: &UserId) -> Option<String> {
        self.accounts.get(user_id).map(|a| a.email.clone())
    }

    /// Reject references to accounts that don't exist, as the schema's foreign keys do
    fn require_account(&self, user_id: &UserId, table: &str, column: &str) -> Result<()> {
        if self.accounts.contains_key(user_id) {
            return Ok(());
        }
        let constraint = format!("{table}_{column}_fkey");
        Err(DbError::ForeignKeyViolation {
            message: format!("insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""),
            constraint: Some(constraint),
            table: Some(table.to_string()),
        })
    }
}

#[async_trait]
impl DriverStore for InMemoryStore {
    async fn get_survey(&self, user_id: UserId) -> Result<Option<DriverSurvey>> {
        self.check(StoreOp::GetSurvey)?;
        Ok(self.surveys.get(&user_id).map(|s| s.clone()))
    }

    async fn insert_survey(&self, request: &DriverSurveyCreateDBRequest) -> Result<DriverSurvey> {
        self.check(StoreOp::InsertSurvey)?;
        self.require_account(&request.user_id, "driver_surveys", "user_id")?;
        match self.surveys.entry(request.user_id) {
            Entry::Occupied(_) => Err(DbError::UniqueViolation {
                constraint: Some(SURVEY_PER_USER_CONSTRAINT.to_string()),
                table: Some("driver_surveys".to_string()),
                message: format!("duplicate key value violates unique constraint \"{SURVEY_PER_USER_CONSTRAINT}\""),
            }),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let survey = DriverSurvey {
                    id: Uuid::new_v4(),
                    user_id: request.user_id,
                    full_name: request.full_name.clone(),
                    tribe: request.tribe.clone(),
                    age: request.age,
                    car_type: request.car_type.clone(),
                    civil_id: request.civil_id.clone(),
                    phone_number: request.phone_number.clone(),
                    status: SurveyStatus::Pending,
                    created_at: now,
                    updated_at: now,
                };
                slot.insert(survey.clone());
                self.record_write();
                Ok(survey)
            }
        }
    }

    async fn update_survey_status(&self, user_id: UserId, status: SurveyStatus) -> Result<Option<DriverSurvey>> {
        self.check(StoreOp::UpdateSurveyStatus)?;
        let updated = self.surveys.get_mut(&user_id).map(|mut survey| {
            survey.status = status;
            survey.updated_at = Utc::now();
            survey.clone()
        });
        if updated.is_some() {
            self.record_write();
        }
        Ok(updated)
    }

    async fn list_surveys(&self) -> Result<Vec<DriverSurveyView>> {
        self.check(StoreOp::ListSurveys)?;
        let mut rows: Vec<DriverSurveyView> = self
            .surveys
            .iter()
            .filter_map(|s| {
                let user_email = self.email_of(&s.user_id)?;
                Some(DriverSurveyView {
                    id: s.id,
                    user_id: s.user_id,
                    user_email,
                    full_name: s.full_name.clone(),
                    tribe: s.tribe.clone(),
                    age: s.age,
                    car_type: s.car_type.clone(),
                    civil_id: s.civil_id.clone(),
                    phone_number: s.phone_number.clone(),
                    status: s.status,
                    created_at: s.created_at,
                    updated_at: s.updated_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_permission(&self, user_id: UserId) -> Result<Option<DriverPermission>> {
        self.check(StoreOp::GetPermission)?;
        Ok(self.permissions.get(&user_id).map(|p| p.clone()))
    }

    async fn insert_unapproved_permission(&self, user_id: UserId) -> Result<bool> {
        self.check(StoreOp::InsertPermission)?;
        self.require_account(&user_id, "driver_permissions", "user_id")?;
        match self.permissions.entry(user_id) {
            Entry::Occupied(_) => Ok(false),
            Entry::Vacant(slot) => {
                slot.insert(DriverPermission {
                    id: Uuid::new_v4(),
                    user_id,
                    is_approved: false,
                    approved_by: None,
                    approved_at: None,
                    created_at: Utc::now(),
                });
                self.record_write();
                Ok(true)
            }
        }
    }

    async fn approve_permission(&self, user_id: UserId, approval: &DriverPermissionApproval) -> Result<DriverPermission> {
        self.check(StoreOp::ApprovePermission)?;
        self.require_account(&user_id, "driver_permissions", "user_id")?;
        self.require_account(&approval.approved_by, "driver_permissions", "approved_by")?;
        let mut entry = self.permissions.entry(user_id).or_insert_with(|| DriverPermission {
            id: Uuid::new_v4(),
            user_id,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            created_at: Utc::now(),
        });
        entry.is_approved = true;
        entry.approved_by = Some(approval.approved_by);
        entry.approved_at = Some(approval.approved_at);
        let permission = entry.clone();
        drop(entry);

        self.record_write();
        Ok(permission)
    }

    async fn update_permission_approval(
        &self,
        user_id: UserId,
        request: &DriverPermissionUpdateDBRequest,
    ) -> Result<Option<DriverPermission>> {
        self.check(StoreOp::UpdatePermission)?;
        if !self.permissions.contains_key(&user_id) {
            return Ok(None);
        }
        self.require_account(&request.approved_by, "driver_permissions", "approved_by")?;
        let updated = self.permissions.get_mut(&user_id).map(|mut permission| {
            permission.is_approved = request.is_approved;
            permission.approved_by = Some(request.approved_by);
            permission.approved_at = request.approved_at;
            permission.clone()
        });
        if updated.is_some() {
            self.record_write();
        }
        Ok(updated)
    }

    async fn list_permissions(&self) -> Result<Vec<DriverPermissionView>> {
        self.check(StoreOp::ListPermissions)?;
        let mut rows: Vec<DriverPermissionView> = self
            .permissions
            .iter()
            .filter_map(|p| {
                let user_email = self.email_of(&p.user_id)?;
                Some(DriverPermissionView {
                    id: p.id,
                    user_id: p.user_id,
                    user_email,
                    is_approved: p.is_approved,
                    approved_by: p.approved_by,
                    approved_at: p.approved_at,
                    created_at: p.created_at,
                })
            })
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn get_account_roles(&self, user_id: UserId) -> Result<AccountRoles> {
        self.check(StoreOp::GetAccountRoles)?;
        Ok(self.accounts.get(&user_id).map(|a| a.roles).unwrap_or_default())
    }

    async fn upsert_account(&self, request: &AccountUpsertDBRequest) -> Result<()> {
        self.check(StoreOp::UpsertAccount)?;
        if let Some(other) = self
            .accounts
            .iter()
            .find(|a| a.email == request.email && *a.key() != request.user_id)
        {
            return Err(DbError::UniqueViolation {
                constraint: Some("user_accounts_email_key".to_string()),
                table: Some("user_accounts".to_string()),
                message: format!("email {} already belongs to account {}", request.email, other.key()),
            });
        }

        let mut account = self.accounts.entry(request.user_id).or_insert_with(|| Account {
            email: request.email.clone(),
            roles: AccountRoles::default(),
        });
        account.email = request.email.clone();
        account.roles.is_admin = request.is_admin;
        drop(account);

        self.record_write();
        Ok(())
    }
}
