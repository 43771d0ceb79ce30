//! Driver eligibility gate.
//!
//! Decides which of three screens a user sees when they open the driver workflow, and applies
//! the administrator's review decisions. The gate reads and writes two collections through the
//! [`DriverStore`]:
//!
//! - `driver_surveys`: one application per user, with a review status
//! - `driver_permissions`: one approval flag per user, the operative gate
//!
//! The two are paired by user id but never written in a single transaction. Multi-step
//! operations stop at the first failing step and leave earlier writes in place; every second
//! step is idempotent, so retrying the whole operation is safe.
//!
//! ```text
//!               resolve_driver_access
//!                       │
//!          Granted ─────┴───── Denied
//!             │                   │
//!     OperationalForm      resolve_survey_state
//!                                 │
//!               NotSubmitted ─────┴───── UnderReview / Accepted / Rejected
//!                    │                              │
//!               IntakeForm                 ApplicationStatus(state)
//! ```

use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use utoipa::ToSchema;

use crate::{
    api::models::users::CurrentUser,
    auth::permissions::require_permission,
    db::{
        handlers::driver_surveys::SURVEY_PER_USER_CONSTRAINT,
        models::{
            driver_permissions::{DriverPermission, DriverPermissionApproval, DriverPermissionUpdateDBRequest, DriverPermissionView},
            driver_surveys::{DriverSurvey, DriverSurveyCreateDBRequest, DriverSurveyView, SurveyStatus},
        },
    },
    errors::{Error, Result},
    store::DriverStore,
    types::{Operation, Resource, UserId, abbrev_uuid},
};

/// Minimum applicant age, in years
pub const MIN_DRIVER_AGE: u32 = 18;

/// Outcome of the permission check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum DriverAccess {
    Granted,
    Denied,
}

/// Where a user's application stands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SurveyState {
    NotSubmitted,
    UnderReview,
    Accepted,
    Rejected,
}

impl SurveyState {
    pub fn from_status(status: Option<SurveyStatus>) -> Self {
        match status {
            None => SurveyState::NotSubmitted,
            Some(SurveyStatus::Pending) => SurveyState::UnderReview,
            Some(SurveyStatus::Approved) => SurveyState::Accepted,
            Some(SurveyStatus::Rejected) => SurveyState::Rejected,
        }
    }

    /// Status line shown on the application-status screen
    pub fn message(&self) -> Option<&'static str> {
        match self {
            SurveyState::NotSubmitted => None,
            SurveyState::UnderReview => Some("Your application is under review"),
            SurveyState::Accepted => Some("Your application has been accepted"),
            SurveyState::Rejected => Some("Your application has been rejected"),
        }
    }
}

/// The screen the driver workflow should open on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "screen", content = "state", rename_all = "snake_case")]
pub enum DriverScreen {
    OperationalForm,
    ApplicationStatus(SurveyState),
    IntakeForm,
}

impl DriverScreen {
    /// Access wins; otherwise the application state picks the screen
    pub fn select(access: DriverAccess, state: SurveyState) -> Self {
        match (access, state) {
            (DriverAccess::Granted, _) => DriverScreen::OperationalForm,
            (DriverAccess::Denied, SurveyState::NotSubmitted) => DriverScreen::IntakeForm,
            (DriverAccess::Denied, state) => DriverScreen::ApplicationStatus(state),
        }
    }
}

/// A validated driver application.
///
/// Text fields are trimmed and non-empty; the age is at least [`MIN_DRIVER_AGE`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSurvey {
    full_name: String,
    tribe: String,
    age: u32,
    car_type: String,
    civil_id: String,
    phone_number: String,
}

impl NewSurvey {
    pub fn new(
        full_name: &str,
        tribe: &str,
        age: u32,
        car_type: &str,
        civil_id: &str,
        phone_number: &str,
    ) -> Result<Self> {
        if age < MIN_DRIVER_AGE {
            return Err(Error::BadRequest {
                message: format!("Applicants must be at least {MIN_DRIVER_AGE} years old"),
            });
        }

        Ok(Self {
            full_name: required_field("full_name", full_name)?,
            tribe: required_field("tribe", tribe)?,
            age,
            car_type: required_field("car_type", car_type)?,
            civil_id: required_field("civil_id", civil_id)?,
            phone_number: required_field("phone_number", phone_number)?,
        })
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    fn into_create_request(self, user_id: UserId) -> Result<DriverSurveyCreateDBRequest> {
        let age = i32::try_from(self.age).map_err(|_| Error::BadRequest {
            message: format!("Age {} is out of range", self.age),
        })?;

        Ok(DriverSurveyCreateDBRequest {
            user_id,
            full_name: self.full_name,
            tribe: self.tribe,
            age,
            car_type: self.car_type,
            civil_id: self.civil_id,
            phone_number: self.phone_number,
        })
    }
}

fn required_field(name: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest {
            message: format!("Field '{name}' is required"),
        });
    }
    Ok(trimmed.to_string())
}

/// An administrator's verdict on a pending application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewDecision {
    Approved,
    Rejected,
}

impl From<ReviewDecision> for SurveyStatus {
    fn from(decision: ReviewDecision) -> Self {
        match decision {
            ReviewDecision::Approved => SurveyStatus::Approved,
            ReviewDecision::Rejected => SurveyStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionOutcome {
    pub survey: DriverSurvey,
    /// False when a permission row already existed and was left alone
    pub permission_created: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReviewOutcome {
    pub survey: DriverSurvey,
    /// Present only for approvals
    pub permission: Option<DriverPermission>,
}

#[derive(Clone)]
pub struct DriverGate {
    store: Arc<dyn DriverStore>,
}

impl DriverGate {
    pub fn new(store: Arc<dyn DriverStore>) -> Self {
        Self { store }
    }

    /// Granted iff the user's permission row exists and is approved
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn resolve_driver_access(&self, user_id: UserId) -> Result<DriverAccess> {
        let permission = self.store.get_permission(user_id).await?;
        Ok(match permission {
            Some(p) if p.is_approved => DriverAccess::Granted,
            _ => DriverAccess::Denied,
        })
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn lookup_survey(&self, user_id: UserId) -> Result<Option<DriverSurvey>> {
        Ok(self.store.get_survey(user_id).await?)
    }

    /// Application state from the survey row alone; the permission row is not consulted
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn resolve_survey_state(&self, user_id: UserId) -> Result<SurveyState> {
        let survey = self.store.get_survey(user_id).await?;
        Ok(SurveyState::from_status(survey.map(|s| s.status)))
    }

    /// Screen the driver workflow opens on
    pub async fn resolve_entry(&self, user_id: UserId) -> Result<DriverScreen> {
        let (_, screen) = self.resolve_access_and_entry(user_id).await?;
        Ok(screen)
    }

    /// Gate decision and entry screen from one permission read. The survey is only read when
    /// access is denied.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn resolve_access_and_entry(&self, user_id: UserId) -> Result<(DriverAccess, DriverScreen)> {
        let access = self.resolve_driver_access(user_id).await?;
        if access == DriverAccess::Granted {
            return Ok((access, DriverScreen::OperationalForm));
        }

        let state = self.resolve_survey_state(user_id).await?;
        Ok((access, DriverScreen::select(access, state)))
    }

    /// Record a user's one and only application.
    ///
    /// Inserts the survey as pending, then creates an unapproved permission row if the user
    /// has none. An existing permission row is never modified.
    #[instrument(skip(self, survey), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn submit_survey(&self, user_id: UserId, survey: NewSurvey) -> Result<SubmissionOutcome> {
        if self.store.get_survey(user_id).await?.is_some() {
            return Err(Error::DuplicateSubmission { user_id });
        }

        let request = survey.into_create_request(user_id)?;
        let survey = match self.store.insert_survey(&request).await {
            Ok(survey) => survey,
            // Lost a race with a concurrent submission for the same user
            Err(e) if e.is_unique_violation_on(SURVEY_PER_USER_CONSTRAINT) => {
                return Err(Error::DuplicateSubmission { user_id });
            }
            Err(e) => return Err(e.into()),
        };

        let permission_created = match self.store.get_permission(user_id).await? {
            Some(_) => false,
            None => self.store.insert_unapproved_permission(user_id).await?,
        };

        info!(
            "Driver application {} submitted (permission created: {})",
            abbrev_uuid(&survey.id),
            permission_created
        );
        Ok(SubmissionOutcome {
            survey,
            permission_created,
        })
    }

    /// Apply an administrator's decision.
    ///
    /// Approval also approves the user's permission, creating it if missing. Rejection leaves
    /// the permission as it is.
    #[instrument(skip(self, actor), fields(actor = %abbrev_uuid(&actor.id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn review_survey(&self, actor: &CurrentUser, user_id: UserId, decision: ReviewDecision) -> Result<ReviewOutcome> {
        require_permission(actor, Resource::DriverSurveys, Operation::UpdateAll)?;

        let survey = self
            .store
            .update_survey_status(user_id, decision.into())
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Driver survey".to_string(),
                id: user_id.to_string(),
            })?;

        let permission = match decision {
            ReviewDecision::Approved => {
                let approval = DriverPermissionApproval {
                    approved_by: actor.id,
                    approved_at: Utc::now(),
                };
                Some(self.store.approve_permission(user_id, &approval).await?)
            }
            ReviewDecision::Rejected => None,
        };

        info!("Driver application {} marked {:?}", abbrev_uuid(&survey.id), decision);
        Ok(ReviewOutcome { survey, permission })
    }

    /// Flip a permission from the state the administrator last saw.
    ///
    /// Both directions record the acting administrator in `approved_by`; revoking clears
    /// `approved_at`.
    #[instrument(skip(self, actor), fields(actor = %abbrev_uuid(&actor.id), user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn toggle_driver_permission(
        &self,
        actor: &CurrentUser,
        user_id: UserId,
        current_approved: bool,
    ) -> Result<DriverPermission> {
        require_permission(actor, Resource::DriverPermissions, Operation::UpdateAll)?;

        let request = if current_approved {
            DriverPermissionUpdateDBRequest::revoke(actor.id)
        } else {
            DriverPermissionUpdateDBRequest::grant(DriverPermissionApproval {
                approved_by: actor.id,
                approved_at: Utc::now(),
            })
        };

        self.store
            .update_permission_approval(user_id, &request)
            .await?
            .ok_or_else(|| Error::NotFound {
                resource: "Driver permission".to_string(),
                id: user_id.to_string(),
            })
    }

    #[instrument(skip(self, actor), fields(actor = %abbrev_uuid(&actor.id)), err)]
    pub async fn list_surveys(&self, actor: &CurrentUser) -> Result<Vec<DriverSurveyView>> {
        require_permission(actor, Resource::DriverSurveys, Operation::ReadAll)?;
        Ok(self.store.list_surveys().await?)
    }

    #[instrument(skip(self, actor), fields(actor = %abbrev_uuid(&actor.id)), err)]
    pub async fn list_permissions(&self, actor: &CurrentUser) -> Result<Vec<DriverPermissionView>> {
        require_permission(actor, Resource::DriverPermissions, Operation::ReadAll)?;
        Ok(self.store.list_permissions().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        db::models::users::AccountRoles,
        store::{InMemoryStore, memory::StoreOp},
    };
    use axum::http::StatusCode;
    use uuid::Uuid;

    fn setup() -> (Arc<InMemoryStore>, DriverGate) {
        let store = Arc::new(InMemoryStore::new());
        let gate = DriverGate::new(store.clone());
        (store, gate)
    }

    /// Mirror a fresh account into the store, as the auth provider would
    fn register_user(store: &InMemoryStore) -> UserId {
        let user_id = Uuid::new_v4();
        store.register_account(user_id, format!("{user_id}@example.com"), AccountRoles::default());
        user_id
    }

    fn register_admin(store: &InMemoryStore) -> CurrentUser {
        let admin_id = Uuid::new_v4();
        store.register_account(
            admin_id,
            format!("{admin_id}@example.com"),
            AccountRoles {
                is_admin: true,
                is_office_staff: false,
            },
        );
        CurrentUser::admin(admin_id)
    }

    fn application(name: &str, age: u32) -> NewSurvey {
        NewSurvey::new(name, "Al Example", age, "Pickup", "290010112345", "+96550000000").unwrap()
    }

    async fn approved_permission(store: &InMemoryStore, user_id: UserId, admin_id: UserId) {
        store
            .approve_permission(
                user_id,
                &DriverPermissionApproval {
                    approved_by: admin_id,
                    approved_at: Utc::now(),
                },
            )
            .await
            .unwrap();
    }

    #[test]
    fn test_new_survey_trims_fields() {
        let survey = NewSurvey::new("  Ali  ", "Tribe", 25, "Sedan", "123", " +965 ").unwrap();
        assert_eq!(survey.full_name(), "Ali");
        assert_eq!(survey.phone_number, "+965");
    }

    #[test]
    fn test_new_survey_rejects_blank_and_underage() {
        let blank = NewSurvey::new("   ", "Tribe", 25, "Sedan", "123", "555").unwrap_err();
        assert_eq!(blank.user_message(), "Field 'full_name' is required");

        let young = NewSurvey::new("Ali", "Tribe", 17, "Sedan", "123", "555").unwrap_err();
        assert_eq!(young.status_code(), StatusCode::BAD_REQUEST);

        assert!(NewSurvey::new("Ali", "Tribe", MIN_DRIVER_AGE, "Sedan", "123", "555").is_ok());
    }

    #[test]
    fn test_survey_state_messages() {
        assert_eq!(SurveyState::NotSubmitted.message(), None);
        assert!(SurveyState::UnderReview.message().unwrap().contains("under review"));
        assert!(SurveyState::Accepted.message().unwrap().contains("accepted"));
        assert!(SurveyState::Rejected.message().unwrap().contains("rejected"));
    }

    #[test]
    fn test_driver_screen_serialization() {
        assert_eq!(
            serde_json::to_value(DriverScreen::ApplicationStatus(SurveyState::UnderReview)).unwrap(),
            serde_json::json!({"screen": "application_status", "state": "under_review"})
        );
        assert_eq!(
            serde_json::to_value(DriverScreen::IntakeForm).unwrap(),
            serde_json::json!({"screen": "intake_form"})
        );
    }

    #[test]
    fn test_screen_selection() {
        assert_eq!(
            DriverScreen::select(DriverAccess::Granted, SurveyState::Rejected),
            DriverScreen::OperationalForm
        );
        assert_eq!(
            DriverScreen::select(DriverAccess::Denied, SurveyState::NotSubmitted),
            DriverScreen::IntakeForm
        );
        assert_eq!(
            DriverScreen::select(DriverAccess::Denied, SurveyState::Accepted),
            DriverScreen::ApplicationStatus(SurveyState::Accepted)
        );
    }

    #[tokio::test]
    async fn test_access_denied_without_permission_row() {
        let (_store, gate) = setup();
        assert_eq!(gate.resolve_driver_access(Uuid::new_v4()).await.unwrap(), DriverAccess::Denied);
    }

    #[tokio::test]
    async fn test_access_follows_approval_flag() {
        let (store, gate) = setup();
        let user_id = register_user(&store);

        store.insert_unapproved_permission(user_id).await.unwrap();
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Denied);

        approved_permission(&store, user_id, register_admin(&store).id).await;
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Granted);
    }

    #[tokio::test]
    async fn test_access_lookup_failure_is_fatal() {
        let (store, gate) = setup();
        store.fail_on(StoreOp::GetPermission, "permission denied for table driver_permissions");

        let err = gate.resolve_driver_access(Uuid::new_v4()).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.user_message(), "Backend failure: permission denied for table driver_permissions");
    }

    #[tokio::test]
    async fn test_granted_entry_skips_survey_read() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        approved_permission(&store, user_id, register_admin(&store).id).await;
        store.fail_on(StoreOp::GetSurvey, "driver_surveys unavailable");

        let (access, screen) = gate.resolve_access_and_entry(user_id).await.unwrap();
        assert_eq!(access, DriverAccess::Granted);
        assert_eq!(screen, DriverScreen::OperationalForm);

        store.clear_failure(StoreOp::GetSurvey);
        store.insert_survey(&application("Ali", 25).into_create_request(user_id).unwrap()).await.unwrap();
        assert_eq!(gate.resolve_entry(user_id).await.unwrap(), DriverScreen::OperationalForm);
    }

    #[tokio::test]
    async fn test_no_survey_is_not_submitted() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::NotSubmitted);
        assert_eq!(gate.resolve_entry(user_id).await.unwrap(), DriverScreen::IntakeForm);
    }

    #[tokio::test]
    async fn test_pending_survey_is_under_review_regardless_of_permission() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::UnderReview);

        // A manually granted permission doesn't change the application state
        approved_permission(&store, user_id, register_admin(&store).id).await;
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::UnderReview);
        assert_eq!(gate.resolve_entry(user_id).await.unwrap(), DriverScreen::OperationalForm);
    }

    #[tokio::test]
    async fn test_entry_shows_status_when_denied_with_survey() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        assert_eq!(
            gate.resolve_entry(user_id).await.unwrap(),
            DriverScreen::ApplicationStatus(SurveyState::UnderReview)
        );

        gate.review_survey(&admin, user_id, ReviewDecision::Rejected).await.unwrap();
        assert_eq!(
            gate.resolve_entry(user_id).await.unwrap(),
            DriverScreen::ApplicationStatus(SurveyState::Rejected)
        );
    }

    #[tokio::test]
    async fn test_submit_creates_pending_survey_and_unapproved_permission() {
        let (store, gate) = setup();
        let user_id = register_user(&store);

        let outcome = gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        assert_eq!(outcome.survey.status, SurveyStatus::Pending);
        assert_eq!(outcome.survey.age, 25);
        assert!(outcome.permission_created);

        let permission = store.get_permission(user_id).await.unwrap().unwrap();
        assert!(!permission.is_approved);
        assert!(permission.approved_by.is_none());
        assert!(permission.approved_at.is_none());
    }

    #[tokio::test]
    async fn test_submit_leaves_existing_permission_untouched() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin_id = register_admin(&store).id;
        approved_permission(&store, user_id, admin_id).await;
        let before = store.get_permission(user_id).await.unwrap().unwrap();

        let outcome = gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        assert!(!outcome.permission_created);
        assert_eq!(store.get_permission(user_id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_second_submission_is_rejected_without_writes() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        let writes = store.write_count();

        let err = gate.submit_survey(user_id, application("Ali again", 30)).await.unwrap_err();
        assert!(matches!(err, Error::DuplicateSubmission { user_id: id } if id == user_id));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
        assert_eq!(store.write_count(), writes);
        assert_eq!(store.get_survey(user_id).await.unwrap().unwrap().full_name, "Ali");
    }

    #[tokio::test]
    async fn test_concurrent_submissions_accept_exactly_one() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let first = gate.clone();
        let second = gate.clone();

        let (a, b) = tokio::join!(
            first.submit_survey(user_id, application("Ali", 25)),
            second.submit_survey(user_id, application("Ali", 25)),
        );
        let results = [a, b];
        assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
        assert!(
            results
                .iter()
                .filter_map(|r| r.as_ref().err())
                .all(|e| matches!(e, Error::DuplicateSubmission { .. }))
        );
        assert!(store.get_survey(user_id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_failed_permission_insert_keeps_survey() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        store.fail_on(StoreOp::InsertPermission, "connection reset by peer");

        let err = gate.submit_survey(user_id, application("Ali", 25)).await.unwrap_err();
        assert_eq!(err.user_message(), "Backend failure: connection reset by peer");
        assert!(store.get_survey(user_id).await.unwrap().is_some());
        assert!(store.get_permission(user_id).await.unwrap().is_none());

        // Retrying is refused, and the admin reconciles by approving (which upserts)
        store.clear_failure(StoreOp::InsertPermission);
        let retry = gate.submit_survey(user_id, application("Ali", 25)).await.unwrap_err();
        assert!(matches!(retry, Error::DuplicateSubmission { .. }));

        let admin = register_admin(&store);
        gate.review_survey(&admin, user_id, ReviewDecision::Approved).await.unwrap();
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Granted);
    }

    #[tokio::test]
    async fn test_approve_sets_survey_and_permission() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();

        let outcome = gate.review_survey(&admin, user_id, ReviewDecision::Approved).await.unwrap();
        assert_eq!(outcome.survey.status, SurveyStatus::Approved);
        let permission = outcome.permission.unwrap();
        assert!(permission.is_approved);
        assert_eq!(permission.approved_by, Some(admin.id));
        assert!(permission.approved_at.is_some());

        assert_eq!(store.get_permission(user_id).await.unwrap().unwrap(), permission);
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::Accepted);
    }

    #[tokio::test]
    async fn test_reject_leaves_permission_unchanged() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        let before = store.get_permission(user_id).await.unwrap().unwrap();

        let outcome = gate.review_survey(&admin, user_id, ReviewDecision::Rejected).await.unwrap();
        assert_eq!(outcome.survey.status, SurveyStatus::Rejected);
        assert!(outcome.permission.is_none());
        assert_eq!(store.get_permission(user_id).await.unwrap().unwrap(), before);
    }

    #[tokio::test]
    async fn test_reject_does_not_revoke_granted_permission() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        gate.review_survey(&admin, user_id, ReviewDecision::Approved).await.unwrap();

        gate.review_survey(&admin, user_id, ReviewDecision::Rejected).await.unwrap();
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::Rejected);
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Granted);
        assert!(store.get_permission(user_id).await.unwrap().unwrap().is_approved);
    }

    #[tokio::test]
    async fn test_review_missing_survey_is_not_found() {
        let (store, gate) = setup();
        let admin = register_admin(&store);

        let err = gate
            .review_survey(&admin, Uuid::new_v4(), ReviewDecision::Approved)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_non_admin_cannot_review_or_toggle() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let user = CurrentUser::standard(user_id);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        let writes = store.write_count();

        let err = gate.review_survey(&user, user_id, ReviewDecision::Approved).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        let err = gate.toggle_driver_permission(&user, user_id, false).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::FORBIDDEN);
        assert!(gate.list_surveys(&user).await.is_err());
        assert!(gate.list_permissions(&user).await.is_err());

        assert_eq!(store.write_count(), writes);
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Denied);
    }

    #[tokio::test]
    async fn test_toggle_twice_restores_flag_and_records_actor() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();

        let granted = gate.toggle_driver_permission(&admin, user_id, false).await.unwrap();
        assert!(granted.is_approved);
        assert_eq!(granted.approved_by, Some(admin.id));
        assert!(granted.approved_at.is_some());

        let revoked = gate.toggle_driver_permission(&admin, user_id, true).await.unwrap();
        assert!(!revoked.is_approved);
        assert_eq!(revoked.approved_by, Some(admin.id));
        assert!(revoked.approved_at.is_none());

        let stored = store.get_permission(user_id).await.unwrap().unwrap();
        assert!(!stored.is_approved);
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Denied);
    }

    #[tokio::test]
    async fn test_revoke_records_revoking_admin_not_approver() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let approver = register_admin(&store);
        let revoker = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        gate.review_survey(&approver, user_id, ReviewDecision::Approved).await.unwrap();

        let revoked = gate.toggle_driver_permission(&revoker, user_id, true).await.unwrap();
        assert!(!revoked.is_approved);
        assert_eq!(revoked.approved_by, Some(revoker.id));
        assert!(revoked.approved_at.is_none());

        let regranted = gate.toggle_driver_permission(&approver, user_id, false).await.unwrap();
        assert_eq!(regranted.approved_by, Some(approver.id));
        assert!(regranted.approved_at.is_some());
    }

    #[tokio::test]
    async fn test_submit_for_unknown_account_is_rejected() {
        let (store, gate) = setup();

        let err = gate.submit_survey(Uuid::new_v4(), application("Ali", 25)).await.unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_toggle_is_independent_of_survey() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        gate.review_survey(&admin, user_id, ReviewDecision::Approved).await.unwrap();

        gate.toggle_driver_permission(&admin, user_id, true).await.unwrap();
        assert_eq!(gate.resolve_survey_state(user_id).await.unwrap(), SurveyState::Accepted);
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Denied);
    }

    #[tokio::test]
    async fn test_toggle_missing_row_is_not_found() {
        let (store, gate) = setup();
        let admin = register_admin(&store);
        let err = gate
            .toggle_driver_permission(&admin, Uuid::new_v4(), false)
            .await
            .unwrap_err();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_admin_lists_join_account_emails() {
        let (store, gate) = setup();
        let admin = register_admin(&store);
        let user_id = Uuid::new_v4();
        store.register_account(user_id, "ali@example.com", AccountRoles::default());
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();

        let surveys = gate.list_surveys(&admin).await.unwrap();
        assert_eq!(surveys.len(), 1);
        assert_eq!(surveys[0].user_email, "ali@example.com");
        assert_eq!(surveys[0].full_name, "Ali");

        let permissions = gate.list_permissions(&admin).await.unwrap();
        assert_eq!(permissions.len(), 1);
        assert!(!permissions[0].is_approved);
    }

    #[test_log::test(tokio::test)]
    async fn test_submit_approve_grants_access() {
        let (store, gate) = setup();
        let user_id = register_user(&store);
        let admin = register_admin(&store);

        assert_eq!(gate.resolve_entry(user_id).await.unwrap(), DriverScreen::IntakeForm);
        gate.submit_survey(user_id, application("Ali", 25)).await.unwrap();
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Denied);

        gate.review_survey(&admin, user_id, ReviewDecision::Approved).await.unwrap();
        assert_eq!(gate.resolve_driver_access(user_id).await.unwrap(), DriverAccess::Granted);
        assert_eq!(gate.resolve_entry(user_id).await.unwrap(), DriverScreen::OperationalForm);
    }
}
