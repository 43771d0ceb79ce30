//! API request/response models for driver onboarding.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    db::models::{
        driver_permissions::{DriverPermission, DriverPermissionView},
        driver_surveys::{DriverSurvey, DriverSurveyView, SurveyStatus},
    },
    errors::Error,
    gate::{DriverAccess, DriverScreen, NewSurvey, ReviewDecision, SubmissionOutcome, SurveyState},
    types::{DriverPermissionId, SurveyId, UserId},
};

/// Age as typed into the form: either a JSON number or the raw text field.
///
/// Numbers with a fractional part still deserialize so that validation, not the JSON extractor,
/// rejects them.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AgeInput {
    Number(i64),
    Float(f64),
    Text(String),
}

impl AgeInput {
    fn parse(&self) -> Result<u32, Error> {
        let invalid = || Error::BadRequest {
            message: "Age must be a whole number".to_string(),
        };
        match self {
            AgeInput::Number(n) => u32::try_from(*n).map_err(|_| invalid()),
            AgeInput::Float(n) if n.is_finite() && n.fract() == 0.0 && (0.0..=f64::from(u32::MAX)).contains(n) => Ok(*n as u32),
            AgeInput::Float(_) => Err(invalid()),
            AgeInput::Text(s) => s.trim().parse::<u32>().map_err(|_| invalid()),
        }
    }
}

/// Driver application form
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[schema(example = json!({
    "full_name": "Ali Hassan",
    "tribe": "Al Example",
    "age": "25",
    "car_type": "Pickup",
    "civil_id": "290010112345",
    "phone_number": "+96550000000"
}))]
pub struct SurveyForm {
    pub full_name: String,
    pub tribe: String,
    pub age: AgeInput,
    pub car_type: String,
    pub civil_id: String,
    pub phone_number: String,
}

impl TryFrom<SurveyForm> for NewSurvey {
    type Error = Error;

    fn try_from(form: SurveyForm) -> Result<Self, Self::Error> {
        let age = form.age.parse()?;
        NewSurvey::new(&form.full_name, &form.tribe, age, &form.car_type, &form.civil_id, &form.phone_number)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverSurveyResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: SurveyId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub full_name: String,
    pub tribe: String,
    pub age: i32,
    pub car_type: String,
    pub civil_id: String,
    pub phone_number: String,
    pub status: SurveyStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DriverSurvey> for DriverSurveyResponse {
    fn from(s: DriverSurvey) -> Self {
        Self {
            id: s.id,
            user_id: s.user_id,
            full_name: s.full_name,
            tribe: s.tribe,
            age: s.age,
            car_type: s.car_type,
            civil_id: s.civil_id,
            phone_number: s.phone_number,
            status: s.status,
            created_at: s.created_at,
            updated_at: s.updated_at,
        }
    }
}

/// Survey row in the administrator's review list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverSurveyListItem {
    #[serde(flatten)]
    pub survey: DriverSurveyResponse,
    pub user_email: String,
}

impl From<DriverSurveyView> for DriverSurveyListItem {
    fn from(v: DriverSurveyView) -> Self {
        Self {
            user_email: v.user_email,
            survey: DriverSurveyResponse {
                id: v.id,
                user_id: v.user_id,
                full_name: v.full_name,
                tribe: v.tribe,
                age: v.age,
                car_type: v.car_type,
                civil_id: v.civil_id,
                phone_number: v.phone_number,
                status: v.status,
                created_at: v.created_at,
                updated_at: v.updated_at,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverPermissionResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DriverPermissionId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub is_approved: bool,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub approved_by: Option<UserId>,
    pub approved_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DriverPermission> for DriverPermissionResponse {
    fn from(p: DriverPermission) -> Self {
        Self {
            id: p.id,
            user_id: p.user_id,
            is_approved: p.is_approved,
            approved_by: p.approved_by,
            approved_at: p.approved_at,
            created_at: p.created_at,
        }
    }
}

/// Permission row in the administrator's list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DriverPermissionListItem {
    #[serde(flatten)]
    pub permission: DriverPermissionResponse,
    pub user_email: String,
}

impl From<DriverPermissionView> for DriverPermissionListItem {
    fn from(v: DriverPermissionView) -> Self {
        Self {
            user_email: v.user_email,
            permission: DriverPermissionResponse {
                id: v.id,
                user_id: v.user_id,
                is_approved: v.is_approved,
                approved_by: v.approved_by,
                approved_at: v.approved_at,
                created_at: v.created_at,
            },
        }
    }
}

/// Result of the gate check for the current user
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DriverAccessResponse {
    pub access: DriverAccess,
    /// Screen the driver workflow should open on
    pub screen: DriverScreen,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SurveyStateResponse {
    pub state: SurveyState,
    /// Status line for the application-status screen, absent when nothing was submitted
    pub message: Option<String>,
    pub survey: Option<DriverSurveyResponse>,
}

impl SurveyStateResponse {
    pub fn from_survey(survey: Option<DriverSurvey>) -> Self {
        let state = SurveyState::from_status(survey.as_ref().map(|s| s.status));
        Self {
            state,
            message: state.message().map(str::to_string),
            survey: survey.map(Into::into),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubmitSurveyResponse {
    pub survey: DriverSurveyResponse,
    /// False when the user already had a permission row, which was left untouched
    pub permission_created: bool,
}

impl From<SubmissionOutcome> for SubmitSurveyResponse {
    fn from(outcome: SubmissionOutcome) -> Self {
        Self {
            survey: outcome.survey.into(),
            permission_created: outcome.permission_created,
        }
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ReviewSurveyRequest {
    pub status: ReviewDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReviewSurveyResponse {
    pub survey: DriverSurveyResponse,
    /// The approved permission; absent for rejections
    pub permission: Option<DriverPermissionResponse>,
}

/// The approval state the administrator saw when clicking the toggle
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct TogglePermissionRequest {
    pub current_approved: bool,
}
