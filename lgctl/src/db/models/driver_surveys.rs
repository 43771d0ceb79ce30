//! Database models for driver surveys.

use crate::types::{SurveyId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Review status of a driver application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "driver_survey_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SurveyStatus {
    Pending,
    Approved,
    Rejected,
}

/// Database entity model
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DriverSurvey {
    pub id: SurveyId,
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

/// Database request for creating a driver survey. Status always starts as pending.
#[derive(Debug, Clone)]
pub struct DriverSurveyCreateDBRequest {
    pub user_id: UserId,
    pub full_name: String,
    pub tribe: String,
    pub age: i32,
    pub car_type: String,
    pub civil_id: String,
    pub phone_number: String,
}

/// Row of `driver_surveys_view`: a survey joined with the applicant's email
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DriverSurveyView {
    pub id: SurveyId,
    pub user_id: UserId,
    pub user_email: String,
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
