//! Database repository for driver surveys.

use sqlx::PgConnection;
use tracing::instrument;

use crate::{
    db::{
        errors::Result,
        models::driver_surveys::{DriverSurvey, DriverSurveyCreateDBRequest, DriverSurveyView, SurveyStatus},
    },
    types::{UserId, abbrev_uuid},
};

/// Name of the constraint that keeps one survey per user
pub const SURVEY_PER_USER_CONSTRAINT: &str = "driver_surveys_user_id_unique";

const SURVEY_COLUMNS: &str =
    "id, user_id, full_name, tribe, age, car_type, civil_id, phone_number, status, created_at, updated_at";

pub struct DriverSurveys<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DriverSurveys<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Fetch the survey owned by a user. `None` means the user never applied.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn get_by_user(&mut self, user_id: UserId) -> Result<Option<DriverSurvey>> {
        let query = format!("SELECT {SURVEY_COLUMNS} FROM driver_surveys WHERE user_id = $1");
        let survey = sqlx::query_as::<_, DriverSurvey>(&query)
            .bind(user_id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(survey)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&request.user_id)), err)]
    pub async fn create(&mut self, request: &DriverSurveyCreateDBRequest) -> Result<DriverSurvey> {
        let query = format!(
            r#"
            INSERT INTO driver_surveys (user_id, full_name, tribe, age, car_type, civil_id, phone_number, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'pending')
            RETURNING {SURVEY_COLUMNS}
            "#
        );
        let survey = sqlx::query_as::<_, DriverSurvey>(&query)
            .bind(request.user_id)
            .bind(&request.full_name)
            .bind(&request.tribe)
            .bind(request.age)
            .bind(&request.car_type)
            .bind(&request.civil_id)
            .bind(&request.phone_number)
            .fetch_one(&mut *self.db)
            .await?;

        Ok(survey)
    }

    /// Set the review status. Returns `None` if the user has no survey.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id)), err)]
    pub async fn update_status(&mut self, user_id: UserId, status: SurveyStatus) -> Result<Option<DriverSurvey>> {
        let query = format!(
            r#"
            UPDATE driver_surveys
            SET status = $2, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {SURVEY_COLUMNS}
            "#
        );
        let survey = sqlx::query_as::<_, DriverSurvey>(&query)
            .bind(user_id)
            .bind(status)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(survey)
    }

    /// All surveys with applicant emails, newest first
    #[instrument(skip(self), err)]
    pub async fn list_view(&mut self) -> Result<Vec<DriverSurveyView>> {
        let surveys = sqlx::query_as::<_, DriverSurveyView>(
            r#"
            SELECT id, user_id, user_email, full_name, tribe, age, car_type, civil_id, phone_number, status, created_at, updated_at
            FROM driver_surveys_view
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&mut *self.db)
        .await?;

        Ok(surveys)
    }
}
