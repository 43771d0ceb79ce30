use crate::{
    AppState,
    api::models::{
        drivers::{
            DriverAccessResponse, DriverPermissionListItem, DriverPermissionResponse, DriverSurveyListItem, ReviewSurveyRequest,
            ReviewSurveyResponse, SubmitSurveyResponse, SurveyForm, SurveyStateResponse, TogglePermissionRequest,
        },
        users::CurrentUser,
    },
    auth::permissions::{RequiresPermission, operation, resource},
    errors::Result,
    gate::{DriverGate, NewSurvey},
    types::UserId,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use tracing::instrument;

/// Check whether the current user may use the driver workflow
#[utoipa::path(
    get,
    path = "/drivers/current/access",
    tag = "drivers",
    summary = "Resolve driver access",
    description = "Returns the gate decision for the current user and the screen the driver workflow should open on.",
    responses(
        (status = 200, description = "Gate decision", body = DriverAccessResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn get_current_access(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DriverPermissions, operation::ReadOwn>,
    current_user: CurrentUser,
) -> Result<Json<DriverAccessResponse>> {
    let gate = DriverGate::new(state.store.clone());
    let (access, screen) = gate.resolve_access_and_entry(current_user.id).await?;
    Ok(Json(DriverAccessResponse { access, screen }))
}

/// Get the current user's application status
#[utoipa::path(
    get,
    path = "/drivers/current/survey",
    tag = "drivers",
    summary = "Get application status",
    description = "Returns the state of the current user's driver application, with the application itself if one was submitted.",
    responses(
        (status = 200, description = "Application state", body = SurveyStateResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn get_current_survey(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DriverSurveys, operation::ReadOwn>,
    current_user: CurrentUser,
) -> Result<Json<SurveyStateResponse>> {
    let gate = DriverGate::new(state.store.clone());
    let survey = gate.lookup_survey(current_user.id).await?;
    Ok(Json(SurveyStateResponse::from_survey(survey)))
}

/// Submit the current user's driver application
#[utoipa::path(
    post,
    path = "/drivers/current/survey",
    tag = "drivers",
    summary = "Submit driver application",
    description = "Records the current user's one and only driver application as pending, and creates an unapproved driver permission if the user has none.",
    request_body = SurveyForm,
    responses(
        (status = 201, description = "Application recorded", body = SubmitSurveyResponse),
        (status = 400, description = "Blank field, invalid age, or no account mirrored for the caller"),
        (status = 401, description = "Unauthorized"),
        (status = 409, description = "An application was already submitted"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn submit_current_survey(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DriverSurveys, operation::CreateOwn>,
    current_user: CurrentUser,
    Json(form): Json<SurveyForm>,
) -> Result<(StatusCode, Json<SubmitSurveyResponse>)> {
    let survey = NewSurvey::try_from(form)?;
    let gate = DriverGate::new(state.store.clone());
    let outcome = gate.submit_survey(current_user.id, survey).await?;
    Ok((StatusCode::CREATED, Json(outcome.into())))
}

/// List every driver application (admin only)
#[utoipa::path(
    get,
    path = "/driver-surveys",
    tag = "drivers",
    summary = "List driver applications",
    description = "Every driver application with the applicant's email, newest first.",
    responses(
        (status = 200, description = "Applications", body = [DriverSurveyListItem]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn list_driver_surveys(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DriverSurveys, operation::ReadAll>,
    current_user: CurrentUser,
) -> Result<Json<Vec<DriverSurveyListItem>>> {
    let gate = DriverGate::new(state.store.clone());
    let surveys = gate.list_surveys(&current_user).await?;
    Ok(Json(surveys.into_iter().map(Into::into).collect()))
}

/// Approve or reject a driver application (admin only)
#[utoipa::path(
    patch,
    path = "/driver-surveys/{user_id}",
    tag = "drivers",
    summary = "Review driver application",
    description = "Sets the application status. Approving also approves the applicant's driver permission (creating it if missing); rejecting leaves the permission as it is.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Applicant's user ID"),
    ),
    request_body = ReviewSurveyRequest,
    responses(
        (status = 200, description = "Application reviewed", body = ReviewSurveyResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "No application for this user"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn review_driver_survey(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    _: RequiresPermission<resource::DriverSurveys, operation::UpdateAll>,
    current_user: CurrentUser,
    Json(request): Json<ReviewSurveyRequest>,
) -> Result<Json<ReviewSurveyResponse>> {
    let gate = DriverGate::new(state.store.clone());
    let outcome = gate.review_survey(&current_user, user_id, request.status).await?;

    Ok(Json(ReviewSurveyResponse {
        survey: outcome.survey.into(),
        permission: outcome.permission.map(Into::into),
    }))
}

/// List every driver permission (admin only)
#[utoipa::path(
    get,
    path = "/driver-permissions",
    tag = "drivers",
    summary = "List driver permissions",
    description = "Every driver permission with the user's email, newest first.",
    responses(
        (status = 200, description = "Permissions", body = [DriverPermissionListItem]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn list_driver_permissions(
    State(state): State<AppState>,
    _: RequiresPermission<resource::DriverPermissions, operation::ReadAll>,
    current_user: CurrentUser,
) -> Result<Json<Vec<DriverPermissionListItem>>> {
    let gate = DriverGate::new(state.store.clone());
    let permissions = gate.list_permissions(&current_user).await?;
    Ok(Json(permissions.into_iter().map(Into::into).collect()))
}

/// Flip a user's driver permission (admin only)
#[utoipa::path(
    post,
    path = "/driver-permissions/{user_id}/toggle",
    tag = "drivers",
    summary = "Toggle driver permission",
    description = "Sets the permission to the opposite of `current_approved`. Granting records the admin and time; revoking clears the time but keeps the approver.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "User whose permission to change"),
    ),
    request_body = TogglePermissionRequest,
    responses(
        (status = 200, description = "Updated permission", body = DriverPermissionResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden - admin only"),
        (status = 404, description = "No permission row for this user"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[instrument(skip_all)]
pub async fn toggle_driver_permission(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    _: RequiresPermission<resource::DriverPermissions, operation::UpdateAll>,
    current_user: CurrentUser,
    Json(request): Json<TogglePermissionRequest>,
) -> Result<Json<DriverPermissionResponse>> {
    let gate = DriverGate::new(state.store.clone());
    let permission = gate
        .toggle_driver_permission(&current_user, user_id, request.current_approved)
        .await?;
    Ok(Json(permission.into()))
}
