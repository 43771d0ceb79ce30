use crate::{
    AppState,
    api::models::users::{CurrentUser, DashboardResponse},
    dashboard::resolve_dashboard,
    errors::Result,
};
use axum::{extract::State, response::Json};

/// Which dashboard the caller belongs on
#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "users",
    summary = "Resolve dashboard",
    description = "Routes the caller by role: administrators first, then office staff, everyone else to the user dashboard.",
    responses(
        (status = 200, description = "Dashboard for the caller", body = DashboardResponse),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Backend failure"),
    ),
    security(
        ("X-Lgctl-User" = [])
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_dashboard(State(state): State<AppState>, current_user: CurrentUser) -> Result<Json<DashboardResponse>> {
    let dashboard = resolve_dashboard(state.store.as_ref(), current_user.id).await?;
    Ok(Json(DashboardResponse {
        dashboard,
        user: current_user,
    }))
}
