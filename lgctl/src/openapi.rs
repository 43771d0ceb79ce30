//! OpenAPI documentation for the driver onboarding API at `/api/v1/*`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{api, dashboard, db, gate};

/// Security scheme for the trusted proxy header.
struct ProxyHeaderSecurityAddon;

impl Modify for ProxyHeaderSecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "X-Lgctl-User".to_string(),
                SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                    "x-lgctl-user",
                    "User id of the authenticated caller. Set by the upstream authentication proxy; \
                    requests without it are rejected with 401.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api/v1", description = "Driver onboarding API")
    ),
    modifiers(&ProxyHeaderSecurityAddon),
    paths(
        api::handlers::dashboard::get_dashboard,
        api::handlers::drivers::get_current_access,
        api::handlers::drivers::get_current_survey,
        api::handlers::drivers::submit_current_survey,
        api::handlers::drivers::list_driver_surveys,
        api::handlers::drivers::review_driver_survey,
        api::handlers::drivers::list_driver_permissions,
        api::handlers::drivers::toggle_driver_permission,
    ),
    components(
        schemas(
            api::models::users::CurrentUser,
            api::models::users::DashboardResponse,
            api::models::drivers::AgeInput,
            api::models::drivers::SurveyForm,
            api::models::drivers::DriverSurveyResponse,
            api::models::drivers::DriverSurveyListItem,
            api::models::drivers::DriverPermissionResponse,
            api::models::drivers::DriverPermissionListItem,
            api::models::drivers::DriverAccessResponse,
            api::models::drivers::SurveyStateResponse,
            api::models::drivers::SubmitSurveyResponse,
            api::models::drivers::ReviewSurveyRequest,
            api::models::drivers::ReviewSurveyResponse,
            api::models::drivers::TogglePermissionRequest,
            db::models::driver_surveys::SurveyStatus,
            dashboard::Dashboard,
            gate::DriverAccess,
            gate::SurveyState,
            gate::DriverScreen,
            gate::ReviewDecision,
        )
    ),
    tags(
        (name = "drivers", description = "Driver applications and the driver eligibility gate"),
        (name = "users", description = "Caller identity and dashboard routing"),
    ),
    info(
        title = "lgctl API",
        description = "Driver onboarding and eligibility gate for the logistics dashboard.",
    )
)]
pub struct ApiDoc;
