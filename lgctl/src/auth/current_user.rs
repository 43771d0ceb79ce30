use crate::{
    AppState,
    api::models::users::CurrentUser,
    errors::{Error, Result},
    types::{UserId, abbrev_uuid},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{debug, instrument, trace};

/// Read the user id forwarded by the upstream proxy.
///
/// Returns:
/// - Err(Unauthenticated): header absent
/// - Err(BadRequest): header present but not a UUID
fn proxy_header_user_id(parts: &Parts, header_name: &str) -> Result<UserId> {
    let value = match parts.headers.get(header_name) {
        Some(value) => value,
        None => {
            trace!("No proxy header '{}' on request", header_name);
            return Err(Error::Unauthenticated { message: None });
        }
    };

    let raw = value.to_str().map_err(|e| Error::BadRequest {
        message: format!("Invalid {header_name} header: {e}"),
    })?;

    raw.trim().parse::<UserId>().map_err(|e| Error::BadRequest {
        message: format!("Invalid {header_name} header: {e}"),
    })
}

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        // Handlers that also take a RequiresPermission guard would otherwise look the roles up twice
        if let Some(user) = parts.extensions.get::<CurrentUser>() {
            return Ok(user.clone());
        }

        let user_id = proxy_header_user_id(parts, &state.config.auth.proxy_header.header_name)?;
        let roles = state.store.get_account_roles(user_id).await?;
        let user = CurrentUser::from_roles(user_id, roles);
        debug!(
            "Found proxy header authenticated user: {} (admin: {})",
            abbrev_uuid(&user.id),
            user.is_admin
        );

        parts.extensions.insert(user.clone());
        Ok(user)
    }
}
