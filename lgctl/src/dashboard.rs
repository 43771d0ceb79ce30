//! Role-based dashboard selection.

use serde::Serialize;
use tracing::instrument;
use utoipa::ToSchema;

use crate::{
    db::models::users::AccountRoles,
    errors::Result,
    store::DriverStore,
    types::{UserId, abbrev_uuid},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Dashboard {
    Admin,
    OfficeStaff,
    User,
}

impl From<AccountRoles> for Dashboard {
    fn from(roles: AccountRoles) -> Self {
        if roles.is_admin {
            Dashboard::Admin
        } else if roles.is_office_staff {
            Dashboard::OfficeStaff
        } else {
            Dashboard::User
        }
    }
}

#[instrument(skip(store), fields(user_id = %abbrev_uuid(&user_id)), err)]
pub async fn resolve_dashboard(store: &dyn DriverStore, user_id: UserId) -> Result<Dashboard> {
    let roles = store.get_account_roles(user_id).await?;
    Ok(Dashboard::from(roles))
}
