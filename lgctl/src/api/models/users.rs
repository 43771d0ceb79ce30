//! API request/response models for users.

use crate::{dashboard::Dashboard, db::models::users::AccountRoles, types::UserId};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// The authenticated caller, resolved from the trusted proxy header
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub is_admin: bool,
    pub is_office_staff: bool,
}

impl CurrentUser {
    pub fn from_roles(id: UserId, roles: AccountRoles) -> Self {
        Self {
            id,
            is_admin: roles.is_admin,
            is_office_staff: roles.is_office_staff,
        }
    }

    #[cfg(test)]
    pub fn admin(id: UserId) -> Self {
        Self {
            id,
            is_admin: true,
            is_office_staff: false,
        }
    }

    #[cfg(test)]
    pub fn standard(id: UserId) -> Self {
        Self {
            id,
            is_admin: false,
            is_office_staff: false,
        }
    }
}

/// Which dashboard the caller should be routed to
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub dashboard: Dashboard,
    pub user: CurrentUser,
}
