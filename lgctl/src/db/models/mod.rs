//! Database record models matching table schemas.
//!
//! These models are used by repositories to return query results and accept insertion/update
//! data. They derive `sqlx::FromRow` and are kept separate from the API models in
//! [`crate::api::models`] so storage and wire representations can evolve independently.
//!
//! - [`driver_surveys`]: driver applications and the admin list view
//! - [`driver_permissions`]: the operative driver gate and its audit fields
//! - [`users`]: role flags used for dashboard routing and admin checks

pub mod driver_permissions;
pub mod driver_surveys;
pub mod users;
