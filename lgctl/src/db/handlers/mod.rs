//! Repository implementations for database access.
//!
//! Each repository:
//! - Wraps a SQLx connection or transaction
//! - Provides strongly-typed operations for one table (or view)
//! - Returns models from [`crate::db::models`]
//!
//! # Available Repositories
//!
//! - [`DriverSurveys`]: driver applications and their review status
//! - [`DriverPermissions`]: the driver gate flag and its audit fields
//! - [`UserRoles`]: admin and office-staff flags
//!
//! ```ignore
//! use lgctl::db::handlers::DriverSurveys;
//!
//! let mut conn = pool.acquire().await?;
//! let mut repo = DriverSurveys::new(&mut conn);
//! if let Some(survey) = repo.get_by_user(user_id).await? {
//!     println!("status: {:?}", survey.status);
//! }
//! ```

pub mod driver_permissions;
pub mod driver_surveys;
pub mod users;

pub use driver_permissions::DriverPermissions;
pub use driver_surveys::DriverSurveys;
pub use users::UserRoles;
