//! Identity and authorization.
//!
//! Authentication is delegated to a trusted upstream proxy, which forwards the caller's user id
//! in a configurable header (default `x-lgctl-user`). The admin and office-staff flags are then
//! read from the store on every request.
//!
//! # Modules
//!
//! - [`current_user`]: `CurrentUser` extractor for handlers
//! - [`permissions`]: role checks and the `RequiresPermission` guard
//!
//! # Usage in Handlers
//!
//! ```ignore
//! use lgctl::auth::permissions::{operation, resource, RequiresPermission};
//!
//! async fn list_surveys(
//!     State(state): State<AppState>,
//!     _: RequiresPermission<resource::DriverSurveys, operation::ReadAll>,
//! ) -> Result<Json<Vec<DriverSurveyResponse>>> {
//!     // ...
//! }
//! ```

pub mod current_user;
pub mod permissions;
