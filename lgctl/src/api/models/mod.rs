//! API request and response data models.
//!
//! These are distinct from the database models in [`crate::db::models`] so the wire format can
//! evolve independently of the schema. Every type is annotated with `utoipa` for the OpenAPI
//! document.
//!
//! - [`drivers`]: driver application forms, survey and permission responses
//! - [`users`]: the authenticated caller and dashboard selection

pub mod drivers;
pub mod users;
