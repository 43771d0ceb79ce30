//! HTTP request handlers.
//!
//! Handlers are thin: they extract the caller and the request body, check permissions through
//! [`crate::auth::permissions::RequiresPermission`], and delegate to [`crate::gate::DriverGate`]
//! or [`crate::dashboard`]. Errors are converted to responses by [`crate::errors::Error`].

pub mod dashboard;
pub mod drivers;
