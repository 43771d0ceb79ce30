//! HTTP API layer.
//!
//! All routes are mounted under `/api/v1`. The caller is identified by the user id the upstream
//! proxy forwards in a trusted header (see [`crate::auth`]).
//!
//! - [`handlers`]: route handlers
//! - [`models`]: request and response types

pub mod handlers;
pub mod models;
