//! # lgctl: Driver onboarding for the logistics dashboard
//!
//! `lgctl` decides whether a user of the logistics dashboard may use the driver workflow, and
//! runs the onboarding flow that gets them there: a one-time application form, administrator
//! review, and a per-user driver permission that administrators can grant or revoke.
//!
//! ## Architecture
//!
//! - **HTTP server**: an Axum router mounted at `/api/v1`, documented with OpenAPI
//! - **Gate**: [`gate::DriverGate`] holds the onboarding rules and sequences store writes
//! - **Store**: [`store::DriverStore`], backed by PostgreSQL or an in-memory map
//! - **Authentication**: the upstream proxy forwards the caller's user id in a trusted header
//!
//! The driver workflow itself (the operational form) lives outside this service; the gate only
//! tells the dashboard which screen to open. [`session::DriverFlow`] models the client-side
//! navigation for embedders that drive the flow programmatically.
//!
//! ## Configuration
//!
//! See [`config`] for the YAML file and environment overrides.

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod errors;
pub mod gate;
pub mod openapi;
pub mod session;
pub mod store;
pub mod telemetry;
#[cfg(test)]
pub mod test;
pub mod types;

use anyhow::Context;
use axum::{
    Router,
    http::{self, HeaderValue},
    routing::{get, patch, post},
};
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::{api::handlers, config::CorsOrigin, openapi::ApiDoc, store::DriverStore};

/// Shared state handed to every handler
#[derive(Clone, Builder)]
pub struct AppState {
    pub store: Arc<dyn DriverStore>,
    pub config: Config,
}

/// Get the database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allowed = &config.auth.security.cors.allowed_origins;
    // tower-http refuses "*" inside an origin list
    let allow_origin = if allowed.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in allowed {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send origins without the trailing slash `Url` adds
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PATCH])
        .allow_headers([
            http::header::CONTENT_TYPE,
            config.auth.proxy_header.header_name.parse::<http::HeaderName>()?,
        ])
        .allow_credentials(config.auth.security.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.security.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router.
///
/// - `/healthz`: liveness check
/// - `/api/v1/*`: dashboard routing and driver onboarding
/// - `/api-docs/openapi.json` and `/docs`: OpenAPI document and its viewer
///
/// # Errors
///
/// Returns an error if the CORS configuration can't be turned into header values.
pub fn build_router(state: &AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        .route("/dashboard", get(handlers::dashboard::get_dashboard))
        .route("/drivers/current/access", get(handlers::drivers::get_current_access))
        .route(
            "/drivers/current/survey",
            get(handlers::drivers::get_current_survey).post(handlers::drivers::submit_current_survey),
        )
        .route("/driver-surveys", get(handlers::drivers::list_driver_surveys))
        .route("/driver-surveys/{user_id}", patch(handlers::drivers::review_driver_survey))
        .route("/driver-permissions", get(handlers::drivers::list_driver_permissions))
        .route(
            "/driver-permissions/{user_id}/toggle",
            post(handlers::drivers::toggle_driver_permission),
        );

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { axum::Json(ApiDoc::openapi()) }))
        .nest("/api/v1", api_routes)
        .with_state(state.clone())
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(create_cors_layer(&state.config)?)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service: a router plus the configuration it was built from
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create the backing store described by `config`, mirror the configured accounts into it
    /// and build the router on top of it
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let store = store::create_store(&config.database)
            .await
            .context("Failed to initialise the backing store")?;
        store::seed_accounts(store.as_ref(), &config).await?;
        Self::new_with_store(config, store)
    }

    /// Build the application on an already constructed store
    pub fn new_with_store(config: Config, store: Arc<dyn DriverStore>) -> anyhow::Result<Self> {
        let state = AppState::builder().store(store).config(config.clone()).build();
        let router = build_router(&state)?;
        Ok(Self { router, config })
    }

    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Driver onboarding listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        telemetry::shutdown_telemetry();
        info!("Shutdown complete");
        Ok(())
    }
}
