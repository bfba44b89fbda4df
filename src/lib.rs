//! BOM Explosion Library
//!
//! Recursive bill-of-materials explosion, material requirements aggregation
//! and cost rollup for manufacturing order and batch tracking.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::config::AppConfig;
use crate::repositories::BomNodeResolver;
use crate::services::ExplosionSettings;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: Arc<dyn BomNodeResolver>) -> Self {
        let settings = ExplosionSettings::from(&config);
        Self {
            config: Arc::new(config),
            services: handlers::AppServices::new(catalog, settings),
        }
    }
}

/// Routes served under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new().merge(handlers::bom::bom_routes())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any)
        .expose_headers([axum::http::HeaderName::from_static(
            crate::tracing::REQUEST_ID_HEADER,
        )])
        .max_age(std::time::Duration::from_secs(3600))
}

/// Full application router with request-id, tracing and CORS layers applied
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "bom-explosion up" }))
        .nest("/health", handlers::health::health_routes())
        .nest("/api/v1", api_v1_routes())
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors_layer())
        .layer(axum::middleware::from_fn(
            crate::tracing::request_id_middleware,
        ))
        .with_state(state)
}

pub mod prelude {
    pub use crate::errors::*;
    pub use crate::models::*;
    pub use crate::repositories::*;
    pub use crate::services::*;
}
