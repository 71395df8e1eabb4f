//! Laundromat API Library
//!
//! Administrative backend for a laundry service: coverage areas with their
//! weekly pickup slot grids, postcodes, the priced service catalog, and
//! customer accounts with email verification and password reset.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod mailer;
pub mod migrator;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
    pub auth: Arc<auth::AuthService>,
}

// API routes under /api/v1
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        // Accounts: registration, verification, login, profile, reset
        .nest("/auth", handlers::auth::auth_routes())
        // Areas plus their nested time-slot grid
        .nest(
            "/areas",
            handlers::areas::area_routes().merge(handlers::time_slots::area_slot_routes()),
        )
        .route(
            "/time-slots",
            get(handlers::time_slots::list_time_slots),
        )
        .nest("/postcodes", handlers::postcodes::postcode_routes())
        .nest("/categories", handlers::categories::category_routes())
        .nest("/items", handlers::items::item_routes())
}

async fn api_status() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");
    Json(json!({
        "status": "ok",
        "version": version,
        "service": "laundromat-api",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "checks": {
            "database": db_status,
        },
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
