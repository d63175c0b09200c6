use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use crate::app_state::AppState;

pub mod auth;
pub mod comic;
pub mod error;
pub mod health;
pub mod metrics;

/// Prefix shared by all API routes.
pub const API_PREFIX: &str = "/api/v1";

/// GET / — service banner.
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "Comic Diary AI Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
    }))
}

/// Application routes. Middleware and `/metrics` are attached by the binary.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health::health_check))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/comic/generate", post(comic::generate_comic))
        .route("/comic/{id}", get(comic::get_comic));

    Router::new()
        .route("/", get(root))
        .nest(API_PREFIX, api)
        .with_state(state)
}
