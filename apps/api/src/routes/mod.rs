pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as auth;
use crate::dashboard::handlers as dashboard;
use crate::state::AppState;
use crate::submission;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session gate
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        .route("/api/v1/auth/me", get(auth::handle_me))
        // Admin dashboard
        .route("/api/v1/dashboard", get(dashboard::handle_dashboard))
        .route(
            "/api/v1/dashboard/:kind",
            get(dashboard::handle_kind_dashboard),
        )
        .route(
            "/api/v1/dashboard/:kind/alerts",
            get(dashboard::handle_kind_alerts),
        )
        // Form submissions
        .route("/api/v1/records/:kind", post(submission::handle_submit))
        .with_state(state)
}
