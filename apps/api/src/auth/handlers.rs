use axum::{extract::State, http::StatusCode, Json};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::credentials::{Principal, Role};
use crate::auth::extract::CurrentUser;
use crate::auth::session::Session;
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: Uuid,
    pub username: String,
    pub role: Role,
}

/// POST /api/v1/auth/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::Validation(
            "Username and password are required".to_string(),
        ));
    }

    let session = Session::Anonymous.login(&state.credentials, &req.username, &req.password)?;
    let principal = session
        .principal()
        .cloned()
        .ok_or(AppError::Unauthorized)?;
    let token = state.sessions.open(principal.clone()).await;

    Ok(Json(LoginResponse {
        token,
        username: principal.username,
        role: principal.role,
    }))
}

/// POST /api/v1/auth/logout
pub async fn handle_logout(State(state): State<AppState>, user: CurrentUser) -> StatusCode {
    let session = state.sessions.session(&user.token).await;
    if state.sessions.set(user.token, session.logout()).await {
        info!("User '{}' logged out", user.principal.username);
    }
    StatusCode::NO_CONTENT
}

/// GET /api/v1/auth/me
pub async fn handle_me(user: CurrentUser) -> Json<Principal> {
    Json(user.principal)
}
