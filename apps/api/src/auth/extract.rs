use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::auth::credentials::{Principal, Role};
use crate::auth::session::Session;
use crate::errors::AppError;
use crate::state::AppState;

/// Any logged-in caller, resolved from `Authorization: Bearer <token>`.
pub struct CurrentUser {
    pub token: Uuid,
    pub principal: Principal,
}

/// A logged-in caller with the admin role.
pub struct AdminUser(pub Principal);

fn bearer_token(headers: &HeaderMap) -> Option<Uuid> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    Uuid::parse_str(token.trim()).ok()
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let token = bearer_token(&parts.headers).ok_or(AppError::Unauthorized)?;
        match state.sessions.session(&token).await {
            Session::Authenticated(principal) => Ok(CurrentUser { token, principal }),
            Session::Anonymous => Err(AppError::Unauthorized),
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user = CurrentUser::from_request_parts(parts, state).await?;
        if user.principal.role != Role::Admin {
            return Err(AppError::Forbidden);
        }
        Ok(AdminUser(user.principal))
    }
}
