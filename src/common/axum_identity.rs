use crate::common::error::AppError;
use crate::common::state::AppState;
use crate::models::users::{Admin, Identity};
use crate::usecases::sessions;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;

const BEARER_PREFIX: &str = "Bearer ";

fn bearer_token(parts: &Parts) -> Option<&str> {
    let header = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    header.strip_prefix(BEARER_PREFIX)
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match bearer_token(parts) {
            Some(token) => sessions::authenticate(state, token).await,
            None => Err(AppError::Unauthorized),
        }
    }
}

impl FromRequestParts<AppState> for Admin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Err(AppError::Unauthorized);
        };
        match state.admin_token.as_deref() {
            Some(admin_token) if admin_token == token => Ok(Admin),
            _ => Err(AppError::Forbidden),
        }
    }
}
