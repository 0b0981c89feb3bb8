use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, unwrap_expect};
use crate::models::users::Identity;
use crate::repositories::sessions;
use chrono::Utc;

/// Resolves a session token into the caller's identity and role.
pub async fn authenticate<C: Context>(ctx: &C, token: &str) -> ServiceResult<Identity> {
    let token = token.trim();
    if token.is_empty() {
        return Err(AppError::Unauthorized);
    }

    let now = Utc::now().timestamp_millis();
    let identity = unwrap_expect! {
        sessions::fetch_identity(ctx, token, now).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::Unauthorized)
    };
    Identity::try_from(identity)
}
