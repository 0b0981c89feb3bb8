use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, store_unavailable, unwrap_expect};
use crate::models::users::Profile;
use crate::repositories::users;
use hashbrown::HashMap;
use tracing::warn;

pub async fn fetch_one<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Profile> {
    let user = unwrap_expect! {
        users::fetch_one(ctx, user_id).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::UsersNotFound)
    };
    Profile::try_from(user)
}

/// Profiles keyed by user id. Ids without a profile are left out.
pub async fn fetch_profiles<C: Context>(
    ctx: &C,
    user_ids: &[i64],
) -> ServiceResult<HashMap<i64, Profile>> {
    let users = match users::fetch_many(ctx, user_ids).await {
        Ok(users) => users,
        Err(e) => return store_unavailable(e),
    };

    let mut profiles = HashMap::with_capacity(users.len());
    for user in users {
        let user_id = user.id;
        match Profile::try_from(user) {
            Ok(profile) => {
                profiles.insert(user_id, profile);
            }
            Err(e) => warn!(user_id, code = e.code(), "Skipping unreadable profile"),
        }
    }
    Ok(profiles)
}
