use crate::common::context::Context;
use crate::entities::sessions::SessionIdentity;

pub async fn fetch_identity<C: Context>(
    ctx: &C,
    token: &str,
    now: i64,
) -> sqlx::Result<SessionIdentity> {
    const QUERY: &str = const_str::concat!(
        "SELECT s.user_id, u.role ",
        "FROM sessions s INNER JOIN users u ON s.user_id = u.id ",
        "WHERE s.token = ? AND s.expires_at > ?"
    );
    sqlx::query_as(QUERY)
        .bind(token)
        .bind(now)
        .fetch_one(ctx.db())
        .await
}
