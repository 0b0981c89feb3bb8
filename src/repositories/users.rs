use crate::common::context::Context;
use crate::entities::users::User;
use sqlx::{QueryBuilder, Sqlite};

const TABLE_NAME: &str = "users";
const READ_FIELDS: &str = "id, display_name, avatar_url, role";

pub async fn fetch_one<C: Context>(ctx: &C, user_id: i64) -> sqlx::Result<User> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE id = ?"
    );
    sqlx::query_as(QUERY)
        .bind(user_id)
        .fetch_one(ctx.db())
        .await
}

pub async fn fetch_many<C: Context>(ctx: &C, user_ids: &[i64]) -> sqlx::Result<Vec<User>> {
    if user_ids.is_empty() {
        return Ok(vec![]);
    }

    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE id IN ("
    );
    let mut query = QueryBuilder::<Sqlite>::new(QUERY);
    let mut separated = query.separated(", ");
    for user_id in user_ids {
        separated.push_bind(*user_id);
    }
    separated.push_unseparated(")");
    query.build_query_as().fetch_all(ctx.db()).await
}
