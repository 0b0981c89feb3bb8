use crate::common::context::Context;
use crate::entities::conversations::Conversation;
use crate::models::conversations::PaymentStatus;
use sqlx::SqliteConnection;

const TABLE_NAME: &str = "conversations";
const READ_FIELDS: &str =
    "id, student_id, mentor_id, payment_status, created_at, updated_at, last_message_at";

pub async fn fetch_one<C: Context>(ctx: &C, conversation_id: &str) -> sqlx::Result<Conversation> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE id = ?"
    );
    sqlx::query_as(QUERY)
        .bind(conversation_id)
        .fetch_one(ctx.db())
        .await
}

pub async fn fetch_by_pair<C: Context>(
    ctx: &C,
    student_id: i64,
    mentor_id: i64,
) -> sqlx::Result<Conversation> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE student_id = ? AND mentor_id = ?"
    );
    sqlx::query_as(QUERY)
        .bind(student_id)
        .bind(mentor_id)
        .fetch_one(ctx.db())
        .await
}

/// Most recently active first.
pub async fn fetch_all_for_user<C: Context>(
    ctx: &C,
    user_id: i64,
) -> sqlx::Result<Vec<Conversation>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE student_id = ? OR mentor_id = ?",
        " ORDER BY COALESCE(last_message_at, created_at) DESC, id"
    );
    sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(ctx.db())
        .await
}

/// Inserts the conversation unless the pair already has one.
/// Returns whether a row was inserted.
pub async fn create<C: Context>(
    ctx: &C,
    conversation_id: &str,
    student_id: i64,
    mentor_id: i64,
    payment_status: PaymentStatus,
    created_at: i64,
) -> sqlx::Result<bool> {
    const QUERY: &str = const_str::concat!(
        "INSERT INTO ",
        TABLE_NAME,
        " (id, student_id, mentor_id, payment_status, created_at, updated_at) ",
        "VALUES (?, ?, ?, ?, ?, ?) ",
        "ON CONFLICT (student_id, mentor_id) DO NOTHING"
    );
    let result = sqlx::query(QUERY)
        .bind(conversation_id)
        .bind(student_id)
        .bind(mentor_id)
        .bind(payment_status.as_str())
        .bind(created_at)
        .bind(created_at)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Moves a pending conversation to completed. Returns whether it transitioned.
pub async fn complete_payment<C: Context>(
    ctx: &C,
    conversation_id: &str,
    updated_at: i64,
) -> sqlx::Result<bool> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET payment_status = ?, updated_at = MAX(updated_at, ?)",
        " WHERE id = ? AND payment_status = ?"
    );
    let result = sqlx::query(QUERY)
        .bind(PaymentStatus::Completed.as_str())
        .bind(updated_at)
        .bind(conversation_id)
        .bind(PaymentStatus::Pending.as_str())
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Never moves `last_message_at` backwards, so delayed writes cannot regress it.
pub async fn touch_last_message(
    conn: &mut SqliteConnection,
    conversation_id: &str,
    message_at: i64,
) -> sqlx::Result<()> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET last_message_at = MAX(COALESCE(last_message_at, 0), ?),",
        " updated_at = MAX(updated_at, ?)",
        " WHERE id = ?"
    );
    sqlx::query(QUERY)
        .bind(message_at)
        .bind(message_at)
        .bind(conversation_id)
        .execute(conn)
        .await?;
    Ok(())
}
