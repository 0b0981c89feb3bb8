use crate::common::context::Context;
use crate::entities::messages::{CreateMessageArgs, Message, UnreadCount};
use sqlx::SqliteConnection;

const TABLE_NAME: &str = "messages";
const READ_FIELDS: &str =
    "id, conversation_id, sender_id, content, is_preset, attachment_url, created_at, read_at";

pub async fn fetch_one<C: Context>(ctx: &C, message_id: i64) -> sqlx::Result<Message> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE id = ?"
    );
    sqlx::query_as(QUERY)
        .bind(message_id)
        .fetch_one(ctx.db())
        .await
}

/// Messages of one conversation in presentation order, optionally only those
/// stored after `after_id`.
pub async fn fetch_for_conversation<C: Context>(
    ctx: &C,
    conversation_id: &str,
    after_id: Option<i64>,
) -> sqlx::Result<Vec<Message>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " WHERE conversation_id = ? AND id > ?",
        " ORDER BY created_at ASC, id ASC"
    );
    sqlx::query_as(QUERY)
        .bind(conversation_id)
        .bind(after_id.unwrap_or(0))
        .fetch_all(ctx.db())
        .await
}

/// The latest message of every conversation the user takes part in.
pub async fn fetch_latest_for_user<C: Context>(
    ctx: &C,
    user_id: i64,
) -> sqlx::Result<Vec<Message>> {
    const QUERY: &str = const_str::concat!(
        "SELECT ",
        READ_FIELDS,
        " FROM ",
        TABLE_NAME,
        " m WHERE m.id = (",
        "SELECT l.id FROM messages l WHERE l.conversation_id = m.conversation_id ",
        "ORDER BY l.created_at DESC, l.id DESC LIMIT 1",
        ") AND m.conversation_id IN (",
        "SELECT c.id FROM conversations c WHERE c.student_id = ? OR c.mentor_id = ?",
        ")"
    );
    sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(ctx.db())
        .await
}

/// Unread messages addressed to the user, per conversation.
pub async fn fetch_unread_counts<C: Context>(
    ctx: &C,
    user_id: i64,
) -> sqlx::Result<Vec<UnreadCount>> {
    const QUERY: &str = const_str::concat!(
        "SELECT m.conversation_id, COUNT(*) AS unread_count ",
        "FROM messages m INNER JOIN conversations c ON m.conversation_id = c.id ",
        "WHERE (c.student_id = ? OR c.mentor_id = ?) ",
        "AND m.sender_id <> ? AND m.read_at IS NULL ",
        "GROUP BY m.conversation_id"
    );
    sqlx::query_as(QUERY)
        .bind(user_id)
        .bind(user_id)
        .bind(user_id)
        .fetch_all(ctx.db())
        .await
}

pub async fn create(
    conn: &mut SqliteConnection,
    args: CreateMessageArgs<'_>,
) -> sqlx::Result<Message> {
    const QUERY: &str = const_str::concat!(
        "INSERT INTO ",
        TABLE_NAME,
        " (conversation_id, sender_id, content, is_preset, attachment_url, created_at) ",
        "VALUES (?, ?, ?, ?, ?, ?) RETURNING ",
        READ_FIELDS
    );
    sqlx::query_as(QUERY)
        .bind(args.conversation_id)
        .bind(args.sender_id)
        .bind(args.content)
        .bind(args.is_preset)
        .bind(args.attachment_url)
        .bind(args.created_at)
        .fetch_one(conn)
        .await
}

/// Sets `read_at` unless it is already set. Returns whether the row changed.
pub async fn mark_read<C: Context>(ctx: &C, message_id: i64, read_at: i64) -> sqlx::Result<bool> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET read_at = ? WHERE id = ? AND read_at IS NULL"
    );
    let result = sqlx::query(QUERY)
        .bind(read_at)
        .bind(message_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected() == 1)
}

/// Marks every unread message in the conversation not sent by `reader_id`.
pub async fn mark_all_read<C: Context>(
    ctx: &C,
    conversation_id: &str,
    reader_id: i64,
    read_at: i64,
) -> sqlx::Result<u64> {
    const QUERY: &str = const_str::concat!(
        "UPDATE ",
        TABLE_NAME,
        " SET read_at = ? ",
        "WHERE conversation_id = ? AND sender_id <> ? AND read_at IS NULL"
    );
    let result = sqlx::query(QUERY)
        .bind(read_at)
        .bind(conversation_id)
        .bind(reader_id)
        .execute(ctx.db())
        .await?;
    Ok(result.rows_affected())
}
