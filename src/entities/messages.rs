use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Message {
    pub id: i64,
    pub conversation_id: String,
    pub sender_id: i64,
    pub content: String,
    pub is_preset: bool,
    pub attachment_url: Option<String>,
    pub created_at: i64,
    pub read_at: Option<i64>,
}

#[derive(Debug, FromRow)]
pub struct UnreadCount {
    pub conversation_id: String,
    pub unread_count: i64,
}

pub struct CreateMessageArgs<'a> {
    pub conversation_id: &'a str,
    pub sender_id: i64,
    pub content: &'a str,
    pub is_preset: bool,
    pub attachment_url: Option<&'a str>,
    pub created_at: i64,
}
