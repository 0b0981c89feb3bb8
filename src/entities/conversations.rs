use sqlx::FromRow;

#[derive(Debug, FromRow)]
pub struct Conversation {
    pub id: String,
    pub student_id: i64,
    pub mentor_id: i64,
    pub payment_status: String,
    pub created_at: i64,
    pub updated_at: i64,
    pub last_message_at: Option<i64>,
}
