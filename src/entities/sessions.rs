use sqlx::FromRow;

/// A live session joined with the role of its user.
#[derive(Debug, FromRow)]
pub struct SessionIdentity {
    pub user_id: i64,
    pub role: String,
}
