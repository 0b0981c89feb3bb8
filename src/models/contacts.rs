use crate::models::conversations::Conversation;
use crate::models::messages::Message;
use crate::models::users::Role;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One conversation seen from the viewer's side, before profiles are attached.
#[derive(Debug, Clone)]
pub struct ConversationActivity {
    pub conversation: Conversation,
    /// Messages from the counterpart the viewer has not read.
    pub unread_count: i64,
    pub last_message: Option<Message>,
}

/// Read-time projection for a viewer's contact list. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contact {
    pub user_id: i64,
    pub display_name: String,
    pub avatar_url: Option<String>,
    pub role: Role,
    pub conversation_id: Uuid,
    pub unread_count: i64,
    pub last_message: Option<Message>,
    pub last_activity_at: DateTime<Utc>,
}
