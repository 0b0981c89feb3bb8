use crate::common::error::AppError;
use crate::common::to_datetime;
use crate::entities::messages::Message as MessageEntity;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub conversation_id: Uuid,
    pub sender_id: i64,
    pub content: String,
    pub is_preset: bool,
    pub attachment_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

impl Message {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    /// Presentation order inside a conversation.
    pub fn order_key(&self) -> (DateTime<Utc>, i64) {
        (self.created_at, self.message_id)
    }
}

impl TryFrom<MessageEntity> for Message {
    type Error = AppError;
    fn try_from(value: MessageEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            message_id: value.id,
            conversation_id: Uuid::from_str(&value.conversation_id)?,
            sender_id: value.sender_id,
            content: value.content,
            is_preset: value.is_preset,
            attachment_url: value.attachment_url,
            created_at: to_datetime(value.created_at),
            read_at: value.read_at.map(to_datetime),
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct SendMessageArgs<'a> {
    pub content: &'a str,
    pub is_preset: bool,
    pub attachment_url: Option<&'a str>,
}
