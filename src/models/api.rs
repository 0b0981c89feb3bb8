use crate::models::conversations::Engagement;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct StartConversationArgs {
    pub counterpart_id: i64,
    #[serde(default)]
    pub engagement: Engagement,
}

#[derive(Debug, Deserialize)]
pub struct SendMessageArgs {
    pub content: String,
    #[serde(default)]
    pub is_preset: bool,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct FetchMessagesArgs {
    /// Only messages stored after this message id.
    pub after: Option<i64>,
    /// Long-poll for up to this many milliseconds when nothing newer exists.
    pub wait_ms: Option<u64>,
}

#[derive(Debug, Serialize)]
pub struct AdmissionResponse {
    pub allowed: bool,
    pub code: Option<&'static str>,
    pub message: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct MarkAllReadResponse {
    pub marked: u64,
}

#[derive(Debug, Serialize)]
pub struct MessagingConfigResponse {
    pub max_length: usize,
    pub preset_messages: Vec<String>,
    pub message_poll_interval_ms: u64,
    pub conversation_poll_interval_ms: u64,
}
