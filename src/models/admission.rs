//! Rules deciding whether a send attempt may be stored.

use crate::common::error::AppError;
use crate::models::conversations::Conversation;
use crate::models::users::Role;

pub const DEFAULT_MAX_LENGTH: usize = 120;

pub const DEFAULT_PRESET_MESSAGES: &[&str] = &[
    "I'm interested in booking a conversation",
    "Could you tell me more about your experience?",
    "What does a typical session with you look like?",
    "Are you available this week?",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    Allow,
    Deny(Denial),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Denial {
    Empty,
    TooLong,
    PaymentRequired,
}

impl Denial {
    pub const fn as_error(self) -> AppError {
        match self {
            Denial::Empty => AppError::MessagesEmpty,
            Denial::TooLong => AppError::MessagesTooLong,
            Denial::PaymentRequired => AppError::MessagesPaymentRequired,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AdmissionPolicy {
    max_length: usize,
    preset_messages: Vec<String>,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_MAX_LENGTH,
            DEFAULT_PRESET_MESSAGES
                .iter()
                .map(|preset| preset.to_string())
                .collect(),
        )
    }
}

impl AdmissionPolicy {
    pub fn new(max_length: usize, preset_messages: Vec<String>) -> Self {
        Self {
            max_length,
            preset_messages,
        }
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn preset_messages(&self) -> &[String] {
        &self.preset_messages
    }

    pub fn is_preset(&self, content: &str) -> bool {
        let content = content.trim();
        self.preset_messages.iter().any(|preset| preset == content)
    }

    /// Length counts characters of the trimmed content, not bytes.
    ///
    /// On a gated conversation the student may only send content from the preset list.
    /// Mentors are only bound by the length rule.
    pub fn check(&self, conversation: &Conversation, sender_role: Role, content: &str) -> Admission {
        let content = content.trim();
        if content.is_empty() {
            return Admission::Deny(Denial::Empty);
        }
        if content.chars().count() > self.max_length {
            return Admission::Deny(Denial::TooLong);
        }

        if conversation.is_gated() && sender_role == Role::Student && !self.is_preset(content) {
            return Admission::Deny(Denial::PaymentRequired);
        }

        Admission::Allow
    }
}
