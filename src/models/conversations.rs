use crate::common::error::AppError;
use crate::common::to_datetime;
use crate::entities::conversations::Conversation as ConversationEntity;
use crate::models::users::Role;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Free,
}

impl PaymentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Free => "free",
        }
    }

    /// Gated conversations restrict the student to preset messages.
    pub const fn is_gated(self) -> bool {
        matches!(self, PaymentStatus::Pending)
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            "completed" => Ok(PaymentStatus::Completed),
            "free" => Ok(PaymentStatus::Free),
            _ => Err(AppError::InternalServerError("unknown payment status")),
        }
    }
}

/// What kind of engagement opened the conversation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Engagement {
    #[default]
    Paid,
    /// Informational exchanges that never need a payment.
    Free,
}

impl Engagement {
    /// Only the mentor can waive payment. A student asking for a free
    /// conversation still gets a paid one.
    pub const fn granted_to(self, initiator: Role) -> Engagement {
        match initiator {
            Role::Mentor => self,
            Role::Student => Engagement::Paid,
        }
    }

    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Engagement::Paid => PaymentStatus::Pending,
            Engagement::Free => PaymentStatus::Free,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Conversation {
    pub conversation_id: Uuid,
    pub student_id: i64,
    pub mentor_id: i64,
    pub payment_status: PaymentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message_at: Option<DateTime<Utc>>,
}

impl Conversation {
    pub fn is_gated(&self) -> bool {
        self.payment_status.is_gated()
    }

    pub fn role_of(&self, user_id: i64) -> Option<Role> {
        if user_id == self.student_id {
            Some(Role::Student)
        } else if user_id == self.mentor_id {
            Some(Role::Mentor)
        } else {
            None
        }
    }

    pub fn counterpart_of(&self, user_id: i64) -> Option<i64> {
        match self.role_of(user_id)? {
            Role::Student => Some(self.mentor_id),
            Role::Mentor => Some(self.student_id),
        }
    }

    pub fn last_activity_at(&self) -> DateTime<Utc> {
        self.last_message_at.unwrap_or(self.created_at)
    }
}

impl TryFrom<ConversationEntity> for Conversation {
    type Error = AppError;
    fn try_from(value: ConversationEntity) -> Result<Self, Self::Error> {
        Ok(Self {
            conversation_id: Uuid::from_str(&value.id)?,
            student_id: value.student_id,
            mentor_id: value.mentor_id,
            payment_status: PaymentStatus::from_str(&value.payment_status)?,
            created_at: to_datetime(value.created_at),
            updated_at: to_datetime(value.updated_at),
            last_message_at: value.last_message_at.map(to_datetime),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn conversation(status: PaymentStatus) -> Conversation {
        Conversation {
            conversation_id: Uuid::new_v4(),
            student_id: 1,
            mentor_id: 2,
            payment_status: status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            last_message_at: None,
        }
    }

    #[test]
    fn students_cannot_waive_payment() {
        assert_eq!(Engagement::Free.granted_to(Role::Student), Engagement::Paid);
        assert_eq!(Engagement::Paid.granted_to(Role::Student), Engagement::Paid);
        assert_eq!(Engagement::Free.granted_to(Role::Mentor), Engagement::Free);
    }

    #[test]
    fn only_pending_is_gated() {
        assert!(conversation(PaymentStatus::Pending).is_gated());
        assert!(!conversation(PaymentStatus::Completed).is_gated());
        assert!(!conversation(PaymentStatus::Free).is_gated());
    }

    #[test]
    fn roles_follow_the_participant_columns() {
        let conversation = conversation(PaymentStatus::Pending);
        assert_eq!(conversation.role_of(1), Some(Role::Student));
        assert_eq!(conversation.role_of(2), Some(Role::Mentor));
        assert_eq!(conversation.role_of(3), None);
        assert_eq!(conversation.counterpart_of(1), Some(2));
        assert_eq!(conversation.counterpart_of(2), Some(1));
        assert_eq!(conversation.counterpart_of(3), None);
    }

    #[test]
    fn engagement_decides_the_initial_status() {
        assert_eq!(Engagement::Paid.initial_status(), PaymentStatus::Pending);
        assert_eq!(Engagement::Free.initial_status(), PaymentStatus::Free);
        assert_eq!(Engagement::default(), Engagement::Paid);
    }
}
