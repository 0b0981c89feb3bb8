use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, store_unavailable, unwrap_expect};
use crate::models::conversations::{Conversation, Engagement};
use crate::models::users::{Identity, Role};
use crate::repositories::conversations;
use crate::usecases::users;
use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

pub async fn fetch_one<C: Context>(ctx: &C, conversation_id: Uuid) -> ServiceResult<Conversation> {
    let conversation = unwrap_expect! {
        conversations::fetch_one(ctx, &conversation_id.to_string()).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::ConversationsNotFound)
    };
    Conversation::try_from(conversation)
}

/// Fetches a conversation the caller takes part in, along with the caller's role in it.
pub async fn fetch_for_participant<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
) -> ServiceResult<(Conversation, Role)> {
    let conversation = fetch_one(ctx, conversation_id).await?;
    match conversation.role_of(identity.user_id) {
        Some(role) => Ok((conversation, role)),
        None => Err(AppError::ConversationsNotParticipant),
    }
}

pub async fn fetch_all<C: Context>(ctx: &C, user_id: i64) -> ServiceResult<Vec<Conversation>> {
    match conversations::fetch_all_for_user(ctx, user_id).await {
        Ok(conversations) => conversations
            .into_iter()
            .map(Conversation::try_from)
            .collect(),
        Err(e) => store_unavailable(e),
    }
}

/// Opens the conversation between the caller and `counterpart_id`, or returns the one
/// that already exists for the pair. Roles come from the two users' profiles: one side
/// must be a student and the other a mentor. A free engagement is only granted when a
/// mentor opens the conversation.
pub async fn start<C: Context>(
    ctx: &C,
    initiator: &Identity,
    counterpart_id: i64,
    engagement: Engagement,
) -> ServiceResult<Conversation> {
    if initiator.user_id == counterpart_id {
        return Err(AppError::ConversationsInvalidParticipants);
    }

    let counterpart = match users::fetch_one(ctx, counterpart_id).await {
        Ok(counterpart) => counterpart,
        Err(AppError::UsersNotFound) => return Err(AppError::ConversationsInvalidParticipants),
        Err(e) => return Err(e),
    };
    let (student_id, mentor_id) = match (initiator.role, counterpart.role) {
        (Role::Student, Role::Mentor) => (initiator.user_id, counterpart_id),
        (Role::Mentor, Role::Student) => (counterpart_id, initiator.user_id),
        _ => return Err(AppError::ConversationsInvalidParticipants),
    };

    let granted = engagement.granted_to(initiator.role);
    if granted != engagement {
        debug!(
            user_id = initiator.user_id,
            counterpart_id, "Student asked for a free conversation, opening a paid one"
        );
    }

    let conversation_id = Uuid::new_v4();
    let payment_status = granted.initial_status();
    let created_at = Utc::now().timestamp_millis();
    let created = match conversations::create(
        ctx,
        &conversation_id.to_string(),
        student_id,
        mentor_id,
        payment_status,
        created_at,
    )
    .await
    {
        Ok(created) => created,
        Err(e) => return store_unavailable(e),
    };
    if created {
        info!(
            conversation_id = conversation_id.to_string(),
            student_id,
            mentor_id,
            payment_status = payment_status.as_str(),
            "Conversation started"
        );
    }

    let conversation = unwrap_expect! {
        conversations::fetch_by_pair(ctx, student_id, mentor_id).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::ConversationsNotFound)
    };
    Conversation::try_from(conversation)
}

/// Applies a completed external payment. Only `pending` conversations change;
/// completed and free ones are returned untouched.
pub async fn complete_payment<C: Context>(
    ctx: &C,
    conversation_id: Uuid,
) -> ServiceResult<Conversation> {
    let now = Utc::now().timestamp_millis();
    match conversations::complete_payment(ctx, &conversation_id.to_string(), now).await {
        Ok(true) => info!(
            conversation_id = conversation_id.to_string(),
            "Conversation payment completed"
        ),
        Ok(false) => info!(
            conversation_id = conversation_id.to_string(),
            "Conversation was not pending, ignoring payment completion"
        ),
        Err(e) => return store_unavailable(e),
    }
    fetch_one(ctx, conversation_id).await
}
