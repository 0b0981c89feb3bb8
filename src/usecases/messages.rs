use crate::common::context::Context;
use crate::common::error::{AppError, ServiceResult, store_unavailable, unwrap_expect};
use crate::entities::messages::CreateMessageArgs;
use crate::models::admission::Admission;
use crate::models::messages::{Message, SendMessageArgs};
use crate::models::users::Identity;
use crate::repositories::messages;
use crate::repositories::streams::StreamName;
use crate::usecases::{conversations, streams};
use chrono::Utc;
use std::time::Duration;
use tracing::{debug, info};
use uuid::Uuid;

const ATTACHMENT_URL_MAX_LENGTH: usize = 2048;

/// Pre-check for the composer. `send` applies the same rules again.
pub async fn can_send<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
    content: &str,
) -> ServiceResult<Admission> {
    let (conversation, role) =
        conversations::fetch_for_participant(ctx, identity, conversation_id).await?;
    Ok(ctx.policy().check(&conversation, role, content))
}

pub async fn send<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
    args: SendMessageArgs<'_>,
) -> ServiceResult<Message> {
    let (conversation, role) =
        conversations::fetch_for_participant(ctx, identity, conversation_id).await?;

    let policy = ctx.policy();
    if let Admission::Deny(denial) = policy.check(&conversation, role, args.content) {
        debug!(
            conversation_id = conversation_id.to_string(),
            sender_id = identity.user_id,
            code = denial.as_error().code(),
            "Message denied"
        );
        return Err(denial.as_error());
    }

    let attachment_url = match args.attachment_url.map(str::trim) {
        None => None,
        Some(url) if url.is_empty() || url.len() > ATTACHMENT_URL_MAX_LENGTH => {
            return Err(AppError::MessagesInvalidAttachment);
        }
        Some(url) => Some(url),
    };

    let content = args.content.trim();
    let is_preset = args.is_preset && policy.is_preset(content);
    let conversation_key = conversation_id.to_string();
    let created_at = Utc::now().timestamp_millis();

    let message = match store_message(
        ctx,
        CreateMessageArgs {
            conversation_id: &conversation_key,
            sender_id: identity.user_id,
            content,
            is_preset,
            attachment_url,
            created_at,
        },
    )
    .await
    {
        Ok(message) => Message::try_from(message)?,
        Err(e) => return store_unavailable(e),
    };

    let recipient_id = conversation
        .counterpart_of(identity.user_id)
        .unwrap_or(identity.user_id);
    streams::broadcast_message(
        ctx,
        &message,
        &[
            StreamName::Conversation(conversation_id),
            StreamName::User(recipient_id),
            StreamName::User(identity.user_id),
        ],
    );
    Ok(message)
}

/// Appends the message and bumps the conversation's `last_message_at` atomically.
async fn store_message<C: Context>(
    ctx: &C,
    args: CreateMessageArgs<'_>,
) -> sqlx::Result<crate::entities::messages::Message> {
    let mut tx = ctx.db().begin().await?;
    let message = messages::create(&mut tx, args).await?;
    crate::repositories::conversations::touch_last_message(
        &mut tx,
        &message.conversation_id,
        message.created_at,
    )
    .await?;
    tx.commit().await?;
    Ok(message)
}

pub async fn fetch_messages<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
    after_id: Option<i64>,
) -> ServiceResult<Vec<Message>> {
    conversations::fetch_for_participant(ctx, identity, conversation_id).await?;
    match messages::fetch_for_conversation(ctx, &conversation_id.to_string(), after_id).await {
        Ok(messages) => messages.into_iter().map(Message::try_from).collect(),
        Err(e) => store_unavailable(e),
    }
}

/// Long-poll variant of [`fetch_messages`]: when nothing newer than `after_id` is stored,
/// waits up to `wait` for a push on the conversation stream before fetching again.
pub async fn wait_for_messages<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
    after_id: i64,
    wait: Duration,
) -> ServiceResult<Vec<Message>> {
    // Subscribe before the first fetch so a send in between is not missed.
    let receiver = streams::subscribe(ctx, StreamName::Conversation(conversation_id));
    let messages = fetch_messages(ctx, identity, conversation_id, Some(after_id)).await?;
    if !messages.is_empty() || wait.is_zero() {
        return Ok(messages);
    }

    let Some(mut receiver) = receiver else {
        return Ok(messages);
    };
    let wait = wait.min(ctx.delivery().long_poll_max_wait);
    if tokio::time::timeout(wait, receiver.recv()).await.is_err() {
        return Ok(messages);
    }
    fetch_messages(ctx, identity, conversation_id, Some(after_id)).await
}

pub async fn mark_read<C: Context>(
    ctx: &C,
    identity: &Identity,
    message_id: i64,
) -> ServiceResult<Message> {
    let message = unwrap_expect! {
        messages::fetch_one(ctx, message_id).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::MessagesNotFound)
    };
    let message = Message::try_from(message)?;
    conversations::fetch_for_participant(ctx, identity, message.conversation_id).await?;
    if message.sender_id == identity.user_id {
        return Err(AppError::MessagesNotRecipient);
    }
    if message.is_read() {
        return Ok(message);
    }

    let now = Utc::now().timestamp_millis();
    if let Err(e) = messages::mark_read(ctx, message_id, now).await {
        return store_unavailable(e);
    }
    let message = unwrap_expect! {
        messages::fetch_one(ctx, message_id).await,
        Err(sqlx::Error::RowNotFound) => return Err(AppError::MessagesNotFound)
    };
    Message::try_from(message)
}

/// Marks everything the counterpart sent in the conversation as read.
/// Returns how many messages changed.
pub async fn mark_all_read<C: Context>(
    ctx: &C,
    identity: &Identity,
    conversation_id: Uuid,
) -> ServiceResult<u64> {
    conversations::fetch_for_participant(ctx, identity, conversation_id).await?;
    let now = Utc::now().timestamp_millis();
    match messages::mark_all_read(ctx, &conversation_id.to_string(), identity.user_id, now).await
    {
        Ok(marked) => {
            if marked > 0 {
                info!(
                    conversation_id = conversation_id.to_string(),
                    reader_id = identity.user_id,
                    marked,
                    "Marked messages as read"
                );
            }
            Ok(marked)
        }
        Err(e) => store_unavailable(e),
    }
}
