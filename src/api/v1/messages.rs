use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::admission::Admission;
use crate::models::api::{
    AdmissionResponse, FetchMessagesArgs, MarkAllReadResponse, SendMessageArgs,
};
use crate::models::messages::{Message, SendMessageArgs as SendArgs};
use crate::models::users::Identity;
use crate::usecases::messages;
use axum::Json;
use axum::extract::{Path, Query};
use std::time::Duration;
use uuid::Uuid;

pub async fn fetch_all(
    ctx: RequestContext,
    identity: Identity,
    Path(conversation_id): Path<Uuid>,
    Query(args): Query<FetchMessagesArgs>,
) -> ServiceResponse<Vec<Message>> {
    let messages = match (args.after, args.wait_ms) {
        (Some(after), Some(wait_ms)) => {
            let wait = Duration::from_millis(wait_ms);
            messages::wait_for_messages(&ctx, &identity, conversation_id, after, wait).await?
        }
        (after, _) => messages::fetch_messages(&ctx, &identity, conversation_id, after).await?,
    };
    Ok(Json(messages))
}

pub async fn send(
    ctx: RequestContext,
    identity: Identity,
    Path(conversation_id): Path<Uuid>,
    Json(args): Json<SendMessageArgs>,
) -> ServiceResponse<Message> {
    let args = SendArgs {
        content: &args.content,
        is_preset: args.is_preset,
        attachment_url: args.attachment_url.as_deref(),
    };
    let message = messages::send(&ctx, &identity, conversation_id, args).await?;
    Ok(Json(message))
}

pub async fn check(
    ctx: RequestContext,
    identity: Identity,
    Path(conversation_id): Path<Uuid>,
    Json(args): Json<SendMessageArgs>,
) -> ServiceResponse<AdmissionResponse> {
    let admission = messages::can_send(&ctx, &identity, conversation_id, &args.content).await?;
    let response = match admission {
        Admission::Allow => AdmissionResponse {
            allowed: true,
            code: None,
            message: None,
        },
        Admission::Deny(denial) => {
            let error = denial.as_error();
            AdmissionResponse {
                allowed: false,
                code: Some(error.code()),
                message: Some(error.message()),
            }
        }
    };
    Ok(Json(response))
}

pub async fn mark_all_read(
    ctx: RequestContext,
    identity: Identity,
    Path(conversation_id): Path<Uuid>,
) -> ServiceResponse<MarkAllReadResponse> {
    let marked = messages::mark_all_read(&ctx, &identity, conversation_id).await?;
    Ok(Json(MarkAllReadResponse { marked }))
}

pub async fn mark_read(
    ctx: RequestContext,
    identity: Identity,
    Path(message_id): Path<i64>,
) -> ServiceResponse<Message> {
    let message = messages::mark_read(&ctx, &identity, message_id).await?;
    Ok(Json(message))
}
