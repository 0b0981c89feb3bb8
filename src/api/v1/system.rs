use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::common::error_log::ErrorRecord;
use crate::models::api::MessagingConfigResponse;
use crate::models::users::Admin;
use axum::Json;
use std::time::Duration;

/// Limits the client mirrors for instant feedback. The server still enforces them.
pub async fn config(ctx: RequestContext) -> ServiceResponse<MessagingConfigResponse> {
    Ok(Json(MessagingConfigResponse {
        max_length: ctx.policy.max_length(),
        preset_messages: ctx.policy.preset_messages().to_vec(),
        message_poll_interval_ms: millis(ctx.delivery.message_poll_interval),
        conversation_poll_interval_ms: millis(ctx.delivery.conversation_poll_interval),
    }))
}

/// Operator view of the latest errors. Requires the admin token.
pub async fn recent_errors(
    ctx: RequestContext,
    _admin: Admin,
) -> ServiceResponse<Vec<ErrorRecord>> {
    Ok(Json(ctx.error_log.recent()))
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
