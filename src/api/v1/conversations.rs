use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::api::StartConversationArgs;
use crate::models::conversations::Conversation;
use crate::models::users::Identity;
use crate::usecases::conversations;
use axum::Json;

pub async fn fetch_all(
    ctx: RequestContext,
    identity: Identity,
) -> ServiceResponse<Vec<Conversation>> {
    let conversations = conversations::fetch_all(&ctx, identity.user_id).await?;
    Ok(Json(conversations))
}

pub async fn start(
    ctx: RequestContext,
    identity: Identity,
    Json(args): Json<StartConversationArgs>,
) -> ServiceResponse<Conversation> {
    let conversation =
        conversations::start(&ctx, &identity, args.counterpart_id, args.engagement).await?;
    Ok(Json(conversation))
}
