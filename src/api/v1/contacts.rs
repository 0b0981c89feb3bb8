use crate::api::RequestContext;
use crate::common::error::ServiceResponse;
use crate::models::contacts::Contact;
use crate::models::users::Identity;
use crate::usecases::contacts;
use axum::Json;

pub async fn fetch_all(ctx: RequestContext, identity: Identity) -> ServiceResponse<Vec<Contact>> {
    let contacts = contacts::fetch_contacts(&ctx, identity.user_id).await?;
    Ok(Json(contacts))
}
