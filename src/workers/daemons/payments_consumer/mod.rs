pub mod handlers;

use crate::common::error_log::ErrorLog;
use crate::common::init;
use crate::settings::AppSettings;
use futures::StreamExt;
use handlers::payment_completed;
use tracing::info;

/// Applies payment completions published by the payment collaborator until the
/// redis connection drops.
pub async fn serve(settings: &AppSettings, error_log: ErrorLog) -> anyhow::Result<()> {
    let redis_client = redis::Client::open(settings.redis_url.as_str())?;
    let mut pubsub = redis_client.get_async_pubsub().await?;
    pubsub.subscribe(settings.payments_channel.as_str()).await?;
    info!(
        channel = settings.payments_channel.as_str(),
        "Listening for payment completions"
    );

    let state = init::initialize_state(settings, error_log).await?;
    let mut messages = pubsub.on_message();
    while let Some(msg) = messages.next().await {
        let ctx = state.clone();
        tokio::spawn(async move {
            if let Err(e) = payment_completed::handle(ctx, msg).await {
                tracing::error!(code = e.code(), "Failed to apply payment completion");
            }
        });
    }
    anyhow::bail!("Payments pubsub connection closed")
}
