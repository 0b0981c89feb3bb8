use crate::common::context::Context;
use crate::common::error::ServiceResult;
use crate::common::state::AppState;
use crate::usecases::conversations;
use rand::Rng;
use redis::Msg;
use serde::Deserialize;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

const MAX_ATTEMPTS: u32 = 5;
const RETRY_BASE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct PaymentCompleted {
    pub conversation_id: Uuid,
}

pub fn parse(payload: &str) -> serde_json::Result<PaymentCompleted> {
    serde_json::from_str(payload)
}

pub async fn handle(ctx: AppState, msg: Msg) -> ServiceResult<()> {
    let payload: String = msg.get_payload()?;
    process_with_retry(&ctx, &payload, MAX_ATTEMPTS, RETRY_BASE_DELAY).await
}

/// Pubsub does not redeliver, so a completion that hits an unavailable store is
/// retried here with a growing, jittered delay. Other errors are returned at once.
pub async fn process_with_retry<C: Context>(
    ctx: &C,
    payload: &str,
    max_attempts: u32,
    base_delay: Duration,
) -> ServiceResult<()> {
    let mut attempt = 1;
    loop {
        match process(ctx, payload).await {
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let base_ms = u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX);
                let jitter_ms: u64 = rand::rng().random_range(0..=base_ms);
                let backoff = base_delay * attempt + Duration::from_millis(jitter_ms);
                warn!(
                    attempt,
                    backoff_ms = u64::try_from(backoff.as_millis()).unwrap_or(u64::MAX),
                    "Store unavailable while applying payment completion, retrying"
                );
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Malformed payloads are skipped; they would fail the same way on every retry.
pub async fn process<C: Context>(ctx: &C, payload: &str) -> ServiceResult<()> {
    let event = match parse(payload) {
        Ok(event) => event,
        Err(e) => {
            warn!(payload, "Skipping malformed payment event: {e}");
            return Ok(());
        }
    };
    info!(
        conversation_id = event.conversation_id.to_string(),
        "Handling payment completion"
    );
    conversations::complete_payment(ctx, event.conversation_id).await?;
    Ok(())
}
