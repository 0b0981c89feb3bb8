use crate::common::context::Context;
use crate::common::error::ServiceResult;
use crate::common::state::AppState;
use crate::cron_tasks;
use crate::usecases::streams;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tracing::info;

/// Drops push streams whose listeners all went away.
pub async fn cleanup_streams<C: Context>(ctx: &C) -> ServiceResult<usize> {
    let removed = streams::cleanup(ctx);
    if removed > 0 {
        info!(removed, "Pruned idle push streams");
    }
    Ok(removed)
}

/// Runs the cleanup every `period` until the hub shuts down.
pub async fn serve(ctx: AppState, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // the first tick fires immediately and there is nothing to clean yet
    interval.tick().await;
    while !ctx.hub.is_closed() {
        interval.tick().await;
        cron_tasks! {
            &ctx,
            cleanup_streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::{self, STUDENT_ID};
    use crate::repositories::streams::StreamName;

    #[tokio::test]
    async fn idle_streams_are_pruned() {
        let ctx = testing::state().await;
        let receiver = streams::subscribe(&ctx, StreamName::User(STUDENT_ID)).unwrap();
        assert_eq!(cleanup_streams(&ctx).await, Ok(0));

        drop(receiver);
        assert_eq!(cleanup_streams(&ctx).await, Ok(1));
    }

    #[tokio::test]
    async fn serve_stops_after_shutdown() {
        let ctx = testing::state().await;
        let task = tokio::spawn(serve(ctx.clone(), Duration::from_millis(10)));
        ctx.hub.shutdown();
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("cleanup loop exits")
            .unwrap();
    }
}
