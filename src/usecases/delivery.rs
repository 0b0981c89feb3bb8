use crate::common::context::Context;
use crate::common::error::ServiceResult;
use crate::models::conversations::Conversation;
use crate::models::delivery::{DeliveryConfig, MessageList, MessageUpdate};
use crate::models::messages::Message;
use crate::models::users::Identity;
use crate::repositories::streams::StreamName;
use crate::usecases::{conversations, messages, streams};
use async_trait::async_trait;
use rand::Rng;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// A live view kept up to date by the delivery loop.
///
/// Polling is the baseline: every tick re-reads the store. Pushes from the hub only
/// shorten the time until a change shows up.
#[async_trait]
trait Feed: Send + 'static {
    type Update: Send + 'static;

    fn stream_name(&self) -> StreamName;

    fn poll_interval(&self, config: &DeliveryConfig) -> Duration;

    async fn refresh<C: Context>(&mut self, ctx: &C) -> ServiceResult<Option<Self::Update>>;

    async fn on_push<C: Context>(
        &mut self,
        ctx: &C,
        message: Message,
    ) -> ServiceResult<Option<Self::Update>>;
}

struct MessageFeed {
    viewer: Identity,
    conversation_id: Uuid,
    list: MessageList,
    loaded: bool,
}

impl MessageFeed {
    fn update(&mut self, batch: Vec<Message>) -> Option<MessageUpdate> {
        let changed = self.list.merge(batch);
        if changed.is_empty() && self.loaded {
            return None;
        }
        self.loaded = true;
        Some(MessageUpdate {
            changed,
            messages: self.list.to_vec(),
        })
    }
}

#[async_trait]
impl Feed for MessageFeed {
    type Update = MessageUpdate;

    fn stream_name(&self) -> StreamName {
        StreamName::Conversation(self.conversation_id)
    }

    fn poll_interval(&self, config: &DeliveryConfig) -> Duration {
        config.message_poll_interval
    }

    async fn refresh<C: Context>(&mut self, ctx: &C) -> ServiceResult<Option<MessageUpdate>> {
        let batch = messages::fetch_messages(ctx, &self.viewer, self.conversation_id, None).await?;
        Ok(self.update(batch))
    }

    async fn on_push<C: Context>(
        &mut self,
        _ctx: &C,
        message: Message,
    ) -> ServiceResult<Option<MessageUpdate>> {
        if message.conversation_id != self.conversation_id || !self.loaded {
            return Ok(None);
        }
        Ok(self.update(vec![message]))
    }
}

struct ConversationFeed {
    user_id: i64,
    last: Option<Vec<Conversation>>,
}

#[async_trait]
impl Feed for ConversationFeed {
    type Update = Vec<Conversation>;

    fn stream_name(&self) -> StreamName {
        StreamName::User(self.user_id)
    }

    fn poll_interval(&self, config: &DeliveryConfig) -> Duration {
        config.conversation_poll_interval
    }

    async fn refresh<C: Context>(&mut self, ctx: &C) -> ServiceResult<Option<Vec<Conversation>>> {
        let conversations = conversations::fetch_all(ctx, self.user_id).await?;
        if self.last.as_ref() == Some(&conversations) {
            return Ok(None);
        }
        self.last = Some(conversations.clone());
        Ok(Some(conversations))
    }

    async fn on_push<C: Context>(
        &mut self,
        ctx: &C,
        _message: Message,
    ) -> ServiceResult<Option<Vec<Conversation>>> {
        // a new message reorders the list, so read it again
        self.refresh(ctx).await
    }
}

/// Handle to a running subscription. Dropping it cancels the subscription.
pub struct Subscription {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl Subscription {
    /// No callback is started after this returns.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Cancels and waits for the delivery loop to exit.
    pub async fn shutdown(mut self) {
        self.token.cancel();
        let _ = (&mut self.task).await;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// Keeps a conversation's message list current for `viewer`.
///
/// The first update carries everything stored so far. Later updates carry the
/// messages that are new or became read, along with the whole ordered list.
pub async fn subscribe_messages<C, F>(
    ctx: C,
    viewer: Identity,
    conversation_id: Uuid,
    callback: F,
) -> ServiceResult<Subscription>
where
    C: Context + Clone + 'static,
    F: FnMut(MessageUpdate) + Send + 'static,
{
    conversations::fetch_for_participant(&ctx, &viewer, conversation_id).await?;
    let feed = MessageFeed {
        viewer,
        conversation_id,
        list: MessageList::default(),
        loaded: false,
    };
    Ok(spawn(ctx, feed, callback))
}

/// Keeps the viewer's conversation list current, most recent activity first.
pub fn subscribe_conversations<C, F>(ctx: C, viewer: Identity, callback: F) -> Subscription
where
    C: Context + Clone + 'static,
    F: FnMut(Vec<Conversation>) + Send + 'static,
{
    let feed = ConversationFeed {
        user_id: viewer.user_id,
        last: None,
    };
    spawn(ctx, feed, callback)
}

fn spawn<C, T, F>(ctx: C, feed: T, callback: F) -> Subscription
where
    C: Context + 'static,
    T: Feed,
    F: FnMut(T::Update) + Send + 'static,
{
    let token = CancellationToken::new();
    let task = tokio::spawn(drive(ctx, feed, callback, token.clone()));
    Subscription { token, task }
}

enum Wake {
    Poll,
    Push(Result<Message, RecvError>),
}

async fn drive<C, T, F>(ctx: C, mut feed: T, mut callback: F, token: CancellationToken)
where
    C: Context,
    T: Feed,
    F: FnMut(T::Update) + Send,
{
    let config = ctx.delivery().clone();
    let stream_name = feed.stream_name();
    let mut receiver = streams::subscribe(&ctx, stream_name);
    if receiver.is_none() {
        info!(stream = stream_name.to_string(), "Push unavailable, polling only");
    }

    let mut interval = tokio::time::interval(feed.poll_interval(&config));
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let wake = tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = interval.tick() => Wake::Poll,
            pushed = recv(&mut receiver) => Wake::Push(pushed),
        };

        let result = match wake {
            Wake::Poll => feed.refresh(&ctx).await,
            Wake::Push(Ok(message)) => feed.on_push(&ctx, message).await,
            Wake::Push(Err(RecvError::Lagged(skipped))) => {
                debug!(stream = stream_name.to_string(), skipped, "Push lagged, refreshing");
                feed.refresh(&ctx).await
            }
            Wake::Push(Err(RecvError::Closed)) => {
                receiver = resubscribe(&ctx, stream_name, &config, &token).await;
                feed.refresh(&ctx).await
            }
        };

        match result {
            Ok(Some(update)) if !token.is_cancelled() => callback(update),
            Ok(_) => {}
            Err(e) if e.is_transient() => {
                warn!(
                    stream = stream_name.to_string(),
                    code = e.code(),
                    "Refresh failed, retrying on next tick"
                );
            }
            Err(e) => {
                warn!(
                    stream = stream_name.to_string(),
                    code = e.code(),
                    "Ending subscription"
                );
                break;
            }
        }
    }
    debug!(stream = stream_name.to_string(), "Subscription ended");
}

async fn recv(receiver: &mut Option<broadcast::Receiver<Message>>) -> Result<Message, RecvError> {
    match receiver {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}

/// Tries to reattach to the push stream with a jittered backoff.
/// `None` means the subscription keeps going on polling alone.
async fn resubscribe<C: Context>(
    ctx: &C,
    stream_name: StreamName,
    config: &DeliveryConfig,
    token: &CancellationToken,
) -> Option<broadcast::Receiver<Message>> {
    for attempt in 1..=config.resubscribe_attempts {
        let jitter_ms: u64 = rand::rng().random_range(25..=100);
        let backoff = Duration::from_millis(jitter_ms * u64::from(attempt));
        tokio::select! {
            _ = token.cancelled() => return None,
            _ = tokio::time::sleep(backoff) => {}
        }

        if let Some(receiver) = streams::subscribe(ctx, stream_name) {
            info!(stream = stream_name.to_string(), attempt, "Resubscribed to push");
            return Some(receiver);
        }
    }
    warn!(
        stream = stream_name.to_string(),
        attempts = config.resubscribe_attempts,
        "Push unavailable, falling back to polling"
    );
    None
}
