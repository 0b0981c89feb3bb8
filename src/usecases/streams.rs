use crate::common::context::Context;
use crate::models::messages::Message;
use crate::repositories::streams;
use crate::repositories::streams::StreamName;
use tokio::sync::broadcast;
use tracing::debug;

/// Pushes a stored message to every listed stream. Returns how many listeners got it.
pub fn broadcast_message<C: Context + ?Sized>(
    ctx: &C,
    message: &Message,
    stream_names: &[StreamName],
) -> usize {
    let mut delivered = 0;
    for stream_name in stream_names {
        delivered += streams::broadcast(ctx, *stream_name, message.clone());
    }
    debug!(
        message_id = message.message_id,
        conversation_id = message.conversation_id.to_string(),
        delivered,
        "Broadcast message"
    );
    delivered
}

pub fn subscribe<C: Context + ?Sized>(
    ctx: &C,
    stream_name: StreamName,
) -> Option<broadcast::Receiver<Message>> {
    streams::subscribe(ctx, stream_name)
}

pub fn is_listening<C: Context + ?Sized>(ctx: &C, stream_name: StreamName) -> bool {
    streams::listener_count(ctx, stream_name) > 0
}

/// Drops streams nobody listens to anymore.
pub fn cleanup<C: Context + ?Sized>(ctx: &C) -> usize {
    streams::prune(ctx)
}
