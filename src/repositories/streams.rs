use crate::common::context::Context;
use crate::models::messages::Message;
use std::fmt::{Display, Formatter};
use tokio::sync::broadcast;
use uuid::Uuid;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StreamName {
    /// Every message stored in the conversation
    Conversation(Uuid),
    /// Every message addressed to or sent by the user
    User(i64),
}

impl Display for StreamName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StreamName::Conversation(conversation_id) => {
                write!(f, "conversation:{conversation_id}")
            }
            StreamName::User(user_id) => write!(f, "user:{user_id}"),
        }
    }
}

const BASE_KEY: &str = "mentorship:streams";
fn make_key(stream_name: StreamName) -> String {
    format!("{BASE_KEY}:{stream_name}")
}

pub fn broadcast<C: Context + ?Sized>(ctx: &C, stream_name: StreamName, message: Message) -> usize {
    ctx.hub().publish(&make_key(stream_name), message)
}

pub fn subscribe<C: Context + ?Sized>(
    ctx: &C,
    stream_name: StreamName,
) -> Option<broadcast::Receiver<Message>> {
    ctx.hub().subscribe(&make_key(stream_name))
}

pub fn listener_count<C: Context + ?Sized>(ctx: &C, stream_name: StreamName) -> usize {
    ctx.hub().receiver_count(&make_key(stream_name))
}

pub fn prune<C: Context + ?Sized>(ctx: &C) -> usize {
    ctx.hub().prune()
}
