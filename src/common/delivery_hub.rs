use crate::models::messages::Message;
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// In-process push channel for newly stored messages, keyed by stream.
///
/// Push delivery only lowers latency: receivers that connect after a message was
/// published never see it and must catch up through the store.
#[derive(Clone)]
pub struct DeliveryHub {
    inner: Arc<Inner>,
}

struct Inner {
    capacity: usize,
    channels: DashMap<String, broadcast::Sender<Message>>,
    closed: AtomicBool,
}

impl DeliveryHub {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Inner {
                capacity: capacity.max(1),
                channels: DashMap::new(),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// Returns the number of listeners the message was handed to.
    pub fn publish(&self, key: &str, message: Message) -> usize {
        if self.is_closed() {
            return 0;
        }

        let sent = match self.inner.channels.get(key) {
            Some(sender) => sender.send(message).ok(),
            None => return 0,
        };
        match sent {
            Some(receivers) => receivers,
            None => {
                self.inner
                    .channels
                    .remove_if(key, |_, sender| sender.receiver_count() == 0);
                0
            }
        }
    }

    /// `None` once the hub has been shut down.
    pub fn subscribe(&self, key: &str) -> Option<broadcast::Receiver<Message>> {
        if self.is_closed() {
            return None;
        }

        let receiver = self
            .inner
            .channels
            .entry(key.to_owned())
            .or_insert_with(|| broadcast::channel(self.inner.capacity).0)
            .subscribe();

        // lost a race with shutdown
        if self.is_closed() {
            self.inner.channels.remove(key);
            return None;
        }
        Some(receiver)
    }

    pub fn receiver_count(&self, key: &str) -> usize {
        self.inner
            .channels
            .get(key)
            .map_or(0, |sender| sender.receiver_count())
    }

    /// Drops streams nobody listens to. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let before = self.inner.channels.len();
        self.inner
            .channels
            .retain(|_, sender| sender.receiver_count() > 0);
        before.saturating_sub(self.inner.channels.len())
    }

    /// Closes every stream. Receivers observe `RecvError::Closed`
    /// and later subscriptions are refused.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.channels.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}
