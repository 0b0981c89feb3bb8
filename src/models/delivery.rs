use crate::models::messages::Message;
use chrono::{DateTime, Utc};
use hashbrown::HashMap;
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryConfig {
    pub message_poll_interval: Duration,
    pub conversation_poll_interval: Duration,
    pub resubscribe_attempts: u32,
    pub long_poll_max_wait: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            message_poll_interval: Duration::from_secs(5),
            conversation_poll_interval: Duration::from_secs(10),
            resubscribe_attempts: 3,
            long_poll_max_wait: Duration::from_secs(25),
        }
    }
}

/// The ordered message list a viewer renders.
///
/// Push events and poll results are merged into the same list. Messages are kept in
/// `(created_at, message_id)` order no matter the order they arrive in, and a message
/// id is only ever held once.
#[derive(Debug, Default, Clone)]
pub struct MessageList {
    ordered: BTreeMap<(DateTime<Utc>, i64), Message>,
    keys: HashMap<i64, (DateTime<Utc>, i64)>,
}

impl MessageList {
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn last(&self) -> Option<&Message> {
        self.ordered.values().next_back()
    }

    /// Highest store sequence seen so far, usable as an `after` cursor.
    pub fn last_seen_id(&self) -> Option<i64> {
        self.keys.keys().copied().max()
    }

    pub fn to_vec(&self) -> Vec<Message> {
        self.ordered.values().cloned().collect()
    }

    /// Merges a batch and returns the messages that changed, in list order.
    ///
    /// A message changes when it is new to the list or when it became read. Everything
    /// else about a held message is immutable, and `read_at` is never cleared.
    pub fn merge<I: IntoIterator<Item = Message>>(&mut self, batch: I) -> Vec<Message> {
        let mut changed = BTreeMap::new();
        for message in batch {
            match self.keys.get(&message.message_id) {
                None => {
                    let key = message.order_key();
                    self.keys.insert(message.message_id, key);
                    self.ordered.insert(key, message.clone());
                    changed.insert(key, message);
                }
                Some(key) => {
                    let key = *key;
                    if let Some(held) = self.ordered.get_mut(&key) {
                        if held.read_at.is_none() && message.read_at.is_some() {
                            held.read_at = message.read_at;
                            changed.insert(key, held.clone());
                        }
                    }
                }
            }
        }
        changed.into_values().collect()
    }
}

#[derive(Debug, Clone)]
pub struct MessageUpdate {
    /// New or newly read messages, in list order.
    pub changed: Vec<Message>,
    /// The whole list after the merge.
    pub messages: Vec<Message>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::testing::sample_message;
    use chrono::TimeDelta;

    fn ids(messages: &[Message]) -> Vec<i64> {
        messages.iter().map(|message| message.message_id).collect()
    }

    #[test]
    fn out_of_order_arrivals_are_sorted() {
        let mut list = MessageList::default();
        list.merge([sample_message(3, 30), sample_message(1, 10)]);
        list.merge([sample_message(2, 20)]);

        assert_eq!(ids(&list.to_vec()), vec![1, 2, 3]);
        assert_eq!(list.last().map(|m| m.message_id), Some(3));
        assert_eq!(list.last_seen_id(), Some(3));
    }

    #[test]
    fn equal_timestamps_fall_back_to_sequence() {
        let mut list = MessageList::default();
        list.merge([sample_message(8, 50), sample_message(7, 50)]);
        assert_eq!(ids(&list.to_vec()), vec![7, 8]);
    }

    #[test]
    fn duplicates_are_ignored() {
        let mut list = MessageList::default();
        assert_eq!(list.merge([sample_message(1, 10)]).len(), 1);
        assert!(list.merge([sample_message(1, 10)]).is_empty());
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn merge_reports_only_new_messages_in_order() {
        let mut list = MessageList::default();
        list.merge([sample_message(1, 10)]);
        let changed = list.merge([sample_message(3, 30), sample_message(1, 10), sample_message(2, 20)]);
        assert_eq!(ids(&changed), vec![2, 3]);
    }

    #[test]
    fn read_state_only_moves_forward() {
        let mut list = MessageList::default();
        list.merge([sample_message(1, 10)]);

        let mut read = sample_message(1, 10);
        let read_at = read.created_at + TimeDelta::seconds(5);
        read.read_at = Some(read_at);
        assert_eq!(ids(&list.merge([read.clone()])), vec![1]);

        let mut later = read.clone();
        later.read_at = Some(read_at + TimeDelta::seconds(60));
        assert!(list.merge([later]).is_empty());
        assert!(list.merge([sample_message(1, 10)]).is_empty());
        assert_eq!(list.to_vec()[0].read_at, Some(read_at));
    }
}
