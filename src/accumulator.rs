//! Per-chat bounded FIFO of free-form messages awaiting the next command.

use std::collections::HashMap;

use tokio::sync::Mutex;

/// Bounded per-chat message accumulator.
///
/// Guarded by a single lock across all chats — a sharded map would
/// scale better, but correctness over throughput until proven
/// otherwise given the expected traffic.
pub struct Accumulator {
    max_messages_per_chat: usize,
    max_message_length: usize,
    chats: Mutex<HashMap<i64, Vec<String>>>,
}

impl Accumulator {
    /// Creates an accumulator enforcing the given per-chat and
    /// per-message bounds.
    pub fn new(max_messages_per_chat: usize, max_message_length: usize) -> Self {
        Self {
            max_messages_per_chat,
            max_message_length,
            chats: Mutex::new(HashMap::new()),
        }
    }

    /// Adds `text` to `chat_id`'s queue, returning `true` if it was stored.
    ///
    /// Empty or whitespace-only text is dropped. If `max_message_length`
    /// is zero, everything is dropped. Otherwise text longer than the
    /// limit is truncated. If the chat's queue would exceed
    /// `max_messages_per_chat`, the oldest entries are evicted first.
    pub async fn add(&self, chat_id: i64, text: &str) -> bool {
        if text.trim().is_empty() || self.max_message_length == 0 {
            return false;
        }
        let stored: String = text.chars().take(self.max_message_length).collect();
        let mut chats = self.chats.lock().await;
        let queue = chats.entry(chat_id).or_default();
        queue.push(stored);
        while queue.len() > self.max_messages_per_chat {
            queue.remove(0);
        }
        true
    }

    /// Returns a snapshot of `chat_id`'s queue without modifying it.
    pub async fn get(&self, chat_id: i64) -> Vec<String> {
        self.chats
            .lock()
            .await
            .get(&chat_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Returns and removes `chat_id`'s queue in a single atomic step: no
    /// concurrent `add` can observe or extend the list between the read
    /// and the clear.
    pub async fn drain(&self, chat_id: i64) -> Vec<String> {
        self.chats.lock().await.remove(&chat_id).unwrap_or_default()
    }

    /// Removes `chat_id`'s queue without returning it.
    pub async fn clear(&self, chat_id: i64) {
        self.chats.lock().await.remove(&chat_id);
    }

    /// Number of messages currently queued for `chat_id`.
    pub async fn count(&self, chat_id: i64) -> usize {
        self.chats
            .lock()
            .await
            .get(&chat_id)
            .map(Vec::len)
            .unwrap_or(0)
    }

    /// Number of chats with a non-empty queue.
    pub async fn total_chats(&self) -> usize {
        self.chats.lock().await.len()
    }

    /// All chat ids with a non-empty queue.
    pub async fn all_chat_ids(&self) -> Vec<i64> {
        self.chats.lock().await.keys().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_and_whitespace_only_are_dropped() {
        let acc = Accumulator::new(100, 1000);
        assert!(!acc.add(1, "").await);
        assert!(!acc.add(1, "   ").await);
        assert_eq!(acc.count(1).await, 0);
    }

    #[tokio::test]
    async fn zero_length_limit_drops_everything() {
        let acc = Accumulator::new(100, 0);
        assert!(!acc.add(1, "hello").await);
        assert_eq!(acc.count(1).await, 0);
    }

    #[tokio::test]
    async fn truncates_to_max_message_length() {
        let acc = Accumulator::new(100, 5);
        assert!(acc.add(1, "abcdefghij").await);
        assert_eq!(acc.get(1).await, vec!["abcde".to_string()]);
        assert_eq!(acc.count(1).await, 1);
    }

    #[tokio::test]
    async fn evicts_oldest_when_over_capacity() {
        let acc = Accumulator::new(2, 1000);
        acc.add(1, "one").await;
        acc.add(1, "two").await;
        acc.add(1, "three").await;
        assert_eq!(acc.get(1).await, vec!["two".to_string(), "three".to_string()]);
        assert!(acc.count(1).await <= 2);
    }

    #[tokio::test]
    async fn drain_is_atomic_and_clears() {
        let acc = Accumulator::new(100, 1000);
        acc.add(1, "one").await;
        acc.add(1, "two").await;
        let drained = acc.drain(1).await;
        assert_eq!(drained, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(acc.count(1).await, 0);
    }

    #[tokio::test]
    async fn chats_are_independent() {
        let acc = Accumulator::new(100, 1000);
        acc.add(1, "a").await;
        acc.add(2, "b").await;
        assert_eq!(acc.total_chats().await, 2);
        let mut ids = acc.all_chat_ids().await;
        ids.sort();
        assert_eq!(ids, vec![1, 2]);
    }
}
