//! Policy layer over [`Accumulator`]: feedback strings, status, show, clear.

use crate::accumulator::Accumulator;

const SHOW_PREVIEW_LEN: usize = 100;

/// Thin business-logic wrapper around [`Accumulator`].
pub struct AccumulatorManager {
    accumulator: Accumulator,
    feedback_enabled: bool,
}

impl AccumulatorManager {
    /// Creates a manager over a fresh accumulator with the given bounds.
    pub fn new(max_messages_per_chat: usize, max_message_length: usize, feedback_enabled: bool) -> Self {
        Self {
            accumulator: Accumulator::new(max_messages_per_chat, max_message_length),
            feedback_enabled,
        }
    }

    /// Stores a non-command message and, if feedback is enabled and the
    /// message was actually stored, returns an English confirmation
    /// naming the new count. Returns `None` when feedback is disabled or
    /// the message was dropped (empty/whitespace-only, or the length
    /// limit is zero).
    pub async fn process_non_command(&self, chat_id: i64, text: &str) -> Option<String> {
        let stored = self.accumulator.add(chat_id, text).await;
        if !stored || !self.feedback_enabled {
            return None;
        }
        let count = self.accumulator.count(chat_id).await;
        Some(feedback_message(count))
    }

    /// Drains the accumulated messages for dispatch. This is the only
    /// site that consumes accumulated state for a command call; unlike
    /// `add`, it never emits a feedback string.
    pub async fn drain_for_command(&self, chat_id: i64) -> Vec<String> {
        self.accumulator.drain(chat_id).await
    }

    /// A one-line status string for `/status`.
    pub async fn status(&self, chat_id: i64) -> String {
        let count = self.accumulator.count(chat_id).await;
        if count == 0 {
            "You have no accumulated messages.".to_string()
        } else {
            format!("You have {} accumulated {}.", count, pluralize(count, "message"))
        }
    }

    /// A numbered listing of accumulated messages for `/show`, each
    /// truncated to a display-friendly preview length.
    pub async fn show(&self, chat_id: i64) -> String {
        let messages = self.accumulator.get(chat_id).await;
        if messages.is_empty() {
            return "You have no accumulated messages.".to_string();
        }
        let mut lines = vec![format!(
            "You have {} accumulated {}:",
            messages.len(),
            pluralize(messages.len(), "message")
        )];
        for (i, message) in messages.iter().enumerate() {
            lines.push(format!("{}. {}", i + 1, preview(message)));
        }
        lines.join("\n")
    }

    /// Clears `chat_id`'s accumulated messages for `/clear`.
    ///
    /// Uses `drain` rather than a separate `count` + `clear` so the
    /// reported count always matches what was actually removed, even if
    /// an `add` lands concurrently with this call.
    pub async fn clear(&self, chat_id: i64) -> String {
        let count = self.accumulator.drain(chat_id).await.len();
        if count == 0 {
            "You have no accumulated messages to clear.".to_string()
        } else {
            format!("Cleared {} accumulated {}.", count, pluralize(count, "message"))
        }
    }

    /// A process-wide summary across all chats, for admin diagnostics.
    pub async fn global_status(&self) -> String {
        let chats = self.accumulator.total_chats().await;
        format!("{} {} with accumulated messages.", chats, pluralize(chats, "chat"))
    }
}

fn feedback_message(count: usize) -> String {
    format!(
        "\u{1F4AC} Stored. You now have {} accumulated {}.",
        count,
        pluralize(count, "message")
    )
}

fn pluralize(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

fn preview(message: &str) -> String {
    if message.chars().count() <= SHOW_PREVIEW_LEN {
        message.to_string()
    } else {
        let truncated: String = message.chars().take(SHOW_PREVIEW_LEN).collect();
        format!("{truncated}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn feedback_counts_singular_and_plural() {
        let manager = AccumulatorManager::new(100, 1000, true);
        let feedback = manager.process_non_command(1, "one").await.unwrap();
        assert!(feedback.contains("1 accumulated message."));
        let feedback = manager.process_non_command(1, "two").await.unwrap();
        assert!(feedback.contains("2 accumulated messages."));
    }

    #[tokio::test]
    async fn feedback_disabled_returns_none() {
        let manager = AccumulatorManager::new(100, 1000, false);
        assert!(manager.process_non_command(1, "one").await.is_none());
    }

    #[tokio::test]
    async fn dropped_message_never_yields_feedback() {
        let manager = AccumulatorManager::new(100, 1000, true);
        assert!(manager.process_non_command(1, "   ").await.is_none());
    }

    #[tokio::test]
    async fn drain_for_command_never_emits_feedback_and_clears() {
        let manager = AccumulatorManager::new(100, 1000, true);
        manager.process_non_command(1, "one").await;
        manager.process_non_command(1, "two").await;
        let drained = manager.drain_for_command(1).await;
        assert_eq!(drained, vec!["one".to_string(), "two".to_string()]);
        assert_eq!(manager.status(1).await, "You have no accumulated messages.");
    }

    #[tokio::test]
    async fn show_numbers_and_truncates() {
        let manager = AccumulatorManager::new(100, 2000, true);
        let long = "x".repeat(150);
        manager.process_non_command(1, &long).await;
        let shown = manager.show(1).await;
        assert!(shown.contains("1. "));
        assert!(shown.contains("..."));
    }

    #[tokio::test]
    async fn clear_reports_count_cleared() {
        let manager = AccumulatorManager::new(100, 1000, true);
        manager.process_non_command(1, "one").await;
        let report = manager.clear(1).await;
        assert_eq!(report, "Cleared 1 accumulated message.");
        assert_eq!(manager.status(1).await, "You have no accumulated messages.");
    }
}
