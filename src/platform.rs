//! Messaging platform client (C1): long-poll `get_updates` and
//! `send_message` against a Telegram-style Bot API.

use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::warn;

use crate::models::{GetUpdatesResponse, Update};

const LONG_POLL_TIMEOUT_SECS: u64 = 10;
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors raised by [`PlatformClient::send_message`].
///
/// `get_updates` deliberately has no error type: any failure there is
/// logged and folded into an empty batch, never propagated.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// The request could not be sent, or the platform responded with a
    /// non-success status. Treated as transient by the poller's
    /// send-with-backoff.
    #[error("failed to send message to chat {chat_id}: {reason}")]
    SendFailed {
        /// The destination chat.
        chat_id: i64,
        /// A human-readable description of the failure.
        reason: String,
    },
}

impl crate::retry::Transient for PlatformError {
    fn is_transient(&self) -> bool {
        true
    }
}

/// Result type for platform client operations.
pub type PlatformResult<T> = Result<T, PlatformError>;

#[derive(Deserialize)]
struct SendMessageResponse {
    ok: bool,
}

/// HTTP client for a Telegram-style Bot API.
pub struct PlatformClient {
    http: reqwest::Client,
    base_url: String,
}

impl PlatformClient {
    /// Creates a client for the bot identified by `bot_token`, talking to
    /// the standard `https://api.telegram.org` base, with a shared
    /// 30-second total request timeout.
    pub fn new(bot_token: &str) -> Self {
        Self::with_base_url(bot_token, "https://api.telegram.org")
    }

    /// As [`PlatformClient::new`], but against a caller-supplied base URL
    /// (used by tests to point at a local mock server).
    pub fn with_base_url(bot_token: &str, base_url: &str) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client with static TLS config should always build");
        Self {
            http,
            base_url: format!("{base_url}/bot{bot_token}"),
        }
    }

    /// Long-polls for new updates starting at `offset`, if given. Fails
    /// soft: any transport error or non-`ok` response is logged and
    /// yields an empty batch rather than propagating.
    pub async fn get_updates(&self, offset: Option<u64>) -> Vec<Update> {
        let mut request = self
            .http
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[("timeout", LONG_POLL_TIMEOUT_SECS.to_string())]);
        if let Some(offset) = offset {
            request = request.query(&[("offset", offset.to_string())]);
        }

        let response = match request.send().await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "get_updates request failed");
                return Vec::new();
            }
        };

        match response.json::<GetUpdatesResponse>().await {
            Ok(body) if body.ok => body.result,
            Ok(_) => {
                warn!("get_updates response reported ok=false");
                Vec::new()
            }
            Err(e) => {
                warn!(error = %e, "get_updates response body was unreadable");
                Vec::new()
            }
        }
    }

    /// Sends `text` to `chat_id`. Unlike the platform's historical
    /// Python client, this returns a real success/failure signal so that
    /// the poller's send-with-backoff can actually retry on failure.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> PlatformResult<()> {
        let response = self
            .http
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({ "chat_id": chat_id, "text": text }))
            .send()
            .await
            .map_err(|e| PlatformError::SendFailed {
                chat_id,
                reason: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(PlatformError::SendFailed {
                chat_id,
                reason: format!("platform returned status {}", response.status()),
            });
        }

        let body: SendMessageResponse = response.json().await.map_err(|e| PlatformError::SendFailed {
            chat_id,
            reason: format!("unreadable response body: {e}"),
        })?;

        if !body.ok {
            return Err(PlatformError::SendFailed {
                chat_id,
                reason: "platform reported ok=false".to_string(),
            });
        }

        Ok(())
    }

    /// Releases the underlying connection pool. `reqwest::Client` has no
    /// async teardown; this exists so `Lifecycle::run`'s shutdown
    /// sequence has a symmetric call to make regardless of transport.
    pub fn close(self) {
        drop(self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn get_updates_against_unreachable_host_is_empty_not_error() {
        let client = PlatformClient::with_base_url("test-token", "http://127.0.0.1:1");
        let updates = client.get_updates(None).await;
        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn send_message_against_unreachable_host_is_an_error() {
        let client = PlatformClient::with_base_url("test-token", "http://127.0.0.1:1");
        let err = client.send_message(1, "hi").await.unwrap_err();
        assert!(matches!(err, PlatformError::SendFailed { chat_id, .. } if chat_id == 1));
    }
}
