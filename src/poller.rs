//! Poller (C8): the main loop — fetch, route, send-with-backoff, persist
//! offset, check for shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::offset_store::OffsetStore;
use crate::platform::PlatformClient;
use crate::retry::{BackoffConfig, retry};
use crate::router::Router;

/// Retries after the first send attempt, for a total of 4 attempts.
const SEND_MAX_RETRIES: u32 = 3;

/// Drives the fetch-route-send-persist loop until told to stop.
pub struct Poller {
    platform: Arc<PlatformClient>,
    router: Arc<Router>,
    offsets: OffsetStore,
}

impl Poller {
    /// Wires a poller over the given platform client, router, and offset
    /// store.
    pub fn new(platform: Arc<PlatformClient>, router: Arc<Router>, offsets: OffsetStore) -> Self {
        Self { platform, router, offsets }
    }

    /// Runs the loop until `stop` is signalled. Each iteration loads the
    /// latest offset from the previous iteration's save (held in memory
    /// across iterations; only the initial value comes from disk),
    /// fetches one batch, dispatches every update sequentially in receipt
    /// order, then persists the advanced offset if any update was
    /// processed.
    pub async fn run(&self, mut stop: watch::Receiver<bool>) {
        let mut offset = self.offsets.load().await;
        info!(offset = ?offset, "poller starting");

        loop {
            if *stop.borrow() {
                break;
            }

            let updates = tokio::select! {
                biased;
                _ = stop.changed() => {
                    if *stop.borrow() {
                        break;
                    }
                    continue;
                }
                updates = self.platform.get_updates(offset) => updates,
            };

            let mut processed_any = false;
            for update in &updates {
                if let Some((chat_id, text)) = self.router.process(update).await {
                    self.send_with_backoff(chat_id, &text).await;
                }
                offset = Some(update.update_id + 1);
                processed_any = true;
            }

            if processed_any {
                if let Some(offset) = offset {
                    if let Err(e) = self.offsets.save(offset).await {
                        warn!(error = %e, "failed to persist offset");
                    }
                }
            }

            if *stop.borrow() {
                break;
            }
        }

        info!("poller stopped");
    }

    async fn send_with_backoff(&self, chat_id: i64, text: &str) {
        let backoff = BackoffConfig::standard(SEND_MAX_RETRIES);
        let result = retry(&backoff, || self.platform.send_message(chat_id, text)).await;
        if let Err(e) = result {
            warn!(chat_id, error = %e, "giving up delivering message after retries");
        } else {
            debug!(chat_id, "message delivered");
        }
    }
}
