//! Lifecycle (C9): startup/shutdown orchestration and the admin
//! operations a caller would otherwise expose over HTTP.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::info;

use crate::accumulator_manager::AccumulatorManager;
use crate::config::{Config, ConfigError};
use crate::mcp::McpManager;
use crate::models::PluginManifest;
use crate::offset_store::OffsetStore;
use crate::platform::PlatformClient;
use crate::poller::Poller;
use crate::registry::PluginRegistry;
use crate::router::Router;

/// Errors raised while starting or running the lifecycle.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// Configuration failed validation at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for lifecycle operations.
pub type LifecycleResult<T> = Result<T, LifecycleError>;

/// `GET /health`'s payload, returned as a plain value instead of routed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStatus {
    /// The process is up and its registry has been scanned at least once.
    Healthy,
}

/// Owns every C1–C8 component and the poller's background task.
pub struct Lifecycle {
    registry: Arc<PluginRegistry>,
    platform: Arc<PlatformClient>,
    mcp: Arc<McpManager>,
    poller: Arc<Poller>,
}

impl Lifecycle {
    /// Constructs every component from `config`, running one initial
    /// registry scan. Fails fast only on configuration that is invalid
    /// outright (missing token, unreadable-but-present cattackles
    /// directory); an empty or absent cattackles directory is fine.
    pub async fn build(config: Config) -> LifecycleResult<Self> {
        config.validate()?;

        let registry = Arc::new(PluginRegistry::new(config.cattackles_dir.clone()));
        let loaded = registry.scan().await;
        info!(plugins = loaded, "initial cattackle registry scan complete");

        let platform = Arc::new(PlatformClient::new(&config.telegram_bot_token));
        let mcp = Arc::new(McpManager::new(registry.clone()));
        let accumulator = Arc::new(AccumulatorManager::new(
            config.max_messages_per_chat,
            config.max_message_length,
            config.feedback_enabled,
        ));
        let router = Arc::new(Router::new(registry.clone(), mcp.clone(), accumulator));
        let offsets = OffsetStore::new(config.update_id_file_path.clone());
        let poller = Arc::new(Poller::new(platform.clone(), router, offsets));

        Ok(Self { registry, platform, mcp, poller })
    }

    /// Spawns the poller, waits for `Ctrl-C`, then runs the shutdown
    /// sequence: stop the poller, join its task, close every MCP session,
    /// close the platform client.
    pub async fn run(self) -> LifecycleResult<()> {
        let Lifecycle { registry: _registry, platform, mcp, poller } = self;

        let (stop_tx, stop_rx) = watch::channel(false);
        let poller_task: JoinHandle<()> = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.run(stop_rx).await })
        };

        tokio::signal::ctrl_c()
            .await
            .expect("installing a Ctrl-C handler should not fail");
        info!("shutdown signal received");

        let _ = stop_tx.send(true);
        let _ = poller_task.await;

        mcp.close_all().await;

        // `poller` holds its own `Arc<PlatformClient>` clone; drop it so
        // `platform` is the sole remaining owner and can actually close.
        drop(poller);
        match Arc::try_unwrap(platform) {
            Ok(platform) => platform.close(),
            Err(_) => info!("platform client still referenced; skipping explicit close"),
        }

        info!("shutdown complete");
        Ok(())
    }

    /// Re-scans the cattackle registry, mirroring `POST /admin/reload`.
    pub async fn rescan(&self) -> usize {
        self.registry.scan().await
    }

    /// Mirrors `GET /health`.
    pub async fn health(&self) -> HealthStatus {
        HealthStatus::Healthy
    }

    /// Mirrors `GET /cattackles`.
    pub async fn list_plugins(&self) -> Vec<PluginManifest> {
        self.registry.get_all().await
    }
}
