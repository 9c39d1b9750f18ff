//! Top-level error aggregate.

use thiserror::Error;

use crate::config::ConfigError;
use crate::mcp::McpError;
use crate::offset_store::OffsetStoreError;
use crate::platform::PlatformError;
use crate::registry::RegistryError;

/// Errors that can surface out of the top-level lifecycle.
#[derive(Debug, Error)]
pub enum RelaybotError {
    /// Configuration was invalid or incomplete at startup.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The offset store could not be read or written.
    #[error("offset store error: {0}")]
    OffsetStore(#[from] OffsetStoreError),

    /// The plugin registry failed in a way that could not be skipped.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The messaging platform client failed in a way that could not be recovered.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A worker session failed in a way that could not be recovered.
    #[error("mcp error: {0}")]
    Mcp(#[from] McpError),
}

/// Result type for top-level relaybot operations.
pub type RelaybotResult<T> = Result<T, RelaybotError>;
