//! Errors raised by the worker-session manager (C4).

use thiserror::Error;

use crate::retry::Transient;

/// Errors a plugin call can fail with.
///
/// Variants map directly onto the error-kind table in the error handling
/// design: `Timeout`/`Transport` are transient and retried inside
/// `execute`; the rest surface immediately.
#[derive(Debug, Error)]
pub enum McpError {
    /// No manifest is registered for this plugin.
    #[error("unknown plugin: {plugin}")]
    UnknownPlugin {
        /// The plugin name that was not found.
        plugin: String,
    },

    /// The call did not complete within `manifest.timeout_seconds`. The
    /// session is left Ready; the abandoned request's reply, if it ever
    /// arrives, is discarded.
    #[error("plugin {plugin} timed out after {timeout_secs}s")]
    Timeout {
        /// The plugin that timed out.
        plugin: String,
        /// The deadline that was exceeded.
        timeout_secs: f64,
    },

    /// The transport failed outright: spawn failure, EOF, or a malformed
    /// frame. The session is transitioned to Broken and reopened on the
    /// next call.
    #[error("transport error talking to {plugin}: {reason}")]
    Transport {
        /// The plugin whose transport failed.
        plugin: String,
        /// A human-readable description of the failure.
        reason: String,
    },

    /// The plugin's reply carried a non-empty `error` field (either a
    /// JSON-RPC error object or the `{data, error}` shape). Not retried;
    /// surfaced to the user verbatim.
    #[error("{0}")]
    Application(String),

    /// The reply could not be interpreted as a tool response (no content
    /// blocks, or the first block was not text).
    #[error("plugin {plugin} returned an unreadable response")]
    MalformedResponse {
        /// The plugin whose response could not be read.
        plugin: String,
    },

    /// The session was closed while a request was in flight.
    #[error("plugin {plugin} session was shut down")]
    Shutdown {
        /// The plugin whose session was shut down.
        plugin: String,
    },
}

impl Transient for McpError {
    fn is_transient(&self) -> bool {
        matches!(self, McpError::Timeout { .. } | McpError::Transport { .. })
    }
}

/// Result type for worker-session manager operations.
pub type McpResult<T> = Result<T, McpError>;
