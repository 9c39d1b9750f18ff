//! Worker-session manager (C4): owns one [`PluginSession`] per plugin and
//! dispatches `tools/call` invocations against it, reopening and retrying
//! on transient failure.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rmcp::model::CallToolRequestParams;
use tokio::sync::Mutex;
use tracing::warn;

use crate::mcp::error::McpError;
use crate::mcp::session::PluginSession;
use crate::models::ToolCallPayload;
use crate::registry::PluginRegistry;
use crate::retry::{BackoffConfig, retry};

/// Routes `tools/call` invocations to the right plugin session, opening
/// and retrying as needed.
///
/// Each plugin gets its own `Mutex<PluginSession>`; the lock is only ever
/// held across the open/close lifecycle and the brief moment it takes to
/// clone out a `Peer`, never across the call itself.
pub struct McpManager {
    registry: Arc<PluginRegistry>,
    sessions: Mutex<HashMap<String, Arc<Mutex<PluginSession>>>>,
}

impl McpManager {
    /// Creates a manager that resolves plugin manifests against `registry`.
    pub fn new(registry: Arc<PluginRegistry>) -> Self {
        Self {
            registry,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Invokes `command` on `plugin_name` with `payload`, retrying
    /// transient failures per the plugin's own `max_retries`/backoff
    /// schedule. Reopens the session if it is `Closed` or `Broken`;
    /// consults the registry's *current* manifest on every attempt so a
    /// plugin rescanned with new connection details reconnects using them.
    pub async fn execute(&self, plugin_name: &str, command: &str, payload: ToolCallPayload) -> Result<String, McpError> {
        let manifest = self
            .registry
            .manifest(plugin_name)
            .await
            .ok_or_else(|| McpError::UnknownPlugin {
                plugin: plugin_name.to_string(),
            })?;

        let session = self.session_for(plugin_name).await;
        let backoff = BackoffConfig::standard(manifest.mcp.max_retries);

        retry(&backoff, || self.call_once(plugin_name, command, &payload, &session)).await
    }

    async fn call_once(
        &self,
        plugin_name: &str,
        command: &str,
        payload: &ToolCallPayload,
        session: &Arc<Mutex<PluginSession>>,
    ) -> Result<String, McpError> {
        // Re-read the manifest fresh on every attempt, not just once at
        // the top of `execute`: a rescan that changes this plugin's
        // connection details mid-retry must be picked up by the very
        // next reconnect, not only by the next top-level `execute` call.
        let manifest = self
            .registry
            .manifest(plugin_name)
            .await
            .ok_or_else(|| McpError::UnknownPlugin {
                plugin: plugin_name.to_string(),
            })?;

        let peer = {
            let mut guard = session.lock().await;
            if guard.peer_if_ready().is_none() {
                guard.open(&manifest).await?;
            }
            guard.touch();
            guard.peer_if_ready().ok_or_else(|| McpError::Shutdown {
                plugin: plugin_name.to_string(),
            })?
        };

        let arguments = serde_json::to_value(payload)
            .ok()
            .and_then(|v| v.as_object().cloned());

        let timeout = Duration::from_secs_f64(manifest.mcp.timeout_seconds);
        let params = CallToolRequestParams {
            meta: None,
            name: command.to_string().into(),
            arguments,
            task: None,
        };

        let call = tokio::time::timeout(timeout, peer.call_tool(params)).await;

        match call {
            Ok(Ok(result)) => crate::mcp::types::extract_reply(plugin_name, result),
            Ok(Err(e)) => {
                session.lock().await.mark_broken();
                warn!(plugin = %plugin_name, error = %e, "plugin transport call failed");
                Err(McpError::Transport {
                    plugin: plugin_name.to_string(),
                    reason: e.to_string(),
                })
            }
            Err(_) => Err(McpError::Timeout {
                plugin: plugin_name.to_string(),
                timeout_secs: manifest.mcp.timeout_seconds,
            }),
        }
    }

    async fn session_for(&self, plugin_name: &str) -> Arc<Mutex<PluginSession>> {
        let mut sessions = self.sessions.lock().await;
        sessions
            .entry(plugin_name.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(PluginSession::closed(plugin_name))))
            .clone()
    }

    /// Gracefully closes every open session (5 second timeout each), for
    /// use during shutdown.
    pub async fn close_all(&self) {
        let sessions: HashMap<String, Arc<Mutex<PluginSession>>> = std::mem::take(&mut *self.sessions.lock().await);
        for session in sessions.into_values() {
            let owned = Arc::try_unwrap(session);
            match owned {
                Ok(mutex) => mutex.into_inner().close().await,
                Err(shared) => {
                    // Still referenced by an in-flight call; best effort: mark
                    // broken so the next caller reopens rather than reusing a
                    // half-closed transport.
                    shared.lock().await.mark_broken();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_plugin_is_rejected_without_touching_sessions() {
        let registry = Arc::new(PluginRegistry::new("/does/not/exist"));
        registry.scan().await;
        let manager = McpManager::new(registry);

        let payload = ToolCallPayload {
            text: "hello".to_string(),
            accumulated_params: vec![],
            username: None,
        };
        let err = manager.execute("ghost", "echo", payload).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownPlugin { plugin } if plugin == "ghost"));
    }
}
