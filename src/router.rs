//! Router (C7): classifies updates, resolves the owning plugin, and
//! renders the outgoing reply text.

use crate::accumulator_manager::AccumulatorManager;
use crate::mcp::{McpError, McpManager};
use crate::models::{CommandInvocation, ToolCallPayload, Update};
use crate::registry::PluginRegistry;

const GENERIC_FAILURE_TEXT: &str = "An unexpected error occurred. Please try again later.";

/// Classifies one update and, if it warrants a reply, produces the
/// `(chat_id, text)` pair the poller should send.
pub struct Router {
    registry: std::sync::Arc<PluginRegistry>,
    mcp: std::sync::Arc<McpManager>,
    accumulator: std::sync::Arc<AccumulatorManager>,
}

impl Router {
    /// Wires a router over the given registry, MCP manager, and
    /// accumulator manager.
    pub fn new(
        registry: std::sync::Arc<PluginRegistry>,
        mcp: std::sync::Arc<McpManager>,
        accumulator: std::sync::Arc<AccumulatorManager>,
    ) -> Self {
        Self { registry, mcp, accumulator }
    }

    /// Processes one update, returning the reply to send (if any).
    ///
    /// Non-command messages never reach a plugin: they are handed to the
    /// accumulator manager and only produce a reply if feedback is
    /// enabled and the message was actually stored.
    pub async fn process(&self, update: &Update) -> Option<(i64, String)> {
        let message = update.message.as_ref()?;
        let text = message.text.as_deref()?;
        let chat_id = message.chat.id;

        let Some(command_line) = text.strip_prefix('/') else {
            let feedback = self.accumulator.process_non_command(chat_id, text).await?;
            return Some((chat_id, feedback));
        };

        let (token, rest) = match command_line.split_once(' ') {
            Some((token, rest)) => (token, rest),
            None => (command_line, ""),
        };

        let (plugin_name, command_name) = match self.resolve(token).await {
            Some(resolved) => resolved,
            None => return Some((chat_id, format!("Command not found: {token}"))),
        };

        let accumulated_params = self.accumulator.drain_for_command(chat_id).await;
        let user_info = message.from.as_ref().and_then(|u| u.username.clone());
        let invocation = CommandInvocation {
            chat_id,
            command_name,
            plugin_name,
            immediate_text: rest.to_string(),
            accumulated_params,
            user_info,
        };

        let payload = ToolCallPayload {
            text: invocation.immediate_text.clone(),
            accumulated_params: invocation.accumulated_params.clone(),
            username: invocation.user_info.clone(),
        };

        match self.mcp.execute(&invocation.plugin_name, &invocation.command_name, payload).await {
            Ok(reply) => Some((chat_id, reply)),
            Err(McpError::Application(message)) => Some((chat_id, message)),
            Err(_) => Some((chat_id, GENERIC_FAILURE_TEXT.to_string())),
        }
    }

    /// Resolves a typed token to `(plugin, command)`: first as
    /// `plugin_command` split on the first underscore, then falling back
    /// to a bare command lookup on the split fragment (or the whole
    /// token, if it had no underscore).
    async fn resolve(&self, token: &str) -> Option<(String, String)> {
        if let Some((plugin, command)) = token.split_once('_') {
            if let Some(manifest) = self.registry.find_by_plugin_and_command(plugin, command).await {
                return Some((manifest.name, command.to_string()));
            }
            if let Some((plugin_name, _)) = self.registry.find_by_command(command).await {
                return Some((plugin_name, command.to_string()));
            }
            None
        } else if let Some((plugin_name, _)) = self.registry.find_by_command(token).await {
            Some((plugin_name, token.to_string()))
        } else {
            None
        }
    }
}
