//! Shared data types for the update-processing pipeline and plugin contract.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// An update delivered by the messaging platform's long-poll API.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    /// Monotonically-increasing id used for offset tracking.
    pub update_id: u64,
    /// The chat message carried by this update, if any.
    pub message: Option<IncomingMessage>,
}

/// The message payload of an [`Update`].
#[derive(Debug, Clone, Deserialize)]
pub struct IncomingMessage {
    /// The chat this message belongs to.
    pub chat: Chat,
    /// The message text, if any (updates can carry non-text content).
    pub text: Option<String>,
    /// The sending user, if known.
    #[serde(default)]
    pub from: Option<User>,
}

/// A chat identifier.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct Chat {
    /// The platform's chat id.
    pub id: i64,
}

/// A platform user.
#[derive(Debug, Clone, Deserialize)]
pub struct User {
    /// Display username, if the platform provides one.
    pub username: Option<String>,
}

/// The envelope returned by `GET /getUpdates`.
#[derive(Debug, Clone, Deserialize)]
pub struct GetUpdatesResponse {
    /// Whether the platform call succeeded.
    pub ok: bool,
    /// The batch of updates, in receipt order.
    #[serde(default)]
    pub result: Vec<Update>,
}

/// A plugin command's transport configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "transport", rename_all = "lowercase")]
pub enum McpTransport {
    /// Spawn a subprocess and speak MCP over its stdin/stdout.
    Stdio {
        /// The executable to spawn.
        command: String,
        /// Arguments passed to the executable.
        #[serde(default)]
        args: Vec<String>,
        /// Working directory for the subprocess, if not the current one.
        #[serde(default)]
        cwd: Option<String>,
        /// Extra environment variables for the subprocess.
        #[serde(default)]
        env: HashMap<String, String>,
    },
    /// Connect to a streamable-HTTP MCP endpoint.
    Http {
        /// The MCP endpoint URL.
        url: String,
        /// Optional auth (or other) headers sent with every request.
        #[serde(default)]
        headers: Option<HashMap<String, String>>,
    },
}

/// The `[cattackle.mcp]` table of a manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct McpConfig {
    /// How to reach the plugin.
    #[serde(flatten)]
    pub transport: McpTransport,
    /// Per-call deadline in seconds.
    #[serde(rename = "timeout", default = "default_timeout_seconds")]
    pub timeout_seconds: f64,
    /// Retries (in addition to the first attempt) for transient failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_seconds() -> f64 {
    30.0
}

fn default_max_retries() -> u32 {
    3
}

/// A single advertised command.
#[derive(Debug, Clone, Deserialize)]
pub struct CommandSpec {
    /// Human-readable description.
    pub description: String,
}

/// The `[cattackle]` table and its children: one plugin manifest.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginManifest {
    /// Unique plugin name.
    pub name: String,
    /// Semver version string.
    pub version: String,
    /// Human-readable description.
    pub description: String,
    /// Commands this plugin advertises, keyed by command name.
    #[serde(default)]
    pub commands: HashMap<String, CommandSpec>,
    /// Transport configuration for reaching this plugin.
    pub mcp: McpConfig,
}

/// The on-disk shape of `cattackle.toml`: a `[cattackle]` table that
/// deserializes into [`PluginManifest`].
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFile {
    /// The plugin manifest itself.
    pub cattackle: PluginManifest,
}

/// The typed payload sent to a plugin's `tools/call`.
#[derive(Debug, Clone, Serialize)]
pub struct ToolCallPayload {
    /// The remainder of the command line after the command token.
    pub text: String,
    /// Accumulated free-form messages drained for this command.
    pub accumulated_params: Vec<String>,
    /// The sending user's display name, if known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

/// The result of a successful plugin response shaped `{data, error}`.
#[derive(Debug, Clone, Deserialize)]
pub struct PluginDataError {
    /// The reply body, when the plugin succeeded.
    #[serde(default)]
    pub data: Option<String>,
    /// A non-empty error message, when the plugin failed in an
    /// application-level (not transport-level) way.
    #[serde(default)]
    pub error: Option<String>,
}

/// A pending command invocation, built by the router before dispatch.
#[derive(Debug, Clone)]
pub struct CommandInvocation {
    /// The chat this command was issued from.
    pub chat_id: i64,
    /// The resolved command name.
    pub command_name: String,
    /// The resolved plugin name.
    pub plugin_name: String,
    /// Text following the command token on the same line.
    pub immediate_text: String,
    /// Free-form messages accumulated since the last drain.
    pub accumulated_params: Vec<String>,
    /// The sending user's display name, if known.
    pub user_info: Option<String>,
}
