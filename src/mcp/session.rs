//! A single live connection to one plugin: the stdio-subprocess or
//! streamable-HTTP transport and the MCP handshake.
//!
//! Dispatch (the actual `tools/call` await) deliberately does not live
//! here: once a session is Ready, callers clone its `Peer` handle and
//! call through that directly, so concurrent calls to the same plugin
//! are never serialized behind a session-wide lock — `rmcp`'s `Peer`
//! already correlates replies by request id internally. This type only
//! owns the open/close lifecycle; the session map itself is guarded by
//! a fine-grained per-plugin lock used only for open/close.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::ServiceExt;
use rmcp::service::{Peer, RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::TokioChildProcess;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use tracing::{info, warn};

use crate::mcp::client_handler::RelaybotClientHandler;
use crate::mcp::error::McpError;
use crate::models::{McpTransport, PluginManifest};

type Service = RunningService<RoleClient, RelaybotClientHandler>;

/// Protocol state of a [`PluginSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No transport is open.
    Closed,
    /// The session is connected and can accept calls.
    Ready,
    /// The transport failed; the next call must reopen.
    Broken,
}

/// A live (or not-yet-opened) connection to one plugin.
pub struct PluginSession {
    name: String,
    service: Option<Service>,
    state: SessionState,
    last_used: Instant,
}

impl PluginSession {
    /// Creates a session in the `Closed` state; no transport is opened yet.
    pub fn closed(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            service: None,
            state: SessionState::Closed,
            last_used: Instant::now(),
        }
    }

    /// Returns a cloned request handle if the session is Ready, or `None`
    /// if it needs to be (re)opened first.
    pub fn peer_if_ready(&self) -> Option<Peer<RoleClient>> {
        if self.state != SessionState::Ready {
            return None;
        }
        self.service.as_ref().map(|svc| svc.peer().clone())
    }

    /// Time elapsed since this session last served or attempted a call.
    pub fn idle_for(&self) -> Duration {
        self.last_used.elapsed()
    }

    /// Marks the session Broken after a transport-level call failure; the
    /// next `peer_if_ready` call returns `None`, forcing a reopen.
    pub fn mark_broken(&mut self) {
        self.state = SessionState::Broken;
    }

    /// Records that this session just served (or attempted) a call.
    pub fn touch(&mut self) {
        self.last_used = Instant::now();
    }

    /// Opens the transport and performs the MCP handshake per the
    /// manifest's `mcp` table. Spawns a subprocess for `stdio`, opens a
    /// streamable HTTP session for `http`.
    pub async fn open(&mut self, manifest: &PluginManifest) -> Result<(), McpError> {
        let service = match &manifest.mcp.transport {
            McpTransport::Stdio { command, args, cwd, env } => {
                self.open_stdio(command, args, cwd.as_deref(), env).await?
            }
            McpTransport::Http { url, headers } => self.open_http(url, headers.as_ref()).await?,
        };
        self.service = Some(service);
        self.state = SessionState::Ready;
        self.last_used = Instant::now();
        info!(plugin = %self.name, "plugin session ready");
        Ok(())
    }

    async fn open_stdio(
        &self,
        command: &str,
        args: &[String],
        cwd: Option<&str>,
        env: &HashMap<String, String>,
    ) -> Result<Service, McpError> {
        let mut cmd = tokio::process::Command::new(command);
        cmd.args(args);
        cmd.stderr(std::process::Stdio::inherit());
        for (key, value) in env {
            cmd.env(key, value);
        }
        if let Some(cwd) = cwd {
            cmd.current_dir(cwd);
        }

        let transport = TokioChildProcess::new(cmd).map_err(|e| McpError::Transport {
            plugin: self.name.clone(),
            reason: format!("failed to spawn {command}: {e}"),
        })?;

        RelaybotClientHandler
            .serve(transport)
            .await
            .map_err(|e| McpError::Transport {
                plugin: self.name.clone(),
                reason: format!("handshake failed: {e}"),
            })
    }

    async fn open_http(&self, url: &str, headers: Option<&HashMap<String, String>>) -> Result<Service, McpError> {
        let config = StreamableHttpClientTransportConfig::with_uri(url.to_string());

        let handshake = match headers {
            None => {
                let transport = StreamableHttpClientTransport::from_config(config);
                RelaybotClientHandler.serve(transport).await
            }
            Some(headers) => {
                let client = self.http_client_with_headers(headers)?;
                let transport = StreamableHttpClientTransport::with_client(client, config);
                RelaybotClientHandler.serve(transport).await
            }
        };

        handshake.map_err(|e| McpError::Transport {
            plugin: self.name.clone(),
            reason: format!("handshake failed: {e}"),
        })
    }

    fn http_client_with_headers(&self, headers: &HashMap<String, String>) -> Result<reqwest::Client, McpError> {
        let mut header_map = HeaderMap::new();
        for (key, value) in headers {
            let name = HeaderName::from_bytes(key.as_bytes()).map_err(|e| McpError::Transport {
                plugin: self.name.clone(),
                reason: format!("invalid header name {key:?}: {e}"),
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| McpError::Transport {
                plugin: self.name.clone(),
                reason: format!("invalid header value for {key:?}: {e}"),
            })?;
            header_map.insert(name, value);
        }
        reqwest::Client::builder()
            .default_headers(header_map)
            .build()
            .map_err(|e| McpError::Transport {
                plugin: self.name.clone(),
                reason: format!("failed to build http client: {e}"),
            })
    }

    /// Gracefully closes the transport: sends a close frame and waits up
    /// to 5 seconds for the peer (or, for `stdio`, the child process) to
    /// acknowledge, force-terminating otherwise.
    pub async fn close(mut self) {
        if let Some(service) = self.service.take() {
            match service.close_with_timeout(Duration::from_secs(5)).await {
                Ok(Some(_reason)) => info!(plugin = %self.name, "session closed gracefully"),
                Ok(None) => warn!(plugin = %self.name, "session close timed out; force-terminated"),
                Err(e) => warn!(plugin = %self.name, error = %e, "session close join error"),
            }
        }
        self.state = SessionState::Closed;
    }
}
