//! The `rmcp::ClientHandler` this core presents to every plugin session.
//!
//! Trimmed to the minimum the plugin contract needs: no sampling,
//! roots, or elicitation capabilities are advertised, because the core
//! never initiates or answers those as a client of its plugins — it only
//! calls `tools/call`.

use rmcp::ClientHandler;
use rmcp::model::{ClientCapabilities, ClientInfo, Implementation, ProtocolVersion};

/// Identifies this process to a plugin during the MCP handshake.
#[derive(Debug, Clone, Default)]
pub struct RelaybotClientHandler;

impl ClientHandler for RelaybotClientHandler {
    fn get_info(&self) -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: ProtocolVersion::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "relaybot".to_string(),
                title: Some("Relaybot core".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                icons: None,
                website_url: None,
            },
        }
    }
}
