//! MCP plugin transport: sessions, dispatch, and the client identity this
//! core presents to every plugin (C4).

mod client_handler;
mod error;
mod manager;
mod session;
mod types;

pub use error::{McpError, McpResult};
pub use manager::McpManager;
