//! Relaybot: a modular chat-bot core mediating between a long-polling
//! messaging platform and independently deployed MCP plugin workers
//! ("cattackles").

pub mod accumulator;
pub mod accumulator_manager;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod logging;
pub mod mcp;
pub mod models;
pub mod offset_store;
pub mod platform;
pub mod poller;
pub mod registry;
pub mod retry;
pub mod router;
