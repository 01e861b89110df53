//! Model Context Protocol server: JSON-RPC 2.0, one message per line on stdio.

pub mod protocol;
pub mod server;

pub use server::McpServer;
