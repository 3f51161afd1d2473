//! MCP (Model Context Protocol) server for the roomodes mode/task system.
//!
//! This crate provides a self-contained JSON-RPC 2.0 implementation, an
//! async stdio transport, and the MCP surface over the core crate:
//!
//! - 7 tools: list_modes, get_mode_info, create_task, switch_mode,
//!   get_task_info, validate_tool_use, complete_task
//! - 3 resources per mode: `mode://{slug}`, `mode://{slug}/config`,
//!   `mode://{slug}/system_prompt`
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use roomodes_core::{
//!     builtin_modes, ModeRegistry, SessionManager, TaskOrchestrator, ToolCatalog,
//!     DEFAULT_CLEANUP_INTERVAL, DEFAULT_SESSION_TIMEOUT,
//! };
//! use roomodes_mcp::{McpServer, ModesHandler};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let registry = Arc::new(ModeRegistry::from_modes(builtin_modes()));
//!     let orchestrator = Arc::new(TaskOrchestrator::new(
//!         Arc::clone(&registry),
//!         ToolCatalog::standard(),
//!     ));
//!     let sessions = Arc::new(SessionManager::new(
//!         orchestrator,
//!         DEFAULT_SESSION_TIMEOUT,
//!         DEFAULT_CLEANUP_INTERVAL,
//!     ));
//!     sessions.start();
//!     let mut server = McpServer::new(ModesHandler::new(registry, sessions));
//!     server.run().await
//! }
//! ```

pub mod handler;
pub mod protocol;
pub mod resources;
pub mod server;
pub mod tools;

pub use handler::ModesHandler;
pub use protocol::{ErrorObject, Incoming, RequestId, Response, RpcError};
pub use server::{McpServer, ModeServerHandler, MAX_LINE_BYTES};
pub use tools::{all_tools, get_tool, ToolContent, ToolDefinition, ToolResult};
