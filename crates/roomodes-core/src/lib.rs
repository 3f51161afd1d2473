//! Core of the roomodes server: the mode-governed task system.
//!
//! A *mode* is a named, immutable profile constraining which tool groups and
//! file paths a task may touch. A *task* is a stateful unit of work executed
//! under a mode. A *session* is the client-visible handle that owns exactly
//! one task and expires on idleness.
//!
//! The MCP surface lives in the companion `roomodes-mcp` crate; this crate
//! is transport-agnostic.

pub mod builtin;
pub mod catalog;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod prompt;
pub mod registry;
pub mod session;
pub mod types;

pub use builtin::builtin_modes;
pub use catalog::{ToolCatalog, ToolEntry};
pub use config::ServerConfig;
pub use error::ModeError;
pub use orchestrator::{ModeSwitch, TaskOrchestrator};
pub use prompt::render_system_prompt;
pub use registry::{ModeRegistry, SourceFilter};
pub use session::{
    Session, SessionManager, SessionStats, DEFAULT_CLEANUP_INTERVAL, DEFAULT_SESSION_TIMEOUT,
};
pub use types::{
    CompletionStatus, GroupEntry, GroupOptions, Message, MessageRole, ModeConfig, ModeSource,
    Task, TaskState,
};
