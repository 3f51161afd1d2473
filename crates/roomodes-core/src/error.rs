//! Typed errors for the mode/task system.
//!
//! Each variant maps to a JSON-RPC application error code, so the protocol
//! layer can translate failures without string matching.

use serde_json::{json, Value};

/// Errors raised by the registry, orchestrator and session manager.
#[derive(Debug, Clone)]
pub enum ModeError {
    /// Unknown mode slug.
    ModeNotFound(String),
    /// Unknown session id.
    TaskNotFound(String),
    /// Session existed but idle-timed-out.
    SessionExpired(String),
    /// Schema or format failure (bad URI, bad enum, bad id).
    Validation(String),
    /// Operation conflicts with the current task state.
    Conflict(String),
    /// Tool group not enabled in the current mode.
    ToolRestriction {
        tool: String,
        group: String,
        mode_slug: String,
    },
    /// File path fails the mode's regex.
    FileRestriction {
        tool: String,
        mode_slug: String,
        path: String,
        pattern: String,
    },
    /// Uncaught defect.
    Internal(String),
}

impl ModeError {
    /// JSON-RPC error code for this variant.
    pub fn code(&self) -> i32 {
        match self {
            ModeError::ModeNotFound(_) => -32001,
            ModeError::TaskNotFound(_) => -32002,
            ModeError::SessionExpired(_) => -32003,
            ModeError::Validation(_) => -32004,
            ModeError::ToolRestriction { .. } => -32005,
            ModeError::FileRestriction { .. } => -32006,
            ModeError::Conflict(_) | ModeError::Internal(_) => -32603,
        }
    }

    /// Structured error data for restriction denials, so clients can explain
    /// the failure without a second round-trip.
    pub fn data(&self) -> Option<Value> {
        match self {
            ModeError::ToolRestriction {
                tool,
                group,
                mode_slug,
            } => Some(json!({
                "tool": tool,
                "group": group,
                "mode": mode_slug,
            })),
            ModeError::FileRestriction {
                tool,
                mode_slug,
                path,
                pattern,
            } => Some(json!({
                "tool": tool,
                "mode": mode_slug,
                "path": path,
                "pattern": pattern,
            })),
            _ => None,
        }
    }
}

impl std::fmt::Display for ModeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModeError::ModeNotFound(slug) => write!(f, "Mode not found: {}", slug),
            ModeError::TaskNotFound(session_id) => {
                write!(f, "Session not found: {}", session_id)
            }
            ModeError::SessionExpired(session_id) => {
                write!(f, "Session expired: {}", session_id)
            }
            ModeError::Validation(msg) => write!(f, "Validation error: {}", msg),
            ModeError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ModeError::ToolRestriction {
                tool,
                group,
                mode_slug,
            } => {
                write!(
                    f,
                    "Tool '{}' is not allowed: tool group '{}' is not enabled for mode '{}'",
                    tool, group, mode_slug
                )
            }
            ModeError::FileRestriction {
                tool,
                mode_slug,
                path,
                pattern,
            } => write!(
                f,
                "Tool '{}' cannot edit file '{}' in mode '{}': file must match pattern {}",
                tool, path, mode_slug, pattern
            ),
            ModeError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ModeError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ModeError::ModeNotFound("x".into()).code(), -32001);
        assert_eq!(ModeError::TaskNotFound("x".into()).code(), -32002);
        assert_eq!(ModeError::SessionExpired("x".into()).code(), -32003);
        assert_eq!(ModeError::Validation("x".into()).code(), -32004);
        assert_eq!(
            ModeError::ToolRestriction {
                tool: "execute_command".into(),
                group: "command".into(),
                mode_slug: "ask".into()
            }
            .code(),
            -32005
        );
        assert_eq!(
            ModeError::FileRestriction {
                tool: "write_to_file".into(),
                mode_slug: "architect".into(),
                path: "main.py".into(),
                pattern: "\\.md$".into()
            }
            .code(),
            -32006
        );
        assert_eq!(ModeError::Conflict("x".into()).code(), -32603);
    }

    #[test]
    fn test_file_restriction_data() {
        let err = ModeError::FileRestriction {
            tool: "write_to_file".into(),
            mode_slug: "architect".into(),
            path: "main.py".into(),
            pattern: "\\.md$".into(),
        };
        let data = err.data().unwrap();
        assert_eq!(data["tool"], "write_to_file");
        assert_eq!(data["mode"], "architect");
        assert_eq!(data["path"], "main.py");
        assert_eq!(data["pattern"], "\\.md$");
    }

    #[test]
    fn test_display_mentions_pattern() {
        let err = ModeError::FileRestriction {
            tool: "write_to_file".into(),
            mode_slug: "architect".into(),
            path: "main.py".into(),
            pattern: "\\.md$".into(),
        };
        let text = err.to_string();
        assert!(text.contains("main.py"));
        assert!(text.contains("\\.md$"));
    }
}
