//! MCP tool definitions for the mode/task surface.
//!
//! These are the tools exposed over the protocol (`tools/list`), not to be
//! confused with the mode system's internal tool groups that the
//! orchestrator validates against.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Tool definition following the MCP schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

impl ToolDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        ToolDefinition {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool result content block.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
#[serde(rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Envelope for a successful tool call: human-readable text plus an
/// optional machine-parseable metadata object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        ToolResult {
            content: vec![ToolContent::Text { text: text.into() }],
            metadata: None,
            is_error: None,
        }
    }

    pub fn with_metadata(text: impl Into<String>, metadata: Value) -> Self {
        ToolResult {
            content: vec![ToolContent::Text { text: text.into() }],
            metadata: Some(metadata),
            is_error: None,
        }
    }
}

/// All tool schemas served by `tools/list`.
pub fn all_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new(
            "list_modes",
            "List all available modes with their metadata",
            json!({
                "type": "object",
                "properties": {
                    "source": {
                        "type": "string",
                        "enum": ["builtin", "global", "project", "all"],
                        "description": "Filter modes by source (default: all)"
                    }
                }
            }),
        ),
        ToolDefinition::new(
            "get_mode_info",
            "Get detailed information about a specific mode",
            json!({
                "type": "object",
                "properties": {
                    "mode_slug": {
                        "type": "string",
                        "description": "Slug of the mode to get info for"
                    },
                    "include_system_prompt": {
                        "type": "boolean",
                        "description": "Include the full system prompt (default: false)"
                    }
                },
                "required": ["mode_slug"]
            }),
        ),
        ToolDefinition::new(
            "create_task",
            "Create a new task in a specific mode",
            json!({
                "type": "object",
                "properties": {
                    "mode_slug": {
                        "type": "string",
                        "description": "Mode to use for this task"
                    },
                    "initial_message": {
                        "type": "string",
                        "description": "Initial user message for the task"
                    },
                    "parent_session_id": {
                        "type": "string",
                        "description": "Parent session ID if this is a subtask"
                    }
                },
                "required": ["mode_slug"]
            }),
        ),
        ToolDefinition::new(
            "switch_mode",
            "Switch a task to a different mode",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {
                        "type": "string",
                        "description": "Session ID of the task"
                    },
                    "new_mode_slug": {
                        "type": "string",
                        "description": "Slug of the mode to switch to"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Reason for switching modes (optional)"
                    }
                },
                "required": ["session_id", "new_mode_slug"]
            }),
        ),
        ToolDefinition::new(
            "get_task_info",
            "Get information about a task/session",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {
                        "type": "string",
                        "description": "Session ID"
                    },
                    "include_messages": {
                        "type": "boolean",
                        "description": "Include conversation history (default: false)"
                    },
                    "include_hierarchy": {
                        "type": "boolean",
                        "description": "Include parent/child task info (default: false)"
                    }
                },
                "required": ["session_id"]
            }),
        ),
        ToolDefinition::new(
            "validate_tool_use",
            "Check if a tool can be used in the current mode",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {
                        "type": "string",
                        "description": "Session ID"
                    },
                    "tool_name": {
                        "type": "string",
                        "description": "Name of the tool to validate"
                    },
                    "file_path": {
                        "type": "string",
                        "description": "File path (for edit operations)"
                    }
                },
                "required": ["session_id", "tool_name"]
            }),
        ),
        ToolDefinition::new(
            "complete_task",
            "Mark a task as completed, failed or cancelled",
            json!({
                "type": "object",
                "properties": {
                    "session_id": {
                        "type": "string",
                        "description": "Session ID"
                    },
                    "status": {
                        "type": "string",
                        "enum": ["completed", "failed", "cancelled"],
                        "description": "Final status of the task"
                    },
                    "result": {
                        "type": "string",
                        "description": "Completion result or error message"
                    }
                },
                "required": ["session_id", "status"]
            }),
        ),
    ]
}

/// Get a tool definition by name.
pub fn get_tool(name: &str) -> Option<ToolDefinition> {
    all_tools().into_iter().find(|t| t.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_tools_count() {
        assert_eq!(all_tools().len(), 7);
    }

    #[test]
    fn test_get_tool() {
        assert!(get_tool("create_task").is_some());
        assert!(get_tool("validate_tool_use").is_some());
        assert!(get_tool("unknown_tool").is_none());
    }

    #[test]
    fn test_required_fields() {
        let create = get_tool("create_task").unwrap();
        assert_eq!(create.input_schema["required"], json!(["mode_slug"]));

        let complete = get_tool("complete_task").unwrap();
        assert_eq!(
            complete.input_schema["required"],
            json!(["session_id", "status"])
        );
        assert_eq!(
            complete.input_schema["properties"]["status"]["enum"],
            json!(["completed", "failed", "cancelled"])
        );
    }

    #[test]
    fn test_tool_result_metadata_serialization() {
        let result = ToolResult::with_metadata("done", json!({"session_id": "ses_1"}));
        let json_text = serde_json::to_string(&result).unwrap();
        assert!(json_text.contains("\"metadata\""));
        assert!(json_text.contains("ses_1"));

        let plain = ToolResult::text("hello");
        let json_text = serde_json::to_string(&plain).unwrap();
        assert!(!json_text.contains("\"metadata\""));
        assert!(!json_text.contains("\"is_error\""));
    }

    #[test]
    fn test_schema_uses_camel_case_key() {
        let tool = get_tool("list_modes").unwrap();
        let json_text = serde_json::to_string(&tool).unwrap();
        assert!(json_text.contains("\"inputSchema\""));
    }
}
