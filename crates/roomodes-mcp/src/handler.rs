//! Tool handlers bridging the MCP surface to the mode/task core.
//!
//! Owns input validation (required fields, enums, identifier formats) and
//! the formatting of tool results: human-readable text in `content`, the
//! machine-parseable fields in `metadata`.

use std::sync::Arc;

use serde_json::{json, Value};
use tracing::debug;

use roomodes_core::types::VALID_TOOL_GROUPS;
use roomodes_core::{
    render_system_prompt, CompletionStatus, ModeConfig, ModeError, ModeRegistry, SessionManager,
    SourceFilter,
};

use crate::protocol::RpcError;
use crate::resources;
use crate::server::ModeServerHandler;
use crate::tools::{self, ToolResult};

/// Handler wiring the seven mode tools to the registry, orchestrator and
/// session manager.
pub struct ModesHandler {
    registry: Arc<ModeRegistry>,
    sessions: Arc<SessionManager>,
}

impl ModesHandler {
    pub fn new(registry: Arc<ModeRegistry>, sessions: Arc<SessionManager>) -> Self {
        Self { registry, sessions }
    }

    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    fn mode_display_name(&self, slug: &str) -> String {
        self.registry
            .get(slug)
            .map(|mode| mode.name.clone())
            .unwrap_or_else(|| slug.to_string())
    }

    fn list_modes(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let filter = match optional_str(args, "source")? {
            None => SourceFilter::All,
            Some(source) => SourceFilter::from_str(source).ok_or_else(|| {
                RpcError::from(ModeError::Validation(format!(
                    "source must be one of: builtin, global, project, all (got '{}')",
                    source
                )))
            })?,
        };

        let modes = self.registry.list(filter);
        let mut lines = vec!["Available modes:".to_string(), String::new()];
        for (i, mode) in modes.iter().enumerate() {
            lines.push(format!(
                "{}. {} ({}) - {}",
                i + 1,
                mode.slug,
                mode.name,
                mode.source.as_str()
            ));
            if let Some(description) = &mode.description {
                lines.push(format!("   Description: {}", description));
            }
            lines.push(format!("   Tool groups: {}", format_groups(mode)));
            lines.push(String::new());
        }

        let slugs: Vec<&str> = modes.iter().map(|m| m.slug.as_str()).collect();
        Ok(ToolResult::with_metadata(
            lines.join("\n"),
            json!({ "count": modes.len(), "slugs": slugs }),
        ))
    }

    fn get_mode_info(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let slug = required_str(args, "mode_slug")?;
        validate_slug_shape(slug)?;
        let include_system_prompt = optional_bool(args, "include_system_prompt")?.unwrap_or(false);

        let mode = self
            .registry
            .get(slug)
            .ok_or_else(|| RpcError::from(ModeError::ModeNotFound(slug.to_string())))?;

        let mut lines = vec![
            format!("Mode: {} ({})", mode.name, mode.slug),
            format!("Source: {}", mode.source.as_str()),
        ];
        if let Some(description) = &mode.description {
            lines.push(format!("Description: {}", description));
        }
        if let Some(when) = &mode.when_to_use {
            lines.push(String::new());
            lines.push("When to use:".to_string());
            lines.push(when.clone());
        }

        lines.push(String::new());
        lines.push("Tool Groups:".to_string());
        for group in VALID_TOOL_GROUPS {
            let enabled = mode.is_group_enabled(group);
            let mut line = format!("{} {}", if enabled { "✓" } else { "✗" }, group);
            if enabled {
                if let Some(options) = mode.group_options(group) {
                    if let Some(pattern) = &options.file_regex {
                        line.push_str(&format!(" (restricted to: {})", pattern));
                    }
                    if let Some(desc) = &options.description {
                        line.push_str(&format!(" - {}", desc));
                    }
                }
            }
            lines.push(line);
        }

        if let Some(instructions) = &mode.custom_instructions {
            lines.push(String::new());
            lines.push("Custom Instructions:".to_string());
            lines.push(instructions.clone());
        }

        if include_system_prompt {
            lines.push(String::new());
            lines.push("System Prompt:".to_string());
            lines.push(render_system_prompt(mode));
        }

        Ok(ToolResult::with_metadata(
            lines.join("\n"),
            json!({ "slug": mode.slug, "source": mode.source.as_str() }),
        ))
    }

    fn create_task(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let mode_slug = required_str(args, "mode_slug")?;
        validate_slug_shape(mode_slug)?;
        let initial_message = optional_str(args, "initial_message")?;

        let parent_task_id = match optional_str(args, "parent_session_id")? {
            None => None,
            Some(parent_session_id) => {
                validate_session_id(parent_session_id)?;
                let parent = self.sessions.resolve(parent_session_id)?;
                Some(parent.task_id)
            }
        };

        let task = self.sessions.orchestrator().create_task(
            mode_slug,
            initial_message,
            parent_task_id.as_deref(),
        )?;
        let session = self.sessions.create_session(&task.task_id);

        let text = format!(
            "Task created successfully\n\n\
             Session ID: {}\n\
             Task ID: {}\n\
             Mode: {} ({})\n\
             State: {}\n\n\
             Use this session_id for subsequent operations.",
            session.session_id,
            task.task_id,
            mode_slug,
            self.mode_display_name(mode_slug),
            task.state.as_str(),
        );

        Ok(ToolResult::with_metadata(
            text,
            json!({
                "session_id": session.session_id,
                "task_id": task.task_id,
                "mode_slug": mode_slug,
            }),
        ))
    }

    fn switch_mode(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let session_id = required_str(args, "session_id")?;
        let new_mode_slug = required_str(args, "new_mode_slug")?;
        validate_session_id(session_id)?;
        validate_slug_shape(new_mode_slug)?;
        let reason = optional_str(args, "reason")?;

        let session = self.sessions.resolve(session_id)?;
        let switch =
            self.sessions
                .orchestrator()
                .switch_mode(&session.task_id, new_mode_slug, reason)?;

        let mut text = format!(
            "Mode switched successfully\n\n\
             Session: {}\n\
             Old mode: {}\n\
             New mode: {}\n",
            session_id, switch.from, switch.to,
        );
        if let Some(reason) = reason {
            text.push_str(&format!("Reason: {}\n", reason));
        }
        if let Some(mode) = self.registry.get(new_mode_slug) {
            text.push_str("\nNew tool groups:\n");
            for group in VALID_TOOL_GROUPS {
                let enabled = mode.is_group_enabled(group);
                text.push_str(&format!("{} {}", if enabled { "✓" } else { "✗" }, group));
                if enabled {
                    if let Some(pattern) = mode.group_file_regex(group) {
                        text.push_str(&format!(" (restricted to: {})", pattern));
                    }
                } else {
                    text.push_str(" (not available)");
                }
                text.push('\n');
            }
        }

        Ok(ToolResult::with_metadata(
            text,
            json!({ "old_mode": switch.from, "new_mode": switch.to }),
        ))
    }

    fn get_task_info(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let session_id = required_str(args, "session_id")?;
        validate_session_id(session_id)?;
        let include_messages = optional_bool(args, "include_messages")?.unwrap_or(false);
        let include_hierarchy = optional_bool(args, "include_hierarchy")?.unwrap_or(false);

        let session = self.sessions.resolve(session_id)?;
        let task = self
            .sessions
            .orchestrator()
            .get_task(&session.task_id)
            .ok_or_else(|| {
                RpcError::from(ModeError::Internal(format!(
                    "task missing for session {}",
                    session_id
                )))
            })?;

        let mut lines = vec![
            "Task Information".to_string(),
            String::new(),
            format!("Session ID: {}", session.session_id),
            format!("Task ID: {}", task.task_id),
            format!(
                "Mode: {} ({})",
                self.mode_display_name(&task.mode_slug),
                task.mode_slug
            ),
            format!("State: {}", task.state.as_str()),
            format!("Created: {}", task.created_at.to_rfc3339()),
        ];
        if let Some(completed_at) = task.completed_at {
            lines.push(format!("Completed: {}", completed_at.to_rfc3339()));
        }
        lines.push(String::new());
        lines.push(format!("Session Age: {}s", session.age_seconds()));
        lines.push(format!("Idle Time: {}s", session.idle_seconds()));

        if include_hierarchy {
            lines.push(String::new());
            lines.push("Hierarchy:".to_string());
            if let Some(parent_id) = &task.parent_task_id {
                lines.push(format!("  Parent Task: {}", parent_id));
            }
            if !task.child_task_ids.is_empty() {
                lines.push(format!("  Child Tasks: {}", task.child_task_ids.join(", ")));
            }
        }

        if include_messages {
            lines.push(String::new());
            lines.push(format!(
                "Conversation History ({} messages):",
                task.messages.len()
            ));
            for (i, message) in task.messages.iter().enumerate() {
                lines.push(String::new());
                lines.push(format!(
                    "{}. [{}] {}",
                    i + 1,
                    message.role.as_str(),
                    message.timestamp.to_rfc3339()
                ));
                let mut preview: String = message.content.chars().take(100).collect();
                if message.content.chars().count() > 100 {
                    preview.push_str("...");
                }
                lines.push(format!("   {}", preview));
            }
        }

        let mut metadata = json!({
            "session_id": session.session_id,
            "task_id": task.task_id,
            "mode": task.mode_slug,
            "state": task.state.as_str(),
            "message_count": task.messages.len(),
        });
        if include_hierarchy {
            metadata["parent_task_id"] = json!(task.parent_task_id);
            metadata["child_task_ids"] = json!(task.child_task_ids);
        }

        Ok(ToolResult::with_metadata(lines.join("\n"), metadata))
    }

    fn validate_tool_use(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let session_id = required_str(args, "session_id")?;
        let tool_name = required_str(args, "tool_name")?;
        validate_session_id(session_id)?;
        let file_path = optional_str(args, "file_path")?;

        let session = self.sessions.resolve(session_id)?;
        let task = self
            .sessions
            .orchestrator()
            .get_task(&session.task_id)
            .ok_or_else(|| {
                RpcError::from(ModeError::Internal(format!(
                    "task missing for session {}",
                    session_id
                )))
            })?;
        let mode_name = self.mode_display_name(&task.mode_slug);

        match self
            .sessions
            .orchestrator()
            .validate_tool_use(&session.task_id, tool_name, file_path)
        {
            Ok(()) => {
                let mut text = format!("✓ Tool '{}' is allowed in mode '{}'", tool_name, mode_name);
                if let Some(path) = file_path {
                    text.push_str(&format!(" for file '{}'", path));
                }
                Ok(ToolResult::with_metadata(
                    text,
                    json!({
                        "allowed": true,
                        "tool_name": tool_name,
                        "mode": task.mode_slug,
                    }),
                ))
            }
            Err(denial) => {
                let reason = denial.to_string();
                Ok(ToolResult::with_metadata(
                    format!("✗ {}", reason),
                    json!({
                        "allowed": false,
                        "tool_name": tool_name,
                        "mode": task.mode_slug,
                        "reason": reason,
                    }),
                ))
            }
        }
    }

    fn complete_task(&self, args: &Value) -> Result<ToolResult, RpcError> {
        let session_id = required_str(args, "session_id")?;
        let status_raw = required_str(args, "status")?;
        validate_session_id(session_id)?;
        let status = CompletionStatus::from_str(status_raw).ok_or_else(|| {
            RpcError::from(ModeError::Validation(format!(
                "status must be one of: completed, failed, cancelled (got '{}')",
                status_raw
            )))
        })?;
        let result = optional_str(args, "result")?;

        let session = self.sessions.resolve(session_id)?;
        let task = self
            .sessions
            .orchestrator()
            .complete_task(&session.task_id, status, result)?;

        let mut text = format!(
            "Task {}\n\n\
             Session ID: {}\n\
             Task ID: {}\n\
             Final State: {}\n",
            status.as_str(),
            session_id,
            task.task_id,
            task.state.as_str(),
        );
        if let Some(completed_at) = task.completed_at {
            text.push_str(&format!("Completed At: {}\n", completed_at.to_rfc3339()));
        }
        if let Some(result) = result {
            text.push_str(&format!("\nResult:\n{}", result));
        }

        let tool_result = ToolResult::with_metadata(
            text,
            json!({
                "session_id": session_id,
                "task_id": task.task_id,
                "status": task.state.as_str(),
            }),
        );

        // The session is destroyed once the response is built; the next call
        // on this id gets TASK_NOT_FOUND.
        self.sessions.destroy_session(session_id);

        Ok(tool_result)
    }
}

#[async_trait::async_trait]
impl ModeServerHandler for ModesHandler {
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<ToolResult, RpcError> {
        debug!(tool = %name, "Tool call");
        if tools::get_tool(name).is_none() {
            return Err(RpcError::MethodNotFound(format!("tool '{}'", name)));
        }
        match name {
            "list_modes" => self.list_modes(&arguments),
            "get_mode_info" => self.get_mode_info(&arguments),
            "create_task" => self.create_task(&arguments),
            "switch_mode" => self.switch_mode(&arguments),
            "get_task_info" => self.get_task_info(&arguments),
            "validate_tool_use" => self.validate_tool_use(&arguments),
            "complete_task" => self.complete_task(&arguments),
            _ => Err(RpcError::MethodNotFound(format!("tool '{}'", name))),
        }
    }

    fn list_resources(&self) -> Result<Value, RpcError> {
        Ok(json!({ "resources": resources::list_resources(&self.registry) }))
    }

    fn read_resource(&self, uri: &str) -> Result<Value, RpcError> {
        Ok(resources::read_resource(&self.registry, uri)?)
    }

    fn mode_count(&self) -> usize {
        self.registry.len()
    }

    fn session_count(&self) -> usize {
        self.sessions.session_count()
    }

    fn shutdown(&self) {
        self.sessions.stop();
        self.sessions.cleanup_all();
    }
}

fn format_groups(mode: &ModeConfig) -> String {
    mode.groups
        .iter()
        .map(|entry| match entry.options().and_then(|o| o.file_regex.as_ref()) {
            Some(pattern) => format!("{} ({})", entry.name(), pattern),
            None => entry.name().to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn required_str<'a>(args: &'a Value, key: &str) -> Result<&'a str, RpcError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(RpcError::InvalidParams(format!(
            "missing required parameter: {}",
            key
        ))),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(RpcError::InvalidParams(format!(
            "parameter '{}' must be a string",
            key
        ))),
    }
}

fn optional_str<'a>(args: &'a Value, key: &str) -> Result<Option<&'a str>, RpcError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(_) => Err(RpcError::InvalidParams(format!(
            "parameter '{}' must be a string",
            key
        ))),
    }
}

fn optional_bool(args: &Value, key: &str) -> Result<Option<bool>, RpcError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(RpcError::InvalidParams(format!(
            "parameter '{}' must be a boolean",
            key
        ))),
    }
}

fn validate_session_id(session_id: &str) -> Result<(), RpcError> {
    if session_id.len() < 5 || !session_id.starts_with("ses_") {
        return Err(RpcError::from(ModeError::Validation(format!(
            "invalid session id format: {}",
            session_id
        ))));
    }
    Ok(())
}

fn validate_slug_shape(slug: &str) -> Result<(), RpcError> {
    if slug.is_empty()
        || !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(RpcError::from(ModeError::Validation(format!(
            "invalid mode slug format: {}",
            slug
        ))));
    }
    Ok(())
}
