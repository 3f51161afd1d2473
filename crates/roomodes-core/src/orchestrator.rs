//! Task orchestrator.
//!
//! Owns the task arena and enforces the mode system's rules: task lifecycle,
//! mode switching, tool-group and file-path restrictions, and parent/child
//! links. Tasks are keyed by opaque ids; parent/child relationships are
//! id-based, never pointer-based.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use serde_json::json;
use tracing::{debug, info};

use crate::catalog::ToolCatalog;
use crate::error::ModeError;
use crate::registry::ModeRegistry;
use crate::types::{CompletionStatus, Task};

/// Outcome of a successful mode switch.
#[derive(Debug, Clone)]
pub struct ModeSwitch {
    pub from: String,
    pub to: String,
}

/// Coordinates tasks against the loaded mode registry.
pub struct TaskOrchestrator {
    registry: Arc<ModeRegistry>,
    catalog: ToolCatalog,
    tasks: RwLock<HashMap<String, Task>>,
}

impl TaskOrchestrator {
    pub fn new(registry: Arc<ModeRegistry>, catalog: ToolCatalog) -> Self {
        Self {
            registry,
            catalog,
            tasks: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &ModeRegistry {
        &self.registry
    }

    /// Create a new active task in the given mode.
    ///
    /// When a parent is given it must exist and still be active; the new
    /// task id is appended to the parent's children. Parent links are fixed
    /// at construction, which keeps the hierarchy acyclic.
    pub fn create_task(
        &self,
        mode_slug: &str,
        initial_message: Option<&str>,
        parent_task_id: Option<&str>,
    ) -> Result<Task, ModeError> {
        if !self.registry.contains(mode_slug) {
            return Err(ModeError::ModeNotFound(mode_slug.to_string()));
        }

        let mut tasks = self.tasks.write().unwrap();

        if let Some(parent_id) = parent_task_id {
            let parent = tasks
                .get(parent_id)
                .ok_or_else(|| ModeError::Validation(format!("parent task not found: {}", parent_id)))?;
            if parent.state.is_terminal() {
                return Err(ModeError::Conflict(format!(
                    "parent task {} is not active",
                    parent_id
                )));
            }
        }

        let mut task = Task::new(mode_slug, parent_task_id);
        if let Some(message) = initial_message {
            task.add_user_message(message);
        }

        if let Some(parent_id) = parent_task_id {
            if let Some(parent) = tasks.get_mut(parent_id) {
                parent.child_task_ids.push(task.task_id.clone());
            }
        }

        tasks.insert(task.task_id.clone(), task.clone());
        info!(task_id = %task.task_id, mode = %mode_slug, "Task created");
        Ok(task)
    }

    /// Snapshot of a task by id.
    pub fn get_task(&self, task_id: &str) -> Option<Task> {
        self.tasks.read().unwrap().get(task_id).cloned()
    }

    /// Switch a task to a different mode. Pure state change, no tool runs.
    pub fn switch_mode(
        &self,
        task_id: &str,
        new_slug: &str,
        reason: Option<&str>,
    ) -> Result<ModeSwitch, ModeError> {
        if !self.registry.contains(new_slug) {
            return Err(ModeError::ModeNotFound(new_slug.to_string()));
        }

        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| ModeError::Internal(format!("task not found: {}", task_id)))?;

        if task.state.is_terminal() {
            return Err(ModeError::Conflict(format!(
                "cannot switch mode: task {} is {}",
                task_id,
                task.state.as_str()
            )));
        }

        let from = std::mem::replace(&mut task.mode_slug, new_slug.to_string());

        task.add_system_message(format!("Mode switched from {} to {}", from, new_slug));
        let mut record = json!({
            "from": from.as_str(),
            "to": new_slug,
            "at": Utc::now().to_rfc3339(),
        });
        if let Some(reason) = reason {
            record["reason"] = json!(reason);
        }
        match task
            .metadata
            .entry("mode_switches".to_string())
            .or_insert_with(|| json!([]))
        {
            serde_json::Value::Array(switches) => switches.push(record),
            other => *other = json!([record]),
        }

        debug!(task_id = %task_id, from = %from, to = %new_slug, "Mode switched");
        Ok(ModeSwitch {
            from,
            to: new_slug.to_string(),
        })
    }

    /// Check whether a tool invocation is permitted for a task.
    ///
    /// Group membership is checked first; the file-regex check is only
    /// reached for edit-class tools in modes that restrict the edit group.
    pub fn validate_tool_use(
        &self,
        task_id: &str,
        tool_name: &str,
        file_path: Option<&str>,
    ) -> Result<(), ModeError> {
        let task = self
            .get_task(task_id)
            .ok_or_else(|| ModeError::Internal(format!("task not found: {}", task_id)))?;

        if task.state.is_terminal() {
            return Err(ModeError::Conflict("task is not active".to_string()));
        }

        if self.catalog.is_always_available(tool_name) {
            return Ok(());
        }

        if !self.catalog.known_tool(tool_name) {
            return Err(ModeError::Validation(format!(
                "unknown tool '{}'",
                tool_name
            )));
        }

        let mode = self
            .registry
            .get(&task.mode_slug)
            .ok_or_else(|| ModeError::ModeNotFound(task.mode_slug.clone()))?;

        let group = self.catalog.group_of(tool_name).unwrap_or_default();
        if !mode.is_group_enabled(group) {
            return Err(ModeError::ToolRestriction {
                tool: tool_name.to_string(),
                group: group.to_string(),
                mode_slug: mode.slug.clone(),
            });
        }

        if self.catalog.is_edit_class(tool_name) {
            if let Some(pattern) = mode.group_file_regex(group) {
                let path = match file_path {
                    Some(path) => path,
                    None => {
                        return Err(ModeError::Validation(format!(
                            "file_path is required for tool '{}' in mode '{}'",
                            tool_name, mode.slug
                        )));
                    }
                };
                if !mode.group_options(group).unwrap().matches_file(path) {
                    return Err(ModeError::FileRestriction {
                        tool: tool_name.to_string(),
                        mode_slug: mode.slug.clone(),
                        path: path.to_string(),
                        pattern: pattern.to_string(),
                    });
                }
            }
        }

        Ok(())
    }

    /// Finish a task with a terminal status. Children are untouched;
    /// parents and children complete independently.
    pub fn complete_task(
        &self,
        task_id: &str,
        status: CompletionStatus,
        result: Option<&str>,
    ) -> Result<Task, ModeError> {
        let mut tasks = self.tasks.write().unwrap();
        let task = tasks
            .get_mut(task_id)
            .ok_or_else(|| ModeError::Internal(format!("task not found: {}", task_id)))?;

        if task.state.is_terminal() {
            return Err(ModeError::Conflict(format!(
                "task {} is already {}",
                task_id,
                task.state.as_str()
            )));
        }

        task.state = status.into_state();
        task.completed_at = Some(Utc::now());
        if let Some(result) = result {
            task.metadata
                .insert("completion_result".to_string(), json!(result));
        }

        info!(task_id = %task_id, status = %status.as_str(), "Task completed");
        Ok(task.clone())
    }

    /// Drop a task from the arena. Called when the owning session is
    /// destroyed; parent/child links are id-based and survive as ids.
    pub fn remove_task(&self, task_id: &str) -> bool {
        let removed = self.tasks.write().unwrap().remove(task_id).is_some();
        if removed {
            debug!(task_id = %task_id, "Task removed");
        }
        removed
    }

    pub fn task_count(&self) -> usize {
        self.tasks.read().unwrap().len()
    }
}
