//! Core types for the mode/task system.
//!
//! Modes are immutable operational profiles; tasks are stateful units of work
//! executed under a mode. Both serialize with the field names used by the
//! `customModes` file format.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Tool groups a mode can enable.
pub const VALID_TOOL_GROUPS: [&str; 6] = ["read", "edit", "browser", "command", "mcp", "modes"];

// ============ Mode ============

/// Where a mode definition was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModeSource {
    Builtin,
    Global,
    Project,
}

impl ModeSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModeSource::Builtin => "builtin",
            ModeSource::Global => "global",
            ModeSource::Project => "project",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "builtin" => Some(ModeSource::Builtin),
            "global" => Some(ModeSource::Global),
            "project" => Some(ModeSource::Project),
            _ => None,
        }
    }
}

/// Options attached to a tool group entry, including file restrictions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupOptions {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_regex: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GroupOptions {
    /// Check whether a file path satisfies this group's restriction.
    /// No configured regex means every path matches. The pattern uses search
    /// semantics (unanchored), matching the mode file format.
    pub fn matches_file(&self, file_path: &str) -> bool {
        match &self.file_regex {
            None => true,
            Some(pattern) => match regex::Regex::new(pattern) {
                Ok(re) => re.is_match(file_path),
                Err(_) => false,
            },
        }
    }
}

/// A group entry is either a bare group name or a name paired with options.
///
/// Deserializes from `"read"` or `["edit", {"fileRegex": "\\.md$"}]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupEntry {
    Bare(String),
    Restricted(String, GroupOptions),
}

impl GroupEntry {
    pub fn name(&self) -> &str {
        match self {
            GroupEntry::Bare(name) => name,
            GroupEntry::Restricted(name, _) => name,
        }
    }

    pub fn options(&self) -> Option<&GroupOptions> {
        match self {
            GroupEntry::Bare(_) => None,
            GroupEntry::Restricted(_, options) => Some(options),
        }
    }
}

/// An immutable mode definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModeConfig {
    pub slug: String,
    pub name: String,
    pub role_definition: String,
    #[serde(default)]
    pub groups: Vec<GroupEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub when_to_use: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_instructions: Option<String>,
    #[serde(default = "default_source")]
    pub source: ModeSource,
}

fn default_source() -> ModeSource {
    ModeSource::Builtin
}

impl ModeConfig {
    /// Validate slug format, required fields and group entries.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.slug.is_empty()
            || !self
                .slug
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            anyhow::bail!(
                "invalid slug '{}': must match [a-z0-9_-]+",
                self.slug
            );
        }
        if self.name.is_empty() {
            anyhow::bail!("mode '{}' is missing a name", self.slug);
        }
        if self.role_definition.is_empty() {
            anyhow::bail!("mode '{}' is missing a roleDefinition", self.slug);
        }

        let mut seen: Vec<&str> = Vec::new();
        for entry in &self.groups {
            let group = entry.name();
            if !VALID_TOOL_GROUPS.contains(&group) {
                anyhow::bail!(
                    "invalid tool group '{}' in mode '{}' (valid: {})",
                    group,
                    self.slug,
                    VALID_TOOL_GROUPS.join(", ")
                );
            }
            if seen.contains(&group) {
                anyhow::bail!("duplicate group '{}' in mode '{}'", group, self.slug);
            }
            seen.push(group);

            if let Some(options) = entry.options() {
                if let Some(pattern) = &options.file_regex {
                    regex::Regex::new(pattern).map_err(|e| {
                        anyhow::anyhow!(
                            "invalid fileRegex '{}' in mode '{}': {}",
                            pattern,
                            self.slug,
                            e
                        )
                    })?;
                }
            }
        }
        Ok(())
    }

    /// Is a tool group enabled in this mode?
    pub fn is_group_enabled(&self, group: &str) -> bool {
        self.groups.iter().any(|entry| entry.name() == group)
    }

    /// Options for a group, if the group is enabled and carries any.
    pub fn group_options(&self, group: &str) -> Option<&GroupOptions> {
        self.groups
            .iter()
            .find(|entry| entry.name() == group)
            .and_then(|entry| entry.options())
    }

    /// The file regex configured for a group, if any.
    pub fn group_file_regex(&self, group: &str) -> Option<&str> {
        self.group_options(group)
            .and_then(|options| options.file_regex.as_deref())
    }

    /// Check whether this mode may edit the given file.
    pub fn can_edit_file(&self, file_path: &str) -> bool {
        if !self.is_group_enabled("edit") {
            return false;
        }
        match self.group_options("edit") {
            None => true,
            Some(options) => options.matches_file(file_path),
        }
    }
}

/// Top-level shape of a mode file (`modes.yaml` / `.roomodes`).
/// Entries stay raw so one bad entry never poisons the rest.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModesFile {
    #[serde(default)]
    pub custom_modes: Vec<serde_yaml::Value>,
}

// ============ Task ============

/// Lifecycle state of a task. Once a task leaves `Active` it is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Active,
    Completed,
    Failed,
    Cancelled,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Active => "active",
            TaskState::Completed => "completed",
            TaskState::Failed => "failed",
            TaskState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, TaskState::Active)
    }
}

/// Terminal status accepted by `complete_task`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    Completed,
    Failed,
    Cancelled,
}

impl CompletionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompletionStatus::Completed => "completed",
            CompletionStatus::Failed => "failed",
            CompletionStatus::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "completed" => Some(CompletionStatus::Completed),
            "failed" => Some(CompletionStatus::Failed),
            "cancelled" => Some(CompletionStatus::Cancelled),
            _ => None,
        }
    }

    pub fn into_state(self) -> TaskState {
        match self {
            CompletionStatus::Completed => TaskState::Completed,
            CompletionStatus::Failed => TaskState::Failed,
            CompletionStatus::Cancelled => TaskState::Cancelled,
        }
    }
}

/// Role of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}

impl MessageRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::System => "system",
        }
    }
}

/// A message in a task's conversation history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A stateful unit of work executed under a mode.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub task_id: String,
    pub mode_slug: String,
    pub state: TaskState,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_task_id: Option<String>,
    #[serde(default)]
    pub child_task_ids: Vec<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub metadata: HashMap<String, serde_json::Value>,
}

impl Task {
    /// Create a new active task in the given mode.
    pub fn new(mode_slug: &str, parent_task_id: Option<&str>) -> Self {
        Task {
            task_id: format!("task_{}", Uuid::new_v4().simple()),
            mode_slug: mode_slug.to_string(),
            state: TaskState::Active,
            created_at: Utc::now(),
            completed_at: None,
            parent_task_id: parent_task_id.map(|id| id.to_string()),
            child_task_ids: Vec::new(),
            messages: Vec::new(),
            metadata: HashMap::new(),
        }
    }

    pub fn add_message(&mut self, role: MessageRole, content: impl Into<String>) {
        self.messages.push(Message {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        });
    }

    pub fn add_user_message(&mut self, content: impl Into<String>) {
        self.add_message(MessageRole::User, content);
    }

    pub fn add_system_message(&mut self, content: impl Into<String>) {
        self.add_message(MessageRole::System, content);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_group_entry_deserialization() {
        let yaml = r#"
- read
- [edit, {fileRegex: "\\.md$", description: "Markdown only"}]
- browser
"#;
        let entries: Vec<GroupEntry> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0], GroupEntry::Bare("read".to_string()));
        assert_eq!(entries[1].name(), "edit");
        assert_eq!(
            entries[1].options().unwrap().file_regex.as_deref(),
            Some("\\.md$")
        );
        assert_eq!(entries[2].name(), "browser");
    }

    #[test]
    fn test_group_options_matches_file() {
        let options = GroupOptions {
            file_regex: Some("\\.md$".to_string()),
            description: None,
        };
        assert!(options.matches_file("README.md"));
        assert!(options.matches_file("docs/plan.md"));
        assert!(!options.matches_file("main.py"));

        let unrestricted = GroupOptions::default();
        assert!(unrestricted.matches_file("anything.rs"));
    }

    #[test]
    fn test_mode_validation_rejects_bad_slug() {
        let mode = ModeConfig {
            slug: "Bad Slug!".to_string(),
            name: "Bad".to_string(),
            role_definition: "role".to_string(),
            groups: vec![],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Global,
        };
        assert!(mode.validate().is_err());
    }

    #[test]
    fn test_mode_validation_rejects_duplicate_groups() {
        let mode = ModeConfig {
            slug: "dup".to_string(),
            name: "Dup".to_string(),
            role_definition: "role".to_string(),
            groups: vec![
                GroupEntry::Bare("read".to_string()),
                GroupEntry::Bare("read".to_string()),
            ],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Global,
        };
        assert!(mode.validate().is_err());
    }

    #[test]
    fn test_mode_validation_rejects_unknown_group() {
        let mode = ModeConfig {
            slug: "odd".to_string(),
            name: "Odd".to_string(),
            role_definition: "role".to_string(),
            groups: vec![GroupEntry::Bare("network".to_string())],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Project,
        };
        assert!(mode.validate().is_err());
    }

    #[test]
    fn test_mode_validation_rejects_bad_regex() {
        let mode = ModeConfig {
            slug: "badre".to_string(),
            name: "Bad Regex".to_string(),
            role_definition: "role".to_string(),
            groups: vec![GroupEntry::Restricted(
                "edit".to_string(),
                GroupOptions {
                    file_regex: Some("[unclosed".to_string()),
                    description: None,
                },
            )],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Project,
        };
        assert!(mode.validate().is_err());
    }

    #[test]
    fn test_can_edit_file() {
        let mode = ModeConfig {
            slug: "docs".to_string(),
            name: "Docs".to_string(),
            role_definition: "role".to_string(),
            groups: vec![GroupEntry::Restricted(
                "edit".to_string(),
                GroupOptions {
                    file_regex: Some("\\.md$".to_string()),
                    description: None,
                },
            )],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Builtin,
        };
        assert!(mode.can_edit_file("README.md"));
        assert!(!mode.can_edit_file("main.py"));

        let no_edit = ModeConfig {
            slug: "ro".to_string(),
            name: "Read Only".to_string(),
            role_definition: "role".to_string(),
            groups: vec![GroupEntry::Bare("read".to_string())],
            when_to_use: None,
            description: None,
            custom_instructions: None,
            source: ModeSource::Builtin,
        };
        assert!(!no_edit.can_edit_file("README.md"));
    }

    #[test]
    fn test_task_state_terminal() {
        assert!(!TaskState::Active.is_terminal());
        assert!(TaskState::Completed.is_terminal());
        assert!(TaskState::Failed.is_terminal());
        assert!(TaskState::Cancelled.is_terminal());
    }

    #[test]
    fn test_completion_status_roundtrip() {
        for status in [
            CompletionStatus::Completed,
            CompletionStatus::Failed,
            CompletionStatus::Cancelled,
        ] {
            let parsed = CompletionStatus::from_str(status.as_str()).unwrap();
            assert_eq!(status, parsed);
        }
        assert!(CompletionStatus::from_str("active").is_none());
    }

    #[test]
    fn test_task_new_is_active() {
        let task = Task::new("code", None);
        assert_eq!(task.state, TaskState::Active);
        assert_eq!(task.mode_slug, "code");
        assert!(task.task_id.starts_with("task_"));
        assert!(task.parent_task_id.is_none());
        assert!(task.messages.is_empty());
    }

    #[test]
    fn test_task_messages() {
        let mut task = Task::new("code", None);
        task.add_user_message("hello");
        task.add_system_message("switched");
        assert_eq!(task.messages.len(), 2);
        assert_eq!(task.messages[0].role, MessageRole::User);
        assert_eq!(task.messages[1].role, MessageRole::System);
    }

    #[test]
    fn test_mode_serialization_uses_camel_case() {
        let mode = ModeConfig {
            slug: "docs".to_string(),
            name: "Docs".to_string(),
            role_definition: "You write docs.".to_string(),
            groups: vec![GroupEntry::Bare("read".to_string())],
            when_to_use: Some("for documentation".to_string()),
            description: None,
            custom_instructions: None,
            source: ModeSource::Project,
        };
        let json = serde_json::to_string(&mode).unwrap();
        assert!(json.contains("\"roleDefinition\""));
        assert!(json.contains("\"whenToUse\""));
        assert!(json.contains("\"source\":\"project\""));
    }
}
