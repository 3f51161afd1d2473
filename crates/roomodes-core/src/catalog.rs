//! Tool catalog: the static table mapping tool names to tool groups.
//!
//! The catalog marks which tools are edit-class (take a `file_path` argument
//! subject to the mode's file regex) and which are always available
//! regardless of mode restrictions. It is fixed at startup.

use std::collections::HashMap;

/// How a tool relates to the mode system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolEntry {
    /// Tool group this tool belongs to. `None` means always available.
    pub group: Option<String>,
    /// Edit-class tools consume a file path checked against the mode regex.
    pub edit_class: bool,
}

/// Lookup table from tool name to group membership.
pub struct ToolCatalog {
    entries: HashMap<String, ToolEntry>,
}

impl ToolCatalog {
    /// The standard catalog for the built-in agent tool set.
    pub fn standard() -> Self {
        let mut entries = HashMap::new();
        let mut add = |name: &str, group: Option<&str>, edit_class: bool| {
            entries.insert(
                name.to_string(),
                ToolEntry {
                    group: group.map(|g| g.to_string()),
                    edit_class,
                },
            );
        };

        add("read_file", Some("read"), false);
        add("list_files", Some("read"), false);
        add("list_code_definition_names", Some("read"), false);
        add("search_files", Some("read"), false);

        add("write_to_file", Some("edit"), true);
        add("apply_diff", Some("edit"), true);
        add("insert_content", Some("edit"), true);

        add("browser_action", Some("browser"), false);
        add("execute_command", Some("command"), false);

        add("use_mcp_tool", Some("mcp"), false);
        add("access_mcp_resource", Some("mcp"), false);

        add("switch_mode", Some("modes"), false);
        add("new_task", Some("modes"), false);

        // Bookkeeping tools ignore mode restrictions entirely.
        add("ask_followup_question", None, false);
        add("attempt_completion", None, false);
        add("update_todo_list", None, false);

        Self { entries }
    }

    /// Build a catalog from an explicit table (for alternative tool sets).
    pub fn new(entries: HashMap<String, ToolEntry>) -> Self {
        Self { entries }
    }

    pub fn known_tool(&self, tool_name: &str) -> bool {
        self.entries.contains_key(tool_name)
    }

    /// The group a tool belongs to, if it is group-gated.
    pub fn group_of(&self, tool_name: &str) -> Option<&str> {
        self.entries
            .get(tool_name)
            .and_then(|entry| entry.group.as_deref())
    }

    pub fn is_edit_class(&self, tool_name: &str) -> bool {
        self.entries
            .get(tool_name)
            .map(|entry| entry.edit_class)
            .unwrap_or(false)
    }

    pub fn is_always_available(&self, tool_name: &str) -> bool {
        self.entries
            .get(tool_name)
            .map(|entry| entry.group.is_none())
            .unwrap_or(false)
    }
}
