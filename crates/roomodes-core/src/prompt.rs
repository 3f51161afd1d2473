//! System-prompt rendering.
//!
//! Pure function from a mode definition to the prompt text served at
//! `mode://{slug}/system_prompt`.

use crate::types::ModeConfig;

/// Render the system prompt for a mode.
pub fn render_system_prompt(mode: &ModeConfig) -> String {
    let mut parts = vec![mode.role_definition.clone()];

    if let Some(instructions) = &mode.custom_instructions {
        parts.push(format!("\n\n## Mode Instructions\n\n{}", instructions));
    }

    if let Some(when) = &mode.when_to_use {
        parts.push(format!("\n\n## When to Use This Mode\n\n{}", when));
    }

    if !mode.groups.is_empty() {
        let groups: Vec<String> = mode
            .groups
            .iter()
            .map(|entry| match entry.options().and_then(|o| o.file_regex.as_ref()) {
                Some(pattern) => format!("{} (restricted to: {})", entry.name(), pattern),
                None => entry.name().to_string(),
            })
            .collect();
        parts.push(format!(
            "\n\n## Available Tool Groups\n\n{}",
            groups.join(", ")
        ));
    }

    parts.concat()
}
