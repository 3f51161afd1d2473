//! MCP resources exposing modes.
//!
//! Every mode contributes three resources: the full mode document, a
//! structured config document, and the rendered system prompt.
//!
//! URI grammar: `mode://{slug}` | `mode://{slug}/config` |
//! `mode://{slug}/system_prompt`.

use serde_json::{json, Value};

use roomodes_core::types::VALID_TOOL_GROUPS;
use roomodes_core::{render_system_prompt, ModeConfig, ModeError, ModeRegistry, SourceFilter};

/// Resource descriptors for every loaded mode.
pub fn list_resources(registry: &ModeRegistry) -> Vec<Value> {
    let mut resources = Vec::new();
    for mode in registry.list(SourceFilter::All) {
        resources.push(json!({
            "uri": format!("mode://{}", mode.slug),
            "name": mode.name,
            "mimeType": "application/json",
            "description": mode
                .description
                .clone()
                .unwrap_or_else(|| format!("Full configuration for {}", mode.name)),
        }));
        resources.push(json!({
            "uri": format!("mode://{}/config", mode.slug),
            "name": format!("{} - Configuration", mode.name),
            "mimeType": "application/json",
            "description": format!("Structured configuration for {}", mode.name),
        }));
        resources.push(json!({
            "uri": format!("mode://{}/system_prompt", mode.slug),
            "name": format!("{} - System Prompt", mode.name),
            "mimeType": "text/plain",
            "description": format!("System prompt for {}", mode.name),
        }));
    }
    resources
}

/// Read one mode resource by URI.
pub fn read_resource(registry: &ModeRegistry, uri: &str) -> Result<Value, ModeError> {
    let rest = uri.strip_prefix("mode://").ok_or_else(|| {
        ModeError::Validation(format!("unsupported URI scheme: {}", uri))
    })?;

    let (slug, subresource) = match rest.split_once('/') {
        Some((slug, sub)) => (slug, Some(sub)),
        None => (rest, None),
    };
    if slug.is_empty() {
        return Err(ModeError::Validation("mode slug is required in URI".to_string()));
    }

    let mode = registry
        .get(slug)
        .ok_or_else(|| ModeError::ModeNotFound(slug.to_string()))?;

    let (text, mime_type) = match subresource {
        None => (serialize_mode_full(mode), "application/json"),
        Some("config") => (serialize_mode_config(mode), "application/json"),
        Some("system_prompt") => (render_system_prompt(mode), "text/plain"),
        Some(other) => {
            return Err(ModeError::Validation(format!(
                "unknown subresource: {} (valid: config, system_prompt)",
                other
            )))
        }
    };

    Ok(json!({
        "contents": [{
            "uri": uri,
            "mimeType": mime_type,
            "text": text,
        }]
    }))
}

/// Structured config document, mirroring the mode file format.
fn serialize_mode_config(mode: &ModeConfig) -> String {
    let groups: Vec<Value> = mode
        .groups
        .iter()
        .map(|entry| match entry.options() {
            None => json!(entry.name()),
            Some(options) => {
                let mut opts = serde_json::Map::new();
                if let Some(pattern) = &options.file_regex {
                    opts.insert("fileRegex".to_string(), json!(pattern));
                }
                if let Some(desc) = &options.description {
                    opts.insert("description".to_string(), json!(desc));
                }
                json!([entry.name(), opts])
            }
        })
        .collect();

    let mut config = json!({
        "slug": mode.slug,
        "name": mode.name,
        "source": mode.source.as_str(),
        "groups": groups,
    });
    if let Some(description) = &mode.description {
        config["description"] = json!(description);
    }
    if let Some(when) = &mode.when_to_use {
        config["when_to_use"] = json!(when);
    }

    serde_json::to_string_pretty(&config).unwrap_or_else(|e| json!({"error": e.to_string()}).to_string())
}

/// Full mode document with per-group capability details.
fn serialize_mode_full(mode: &ModeConfig) -> String {
    let mut tool_groups = serde_json::Map::new();
    for group in VALID_TOOL_GROUPS {
        let enabled = mode.is_group_enabled(group);
        let mut entry = serde_json::Map::new();
        entry.insert("enabled".to_string(), json!(enabled));
        if enabled {
            if let Some(options) = mode.group_options(group) {
                if let Some(pattern) = &options.file_regex {
                    entry.insert("file_regex".to_string(), json!(pattern));
                }
                if let Some(desc) = &options.description {
                    entry.insert("description".to_string(), json!(desc));
                }
            }
        }
        tool_groups.insert(group.to_string(), Value::Object(entry));
    }

    let data = json!({
        "slug": mode.slug,
        "name": mode.name,
        "source": mode.source.as_str(),
        "description": mode.description,
        "when_to_use": mode.when_to_use,
        "role_definition": mode.role_definition,
        "custom_instructions": mode.custom_instructions,
        "tool_groups": tool_groups,
    });

    serde_json::to_string_pretty(&data).unwrap_or_else(|e| json!({"error": e.to_string()}).to_string())
}
