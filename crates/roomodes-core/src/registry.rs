//! Mode registry with multi-source loading and precedence.
//!
//! Modes come from three sources: the built-in set, a global `modes.yaml`
//! under the user config directory, and a `.roomodes` file at the project
//! root. On slug collision, project > global > builtin. The registry is
//! read-only after load and freely shareable.

use std::collections::HashMap;
use std::path::Path;

use tracing::{debug, warn};

use crate::builtin::builtin_modes;
use crate::types::{ModeConfig, ModeSource, ModesFile};

/// Filter for `ModeRegistry::list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFilter {
    Builtin,
    Global,
    Project,
    All,
}

impl SourceFilter {
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "builtin" => Some(SourceFilter::Builtin),
            "global" => Some(SourceFilter::Global),
            "project" => Some(SourceFilter::Project),
            "all" => Some(SourceFilter::All),
            _ => None,
        }
    }

    fn accepts(&self, source: ModeSource) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Builtin => source == ModeSource::Builtin,
            SourceFilter::Global => source == ModeSource::Global,
            SourceFilter::Project => source == ModeSource::Project,
        }
    }
}

/// Immutable collection of loaded modes.
pub struct ModeRegistry {
    modes: HashMap<String, ModeConfig>,
}

impl ModeRegistry {
    pub const GLOBAL_MODES_FILENAME: &'static str = "modes.yaml";
    pub const PROJECT_MODES_FILENAME: &'static str = ".roomodes";

    /// Load modes from all sources with precedence project > global > builtin.
    pub fn load(project_root: Option<&Path>, config_dir: &Path) -> Self {
        let mut modes: HashMap<String, ModeConfig> = HashMap::new();

        for mode in builtin_modes() {
            modes.insert(mode.slug.clone(), mode);
        }

        let global_path = config_dir.join(Self::GLOBAL_MODES_FILENAME);
        for mode in load_modes_file(&global_path, ModeSource::Global) {
            modes.insert(mode.slug.clone(), mode);
        }

        if let Some(root) = project_root {
            let project_path = root.join(Self::PROJECT_MODES_FILENAME);
            for mode in load_modes_file(&project_path, ModeSource::Project) {
                modes.insert(mode.slug.clone(), mode);
            }
        }

        debug!(count = modes.len(), "Modes loaded");
        Self { modes }
    }

    /// Build a registry from an explicit mode list (used by tests).
    pub fn from_modes(list: Vec<ModeConfig>) -> Self {
        let mut modes = HashMap::new();
        for mode in list {
            modes.insert(mode.slug.clone(), mode);
        }
        Self { modes }
    }

    /// Constant-time lookup by slug.
    pub fn get(&self, slug: &str) -> Option<&ModeConfig> {
        self.modes.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.modes.contains_key(slug)
    }

    /// List modes for a source filter. Order is deterministic: project, then
    /// global, then builtin; lexicographic by slug within each source.
    pub fn list(&self, filter: SourceFilter) -> Vec<&ModeConfig> {
        let mut result: Vec<&ModeConfig> = Vec::new();
        for source in [ModeSource::Project, ModeSource::Global, ModeSource::Builtin] {
            if !filter.accepts(source) {
                continue;
            }
            let mut group: Vec<&ModeConfig> =
                self.modes.values().filter(|m| m.source == source).collect();
            group.sort_by(|a, b| a.slug.cmp(&b.slug));
            result.extend(group);
        }
        result
    }

    /// All known slugs, in list order. Used in error messages.
    pub fn slugs(&self) -> Vec<&str> {
        self.list(SourceFilter::All)
            .into_iter()
            .map(|m| m.slug.as_str())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

/// Load modes from a YAML file. A missing file contributes nothing; a
/// malformed file logs a warning and contributes nothing; a bad entry is
/// skipped without poisoning the rest.
fn load_modes_file(path: &Path, source: ModeSource) -> Vec<ModeConfig> {
    if !path.exists() {
        return Vec::new();
    }

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = ?path, error = %e, "Failed to read mode file");
            return Vec::new();
        }
    };
    let content = content.strip_prefix('\u{feff}').unwrap_or(&content);

    let file: ModesFile = match serde_yaml::from_str(content) {
        Ok(file) => file,
        Err(e) => {
            warn!(path = ?path, error = %e, "Failed to parse mode file");
            return Vec::new();
        }
    };

    let mut modes = Vec::new();
    for raw in file.custom_modes {
        let mut mode: ModeConfig = match serde_yaml::from_value(raw) {
            Ok(mode) => mode,
            Err(e) => {
                warn!(path = ?path, error = %e, "Skipping malformed mode entry");
                continue;
            }
        };
        mode.source = source;
        if let Err(e) = mode.validate() {
            warn!(path = ?path, error = %e, "Skipping invalid mode entry");
            continue;
        }
        modes.push(mode);
    }

    debug!(path = ?path, count = modes.len(), source = source.as_str(), "Mode file loaded");
    modes
}
