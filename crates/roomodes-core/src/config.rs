//! Server configuration.
//!
//! The config surface is closed: project root, config directory, session
//! timeout, cleanup interval and logging destination. Values overlay in the
//! order defaults < config file < environment < CLI flags.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

/// Default global config directory name under the home directory.
const DEFAULT_CONFIG_DIR_NAME: &str = ".roo-code";

/// Runtime configuration for the server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub project_root: Option<PathBuf>,
    pub config_dir: PathBuf,
    /// Session idle timeout, seconds.
    pub session_timeout: u64,
    /// Sweeper interval, seconds.
    pub cleanup_interval: u64,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let config_dir = dirs::home_dir()
            .map(|home| home.join(DEFAULT_CONFIG_DIR_NAME))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR_NAME));
        ServerConfig {
            project_root: None,
            config_dir,
            session_timeout: 3600,
            cleanup_interval: 300,
            log_level: "info".to_string(),
            log_file: None,
        }
    }
}

/// On-disk config file shape (JSON). All sections optional.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    paths: PathsSection,
    #[serde(default)]
    sessions: SessionsSection,
    #[serde(default)]
    logging: LoggingSection,
}

#[derive(Debug, Default, Deserialize)]
struct PathsSection {
    project_root: Option<PathBuf>,
    config_dir: Option<PathBuf>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionsSection {
    timeout: Option<u64>,
    cleanup_interval: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    file: Option<PathBuf>,
}

impl ServerConfig {
    /// Overlay values from a JSON config file.
    pub fn apply_file(&mut self, path: &Path) -> anyhow::Result<()> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = serde_json::from_str(&content)?;

        if let Some(root) = file.paths.project_root {
            self.project_root = Some(root);
        }
        if let Some(dir) = file.paths.config_dir {
            self.config_dir = dir;
        }
        if let Some(timeout) = file.sessions.timeout {
            self.session_timeout = timeout;
        }
        if let Some(interval) = file.sessions.cleanup_interval {
            self.cleanup_interval = interval;
        }
        if let Some(level) = file.logging.level {
            self.log_level = level;
        }
        if let Some(log_file) = file.logging.file {
            self.log_file = Some(log_file);
        }
        Ok(())
    }

    /// Overlay values from `ROO_*` environment variables.
    pub fn apply_env(&mut self) {
        if let Ok(root) = std::env::var("ROO_PROJECT_ROOT") {
            if !root.is_empty() {
                self.project_root = Some(PathBuf::from(root));
            }
        }
        if let Ok(dir) = std::env::var("ROO_CONFIG_DIR") {
            if !dir.is_empty() {
                self.config_dir = PathBuf::from(dir);
            }
        }
        if let Ok(value) = std::env::var("ROO_SESSION_TIMEOUT") {
            match value.parse::<u64>() {
                Ok(secs) => self.session_timeout = secs,
                Err(_) => warn!(value = %value, "Invalid ROO_SESSION_TIMEOUT, keeping default"),
            }
        }
        if let Ok(value) = std::env::var("ROO_CLEANUP_INTERVAL") {
            match value.parse::<u64>() {
                Ok(secs) => self.cleanup_interval = secs,
                Err(_) => warn!(value = %value, "Invalid ROO_CLEANUP_INTERVAL, keeping default"),
            }
        }
        if let Ok(level) = std::env::var("ROO_LOG_LEVEL") {
            if !level.is_empty() {
                self.log_level = level;
            }
        }
        if let Ok(file) = std::env::var("ROO_LOG_FILE") {
            if !file.is_empty() {
                self.log_file = Some(PathBuf::from(file));
            }
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.session_timeout == 0 {
            anyhow::bail!("session timeout must be positive");
        }
        if self.cleanup_interval == 0 {
            anyhow::bail!("cleanup interval must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.session_timeout, 3600);
        assert_eq!(config.cleanup_interval, 300);
        assert_eq!(config.log_level, "info");
        assert!(config.project_root.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_apply_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(
            &path,
            r#"{
                "paths": {"project_root": "/tmp/proj"},
                "sessions": {"timeout": 120, "cleanup_interval": 10},
                "logging": {"level": "debug"}
            }"#,
        )
        .unwrap();

        let mut config = ServerConfig::default();
        config.apply_file(&path).unwrap();
        assert_eq!(config.project_root.as_deref(), Some(Path::new("/tmp/proj")));
        assert_eq!(config.session_timeout, 120);
        assert_eq!(config.cleanup_interval, 10);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_apply_file_partial_sections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"sessions": {"timeout": 42}}"#).unwrap();

        let mut config = ServerConfig::default();
        config.apply_file(&path).unwrap();
        assert_eq!(config.session_timeout, 42);
        assert_eq!(config.cleanup_interval, 300);
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = ServerConfig {
            session_timeout: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());

        let config = ServerConfig {
            cleanup_interval: 0,
            ..ServerConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
