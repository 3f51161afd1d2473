//! roo-modes-server - MCP stdio server for the mode-governed task system.
//!
//! Intended to be launched by an MCP client (editor, desktop assistant,
//! custom agent). Speaks JSON-RPC 2.0 over newline-delimited stdin/stdout;
//! all logging goes to stderr or a log file, never stdout.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use roomodes_core::{
    ModeRegistry, ServerConfig, SessionManager, TaskOrchestrator, ToolCatalog,
};
use roomodes_mcp::{McpServer, ModesHandler};

#[derive(Debug, Parser)]
#[command(
    name = "roo-modes-server",
    about = "MCP server exposing a mode-governed task system",
    version
)]
struct Cli {
    /// Project root directory (enables loading of the project `.roomodes` file)
    #[arg(long)]
    project_root: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Global configuration directory (default: ~/.roo-code)
    #[arg(long)]
    config_dir: Option<PathBuf>,

    /// Session idle timeout in seconds (default: 3600)
    #[arg(long)]
    session_timeout: Option<u64>,

    /// Session cleanup interval in seconds (default: 300)
    #[arg(long)]
    cleanup_interval: Option<u64>,

    /// Logging level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,

    /// Log file path (defaults to stderr)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn build_config(cli: &Cli) -> Result<ServerConfig> {
    let mut config = ServerConfig::default();

    if let Some(path) = &cli.config {
        config
            .apply_file(path)
            .with_context(|| format!("failed to load config file: {}", path.display()))?;
    }
    config.apply_env();

    if let Some(root) = &cli.project_root {
        config.project_root = Some(root.clone());
    }
    if let Some(dir) = &cli.config_dir {
        config.config_dir = dir.clone();
    }
    if let Some(timeout) = cli.session_timeout {
        config.session_timeout = timeout;
    }
    if let Some(interval) = cli.cleanup_interval {
        config.cleanup_interval = interval;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(file) = &cli.log_file {
        config.log_file = Some(file.clone());
    }

    config.validate()?;
    Ok(config)
}

fn init_tracing(config: &ServerConfig) -> Result<()> {
    // RUST_LOG wins over the configured level.
    let level = std::env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    let filter = tracing_subscriber::EnvFilter::try_new(&level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match &config.log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).ok();
            }
            let file = std::fs::File::create(path)
                .with_context(|| format!("failed to open log file: {}", path.display()))?;
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(Arc::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

async fn run() -> Result<()> {
    let cli = Cli::parse();
    let config = build_config(&cli)?;
    init_tracing(&config)?;

    info!(
        project_root = ?config.project_root,
        config_dir = ?config.config_dir,
        session_timeout = config.session_timeout,
        cleanup_interval = config.cleanup_interval,
        "Starting roo-modes-server"
    );

    let registry = Arc::new(ModeRegistry::load(
        config.project_root.as_deref(),
        &config.config_dir,
    ));
    let orchestrator = Arc::new(TaskOrchestrator::new(
        Arc::clone(&registry),
        ToolCatalog::standard(),
    ));
    let sessions = Arc::new(SessionManager::new(
        orchestrator,
        Duration::from_secs(config.session_timeout),
        Duration::from_secs(config.cleanup_interval),
    ));
    sessions.start();

    let handler = ModesHandler::new(registry, sessions);
    let mut server = McpServer::new(handler);
    server.run().await?;

    info!("Server exited normally");
    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}
