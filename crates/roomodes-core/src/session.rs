//! Session management.
//!
//! A session is the client-visible handle that owns exactly one task.
//! Sessions expire after an idle timeout; a background sweeper removes
//! expired entries. The session table and the task-id index are kept in
//! lock-step under a single lock, which the sweeper shares with request
//! handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ModeError;
use crate::orchestrator::TaskOrchestrator;

/// Default idle timeout: one hour.
pub const DEFAULT_SESSION_TIMEOUT: Duration = Duration::from_secs(3600);
/// Default sweep interval: five minutes.
pub const DEFAULT_CLEANUP_INTERVAL: Duration = Duration::from_secs(300);

/// A client-facing handle bound to a single task.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub session_id: String,
    pub task_id: String,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    fn new(task_id: &str) -> Self {
        let now = Utc::now();
        Session {
            session_id: format!("ses_{}", Uuid::new_v4().simple()),
            task_id: task_id.to_string(),
            created_at: now,
            last_activity: now,
        }
    }

    pub fn age_seconds(&self) -> i64 {
        (Utc::now() - self.created_at).num_seconds()
    }

    pub fn idle_seconds(&self) -> i64 {
        (Utc::now() - self.last_activity).num_seconds()
    }

    pub fn is_expired(&self, timeout: Duration) -> bool {
        let idle = Utc::now() - self.last_activity;
        idle > chrono::Duration::from_std(timeout).unwrap_or(chrono::Duration::MAX)
    }
}

#[derive(Default)]
struct Tables {
    sessions: HashMap<String, Session>,
    task_index: HashMap<String, String>,
}

/// Summary counters exposed for diagnostics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStats {
    pub total_sessions: usize,
    pub timeout_seconds: u64,
    pub cleanup_interval_seconds: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub oldest_session_age_seconds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_idle_seconds: Option<i64>,
}

/// Owns the session table and the idle-expiry sweeper.
pub struct SessionManager {
    orchestrator: Arc<TaskOrchestrator>,
    timeout: Duration,
    cleanup_interval: Duration,
    tables: RwLock<Tables>,
    sweeper: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl SessionManager {
    pub fn new(
        orchestrator: Arc<TaskOrchestrator>,
        timeout: Duration,
        cleanup_interval: Duration,
    ) -> Self {
        Self {
            orchestrator,
            timeout,
            cleanup_interval,
            tables: RwLock::new(Tables::default()),
            sweeper: Mutex::new(None),
        }
    }

    pub fn orchestrator(&self) -> &Arc<TaskOrchestrator> {
        &self.orchestrator
    }

    /// Create a session owning the given task.
    pub fn create_session(&self, task_id: &str) -> Session {
        let session = Session::new(task_id);
        let mut tables = self.tables.write().unwrap();
        tables
            .task_index
            .insert(task_id.to_string(), session.session_id.clone());
        tables
            .sessions
            .insert(session.session_id.clone(), session.clone());
        info!(session_id = %session.session_id, task_id = %task_id, "Session created");
        session
    }

    /// Look up a session, touching its activity timestamp.
    ///
    /// An unknown id yields `TaskNotFound`; a known-but-idle-expired id is
    /// removed on observation and yields `SessionExpired`.
    pub fn resolve(&self, session_id: &str) -> Result<Session, ModeError> {
        let expired_task_id = {
            let mut tables = self.tables.write().unwrap();
            let expired = match tables.sessions.get(session_id) {
                None => return Err(ModeError::TaskNotFound(session_id.to_string())),
                Some(session) => session.is_expired(self.timeout),
            };
            if !expired {
                let session = tables.sessions.get_mut(session_id).unwrap();
                session.last_activity = Utc::now();
                return Ok(session.clone());
            }
            let session = tables.sessions.remove(session_id).unwrap();
            tables.task_index.remove(&session.task_id);
            session.task_id
        };
        info!(session_id = %session_id, "Session expired");
        self.orchestrator.remove_task(&expired_task_id);
        Err(ModeError::SessionExpired(session_id.to_string()))
    }

    /// Session id currently bound to a task, if any.
    pub fn get_session_by_task(&self, task_id: &str) -> Option<Session> {
        let session_id = {
            let tables = self.tables.read().unwrap();
            tables.task_index.get(task_id).cloned()
        }?;
        self.resolve(&session_id).ok()
    }

    pub fn list_sessions(&self) -> Vec<Session> {
        self.tables
            .read()
            .unwrap()
            .sessions
            .values()
            .cloned()
            .collect()
    }

    pub fn session_count(&self) -> usize {
        self.tables.read().unwrap().sessions.len()
    }

    /// Remove a session and the task it owns.
    pub fn destroy_session(&self, session_id: &str) -> bool {
        let task_id = {
            let mut tables = self.tables.write().unwrap();
            match tables.sessions.remove(session_id) {
                None => return false,
                Some(session) => {
                    tables.task_index.remove(&session.task_id);
                    session.task_id
                }
            }
        };
        self.orchestrator.remove_task(&task_id);
        info!(session_id = %session_id, "Session destroyed");
        true
    }

    /// Remove every expired session. Returns how many were removed.
    pub fn sweep_expired(&self) -> usize {
        let removed: Vec<(String, String)> = {
            let mut tables = self.tables.write().unwrap();
            let expired: Vec<String> = tables
                .sessions
                .values()
                .filter(|s| s.is_expired(self.timeout))
                .map(|s| s.session_id.clone())
                .collect();
            expired
                .into_iter()
                .filter_map(|session_id| {
                    tables.sessions.remove(&session_id).map(|session| {
                        tables.task_index.remove(&session.task_id);
                        (session_id, session.task_id)
                    })
                })
                .collect()
        };

        for (_, task_id) in &removed {
            self.orchestrator.remove_task(task_id);
        }
        if !removed.is_empty() {
            info!(count = removed.len(), "Swept expired sessions");
        }
        removed.len()
    }

    /// Remove all sessions (shutdown path).
    pub fn cleanup_all(&self) {
        let task_ids: Vec<String> = {
            let mut tables = self.tables.write().unwrap();
            let ids = tables
                .sessions
                .values()
                .map(|s| s.task_id.clone())
                .collect();
            tables.sessions.clear();
            tables.task_index.clear();
            ids
        };
        for task_id in &task_ids {
            self.orchestrator.remove_task(task_id);
        }
        if !task_ids.is_empty() {
            info!(count = task_ids.len(), "Cleaned up all sessions");
        }
    }

    /// Start the background sweeper. Idempotent.
    pub fn start(self: &Arc<Self>) {
        let mut guard = self.sweeper.lock().unwrap();
        if guard.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        let interval = self.cleanup_interval;
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it.
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let swept = manager.sweep_expired();
                if swept > 0 {
                    debug!(count = swept, "Sweeper pass removed sessions");
                }
            }
        });
        *guard = Some(handle);
        info!(
            interval_secs = interval.as_secs(),
            timeout_secs = self.timeout.as_secs(),
            "Session sweeper started"
        );
    }

    /// Stop the background sweeper.
    pub fn stop(&self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
            info!("Session sweeper stopped");
        }
    }

    pub fn stats(&self) -> SessionStats {
        let tables = self.tables.read().unwrap();
        let ages: Vec<i64> = tables.sessions.values().map(|s| s.age_seconds()).collect();
        let idles: Vec<i64> = tables.sessions.values().map(|s| s.idle_seconds()).collect();
        SessionStats {
            total_sessions: tables.sessions.len(),
            timeout_seconds: self.timeout.as_secs(),
            cleanup_interval_seconds: self.cleanup_interval.as_secs(),
            oldest_session_age_seconds: ages.iter().max().copied(),
            max_idle_seconds: idles.iter().max().copied(),
        }
    }
}

impl Drop for SessionManager {
    fn drop(&mut self) {
        if let Some(handle) = self.sweeper.lock().unwrap().take() {
            handle.abort();
        }
    }
}
