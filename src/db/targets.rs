use chrono::Utc;
use rusqlite::Connection;
use std::collections::HashMap;
use crate::errors::HunterError;
use crate::models::target::{Target, TaskStatus};
use super::Store;
use tracing::{debug, warn};

/// Outcome of a status update. None of these are errors: an unknown url or
/// a backwards transition is logged and left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusUpdate {
    Applied,
    UnknownTarget,
    Rejected { current: TaskStatus },
}

fn row_to_target(row: &rusqlite::Row) -> rusqlite::Result<Target> {
    let status_str: String = row.get(2)?;
    Ok(Target {
        id: row.get(0)?,
        url: row.get(1)?,
        status: TaskStatus::parse(&status_str).unwrap_or(TaskStatus::Pending),
        stage: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl Store {
    /// Insert a pending target. Returns false when the url already exists.
    pub fn add_target(&self, url: &str, stage: &str) -> Result<bool, HunterError> {
        self.with_connection(|conn| {
            let now = Utc::now().to_rfc3339();
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO targets (url, status, stage, created_at, updated_at) VALUES (?1, 'pending', ?2, ?3, ?3)",
                rusqlite::params![url, stage, now],
            ).map_err(|e| HunterError::Store(format!("Failed to add target: {}", e)))?;
            Ok(inserted > 0)
        })
    }

    /// Up to `limit` pending targets in insertion order.
    pub fn get_pending_tasks(&self, limit: usize) -> Result<Vec<Target>, HunterError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, url, status, stage, created_at, updated_at FROM targets WHERE status = 'pending' ORDER BY id LIMIT ?1"
            ).map_err(|e| HunterError::Store(format!("Query failed: {}", e)))?;

            let rows = stmt.query_map(rusqlite::params![limit as i64], row_to_target)
                .map_err(|e| HunterError::Store(format!("Query error: {}", e)))?;

            let mut targets = Vec::new();
            for row in rows {
                targets.push(row.map_err(|e| HunterError::Store(format!("Row error: {}", e)))?);
            }
            Ok(targets)
        })
    }

    /// Move a target forward in its lifecycle, optionally relabelling its
    /// stage. Transitions that would move a target backwards are refused.
    pub fn update_task_status(
        &self,
        url: &str,
        status: TaskStatus,
        stage: Option<&str>,
    ) -> Result<StatusUpdate, HunterError> {
        self.with_connection(|conn| transition(conn, url, status, stage))
    }

    pub fn get_target(&self, url: &str) -> Result<Option<Target>, HunterError> {
        self.with_connection(|conn| {
            let result = conn.query_row(
                "SELECT id, url, status, stage, created_at, updated_at FROM targets WHERE url = ?1",
                rusqlite::params![url],
                row_to_target,
            );
            match result {
                Ok(t) => Ok(Some(t)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(HunterError::Store(format!("Query error: {}", e))),
            }
        })
    }

    pub fn count_targets_by_status(&self) -> Result<HashMap<TaskStatus, usize>, HunterError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT status, COUNT(*) FROM targets GROUP BY status")
                .map_err(|e| HunterError::Store(format!("Query failed: {}", e)))?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            }).map_err(|e| HunterError::Store(format!("Query error: {}", e)))?;

            let mut counts = HashMap::new();
            for row in rows {
                let (status, count) = row.map_err(|e| HunterError::Store(format!("Row error: {}", e)))?;
                if let Some(status) = TaskStatus::parse(&status) {
                    counts.insert(status, count as usize);
                }
            }
            Ok(counts)
        })
    }
}

pub(super) fn transition(
    conn: &Connection,
    url: &str,
    status: TaskStatus,
    stage: Option<&str>,
) -> Result<StatusUpdate, HunterError> {
    let predecessors = status
        .allowed_predecessors()
        .iter()
        .map(|s| format!("'{}'", s.as_str()))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "UPDATE targets SET status = ?2, stage = COALESCE(?3, stage), updated_at = ?4 WHERE url = ?1 AND status IN ({})",
        predecessors
    );
    let now = Utc::now().to_rfc3339();
    let affected = conn.execute(&sql, rusqlite::params![url, status.as_str(), stage, now])
        .map_err(|e| HunterError::Store(format!("Update failed: {}", e)))?;
    if affected > 0 {
        return Ok(StatusUpdate::Applied);
    }

    let current: Option<String> = match conn.query_row(
        "SELECT status FROM targets WHERE url = ?1",
        rusqlite::params![url],
        |row| row.get(0),
    ) {
        Ok(s) => Some(s),
        Err(rusqlite::Error::QueryReturnedNoRows) => None,
        Err(e) => return Err(HunterError::Store(format!("Query error: {}", e))),
    };

    match current.as_deref().and_then(TaskStatus::parse) {
        None => {
            warn!(url = %url, status = %status, "Status update for unknown target ignored");
            Ok(StatusUpdate::UnknownTarget)
        }
        Some(current) => {
            debug!(url = %url, current = %current, requested = %status, "Status transition refused");
            Ok(StatusUpdate::Rejected { current })
        }
    }
}
