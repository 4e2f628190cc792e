use chrono::Utc;
use std::collections::HashMap;
use crate::errors::HunterError;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use crate::models::finding::{Confidence, Finding, FindingRecord, Severity};
use crate::models::target::TaskStatus;
use super::targets::transition;
use super::{StatusUpdate, Store};
use tracing::warn;

impl Store {
    /// Record a finding against an existing target. A finding whose url has
    /// no target row is dropped: creating one here could hide a scope
    /// violation. Returns the new finding id, or None when dropped.
    pub fn add_finding(
        &self,
        target_url: &str,
        tool: &str,
        severity: Severity,
        description: &str,
        confidence: Confidence,
    ) -> Result<Option<i64>, HunterError> {
        self.insert_finding(target_url, tool, severity, description, confidence, None)
    }

    /// Persist an adapter-produced finding, keeping its raw output.
    pub fn record_finding(&self, finding: &FindingRecord) -> Result<Option<i64>, HunterError> {
        self.insert_finding(
            &finding.target,
            &finding.tool,
            finding.severity,
            &finding.description,
            finding.confidence,
            finding.raw_output.as_deref(),
        )
    }

    fn insert_finding(
        &self,
        target_url: &str,
        tool: &str,
        severity: Severity,
        description: &str,
        confidence: Confidence,
        raw_output: Option<&str>,
    ) -> Result<Option<i64>, HunterError> {
        self.with_connection(|conn| {
            insert_finding(conn, target_url, tool, severity, description, confidence, raw_output)
        })
    }

    /// Persist everything a scan unit found and mark its target completed,
    /// in one write transaction. On error nothing is written and the target
    /// keeps its current status. Returns how many findings were stored.
    pub fn complete_with_findings(
        &self,
        url: &str,
        findings: &[FindingRecord],
        stage: &str,
    ) -> Result<(usize, StatusUpdate), HunterError> {
        self.with_connection(|conn| {
            let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
                .map_err(|e| HunterError::Store(format!("Failed to begin transaction: {}", e)))?;

            let mut stored = 0;
            for finding in findings {
                let id = insert_finding(
                    &tx,
                    &finding.target,
                    &finding.tool,
                    finding.severity,
                    &finding.description,
                    finding.confidence,
                    finding.raw_output.as_deref(),
                )?;
                if id.is_some() {
                    stored += 1;
                }
            }
            let update = transition(&tx, url, TaskStatus::Completed, Some(stage))?;

            tx.commit()
                .map_err(|e| HunterError::Store(format!("Failed to commit findings: {}", e)))?;
            Ok((stored, update))
        })
    }

    /// Findings for one target, most severe first.
    pub fn get_findings(&self, target_url: &str) -> Result<Vec<Finding>, HunterError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT f.id, f.target_id, f.tool, f.severity, f.description, f.confidence, f.raw_output FROM findings f JOIN targets t ON t.id = f.target_id WHERE t.url = ?1 ORDER BY CASE f.severity WHEN 'CRITICAL' THEN 0 WHEN 'HIGH' THEN 1 WHEN 'MEDIUM' THEN 2 WHEN 'LOW' THEN 3 WHEN 'INFO' THEN 4 ELSE 5 END, f.id"
            ).map_err(|e| HunterError::Store(format!("Query failed: {}", e)))?;

            let rows = stmt.query_map(rusqlite::params![target_url], |row: &rusqlite::Row| {
                let severity_str: String = row.get(3)?;
                let confidence_str: String = row.get(5)?;
                Ok(Finding {
                    id: row.get(0)?,
                    target_id: row.get(1)?,
                    tool: row.get(2)?,
                    severity: Severity::parse(&severity_str).unwrap_or(Severity::Info),
                    description: row.get(4)?,
                    confidence: Confidence::parse(&confidence_str).unwrap_or(Confidence::Low),
                    raw_output: row.get(6)?,
                })
            }).map_err(|e| HunterError::Store(format!("Query error: {}", e)))?;

            let mut findings = Vec::new();
            for row in rows {
                findings.push(row.map_err(|e| HunterError::Store(format!("Row error: {}", e)))?);
            }
            Ok(findings)
        })
    }

    pub fn count_findings_by_severity(&self) -> Result<HashMap<Severity, usize>, HunterError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare("SELECT severity, COUNT(*) FROM findings GROUP BY severity")
                .map_err(|e| HunterError::Store(format!("Query failed: {}", e)))?;
            let rows = stmt.query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            }).map_err(|e| HunterError::Store(format!("Query error: {}", e)))?;

            let mut counts = HashMap::new();
            for row in rows {
                let (severity, count) = row.map_err(|e| HunterError::Store(format!("Row error: {}", e)))?;
                if let Some(severity) = Severity::parse(&severity) {
                    *counts.entry(severity).or_insert(0) += count as usize;
                }
            }
            Ok(counts)
        })
    }
}

fn insert_finding(
    conn: &Connection,
    target_url: &str,
    tool: &str,
    severity: Severity,
    description: &str,
    confidence: Confidence,
    raw_output: Option<&str>,
) -> Result<Option<i64>, HunterError> {
    let target_id: i64 = match conn.query_row(
        "SELECT id FROM targets WHERE url = ?1",
        rusqlite::params![target_url],
        |row| row.get(0),
    ) {
        Ok(id) => id,
        Err(rusqlite::Error::QueryReturnedNoRows) => {
            warn!(url = %target_url, tool = %tool, "Orphaned finding dropped");
            return Ok(None);
        }
        Err(e) => return Err(HunterError::Store(format!("Query error: {}", e))),
    };

    conn.execute(
        "INSERT INTO findings (target_id, tool, severity, description, confidence, raw_output, created_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        rusqlite::params![
            target_id,
            tool,
            severity.as_str(),
            description,
            confidence.as_str(),
            raw_output,
            Utc::now().to_rfc3339(),
        ],
    ).map_err(|e| HunterError::Store(format!("Failed to insert finding: {}", e)))?;
    Ok(Some(conn.last_insert_rowid()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DEFAULT_BUSY_TIMEOUT;
    use tempfile::TempDir;

    fn temp_store() -> (TempDir, Store) {
        let dir = TempDir::new().unwrap();
        let store = Store::open(dir.path().join("state.db"), DEFAULT_BUSY_TIMEOUT).unwrap();
        (dir, store)
    }

    #[test]
    fn test_add_and_get_findings() {
        let (_dir, store) = temp_store();
        store.add_target("https://a.example.com/search?q=1", "dynamic").unwrap();

        let id = store.add_finding(
            "https://a.example.com/search?q=1",
            "sqlmap",
            Severity::Critical,
            "SQL Injection Detected",
            Confidence::High,
        ).unwrap();
        assert!(id.is_some());

        let findings = store.get_findings("https://a.example.com/search?q=1").unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].tool, "sqlmap");
        assert_eq!(findings[0].severity, Severity::Critical);
        assert_eq!(findings[0].confidence, Confidence::High);
    }

    #[test]
    fn test_orphan_finding_is_dropped_without_creating_target() {
        let (_dir, store) = temp_store();
        let id = store.add_finding(
            "https://out-of-scope.example.net/",
            "nuclei",
            Severity::High,
            "Exposed panel",
            Confidence::Low,
        ).unwrap();
        assert!(id.is_none());
        assert!(store.get_target("https://out-of-scope.example.net/").unwrap().is_none());
        assert!(store.count_findings_by_severity().unwrap().is_empty());
    }

    #[test]
    fn test_record_finding_keeps_raw_output() {
        let (_dir, store) = temp_store();
        store.add_target("https://a.example.com/app.js", "js_file").unwrap();
        let record = FindingRecord::new("nuclei", "https://a.example.com/app.js", Severity::Medium, "AWS key")
            .with_raw_output("AKIA...");
        store.record_finding(&record).unwrap();

        let findings = store.get_findings("https://a.example.com/app.js").unwrap();
        assert_eq!(findings[0].raw_output.as_deref(), Some("AKIA..."));
    }

    #[test]
    fn test_findings_ordered_by_severity() {
        let (_dir, store) = temp_store();
        let url = "https://a.example.com/";
        store.add_target(url, "static").unwrap();
        store.add_finding(url, "nuclei", Severity::Low, "low", Confidence::Low).unwrap();
        store.add_finding(url, "nuclei", Severity::Critical, "crit", Confidence::Low).unwrap();
        store.add_finding(url, "nuclei", Severity::High, "high", Confidence::Low).unwrap();

        let findings = store.get_findings(url).unwrap();
        let severities: Vec<Severity> = findings.iter().map(|f| f.severity).collect();
        assert_eq!(severities, vec![Severity::Critical, Severity::High, Severity::Low]);

        let counts = store.count_findings_by_severity().unwrap();
        assert_eq!(counts.get(&Severity::High), Some(&1));
        assert_eq!(counts.values().sum::<usize>(), 3);
    }

    #[test]
    fn test_completion_stores_findings_and_status_together() {
        let (_dir, store) = temp_store();
        let url = "https://a.example.com/item.php?id=1";
        store.add_target(url, "dynamic").unwrap();
        store.update_task_status(url, TaskStatus::Processing, None).unwrap();

        let records = vec![
            FindingRecord::new("sqlmap", url, Severity::Critical, "SQL Injection Detected"),
            FindingRecord::new("dalfox", url, Severity::High, "XSS"),
            FindingRecord::new("dalfox", "https://elsewhere.example.com/", Severity::High, "XSS"),
        ];
        let (stored, update) = store.complete_with_findings(url, &records, "scanned").unwrap();
        assert_eq!(stored, 2);
        assert_eq!(update, StatusUpdate::Applied);

        let target = store.get_target(url).unwrap().unwrap();
        assert_eq!(target.status, TaskStatus::Completed);
        assert_eq!(target.stage, "scanned");
        assert_eq!(store.get_findings(url).unwrap().len(), 2);
    }

    #[test]
    fn test_completion_under_write_lock_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.db");
        let timeout = std::time::Duration::from_millis(100);
        let store = Store::open(&path, timeout).unwrap();
        let url = "https://a.example.com/item.php?id=1";
        store.add_target(url, "dynamic").unwrap();
        store.update_task_status(url, TaskStatus::Processing, None).unwrap();

        let holder = Connection::open(&path).unwrap();
        holder.execute_batch("BEGIN IMMEDIATE").unwrap();

        let records = vec![FindingRecord::new("sqlmap", url, Severity::Critical, "SQL Injection Detected")];
        let started = std::time::Instant::now();
        let err = store.complete_with_findings(url, &records, "scanned").unwrap_err();
        assert!(matches!(err, HunterError::Store(_)));
        assert!(started.elapsed() >= std::time::Duration::from_millis(90));

        holder.execute_batch("COMMIT").unwrap();
        assert!(store.get_findings(url).unwrap().is_empty());
        assert_eq!(store.get_target(url).unwrap().unwrap().status, TaskStatus::Processing);

        let (stored, _) = store.complete_with_findings(url, &records, "scanned").unwrap();
        assert_eq!(stored, 1);
        assert_eq!(store.get_target(url).unwrap().unwrap().status, TaskStatus::Completed);
    }
}
