//! Saved report history
//!
//! Reports are stored newest first and capped at [`HISTORY_LIMIT`] entries.
//! The export pipeline never touches this module; callers load a report
//! here and hand the snapshot to the coordinator.

use crate::error::{RabError, RabResult};
use crate::types::{Report, ReportMetadata};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Maximum number of reports kept; older ones are dropped on save
pub const HISTORY_LIMIT: usize = 50;

/// Summary row of one saved report
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: String,
    pub saved_at: DateTime<Utc>,
    pub metadata: ReportMetadata,
    pub item_count: usize,
}

/// Storage for saved reports
pub trait ReportRepository {
    /// Store a report and return its new id
    fn save(&mut self, report: &Report) -> RabResult<String>;

    /// Saved reports, newest first
    fn list(&self) -> RabResult<Vec<HistoryEntry>>;

    /// Load a saved report by id
    fn load(&self, id: &str) -> RabResult<Report>;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredReport {
    id: String,
    saved_at: DateTime<Utc>,
    report: Report,
}

/// History kept in a single JSON file
#[derive(Debug, Clone)]
pub struct JsonFileRepository {
    path: PathBuf,
}

impl JsonFileRepository {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty history
    fn read_all(&self) -> RabResult<Vec<StoredReport>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&content).map_err(|e| {
            RabError::Parse(format!(
                "Invalid history file '{}': {}",
                self.path.display(),
                e
            ))
        })
    }

    fn write_all(&self, entries: &[StoredReport]) -> RabResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl ReportRepository for JsonFileRepository {
    fn save(&mut self, report: &Report) -> RabResult<String> {
        let mut entries = self.read_all()?;
        let id = uuid::Uuid::new_v4().to_string();

        entries.insert(
            0,
            StoredReport {
                id: id.clone(),
                saved_at: Utc::now(),
                report: report.clone(),
            },
        );
        entries.truncate(HISTORY_LIMIT);

        self.write_all(&entries)?;
        debug!(id = %id, entries = entries.len(), "saved report to history");
        Ok(id)
    }

    fn list(&self) -> RabResult<Vec<HistoryEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .map(|stored| HistoryEntry {
                item_count: stored.report.item_count(),
                metadata: stored.report.metadata,
                id: stored.id,
                saved_at: stored.saved_at,
            })
            .collect())
    }

    fn load(&self, id: &str) -> RabResult<Report> {
        self.read_all()?
            .into_iter()
            .find(|stored| stored.id == id)
            .map(|stored| stored.report)
            .ok_or_else(|| RabError::NotFound(format!("No saved report with id '{}'", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::LineItem;
    use tempfile::TempDir;

    fn report(title: &str) -> Report {
        let mut report = Report::new(ReportMetadata::new(title, "2025-01-15"));
        report.add_item(LineItem::new("Material", "Semen", 2.0, "sak", 65000.0));
        report
    }

    #[test]
    fn test_missing_file_is_empty() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("history.json"));
        assert!(repo.list().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = JsonFileRepository::new(temp_dir.path().join("history.json"));

        let id = repo.save(&report("Proyek A")).unwrap();
        let loaded = repo.load(&id).unwrap();
        assert_eq!(loaded, report("Proyek A"));
    }

    #[test]
    fn test_list_newest_first() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = JsonFileRepository::new(temp_dir.path().join("history.json"));

        repo.save(&report("Lama")).unwrap();
        let newest = repo.save(&report("Baru")).unwrap();

        let entries = repo.list().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, newest);
        assert_eq!(entries[0].metadata.title, "Baru");
        assert_eq!(entries[0].item_count, 1);
        assert_eq!(entries[1].metadata.title, "Lama");
    }

    #[test]
    fn test_history_capped() {
        let temp_dir = TempDir::new().unwrap();
        let mut repo = JsonFileRepository::new(temp_dir.path().join("history.json"));

        let first = repo.save(&report("0")).unwrap();
        for i in 1..=HISTORY_LIMIT {
            repo.save(&report(&i.to_string())).unwrap();
        }

        let entries = repo.list().unwrap();
        assert_eq!(entries.len(), HISTORY_LIMIT);
        assert!(matches!(repo.load(&first), Err(RabError::NotFound(_))));
    }

    #[test]
    fn test_load_unknown_id() {
        let temp_dir = TempDir::new().unwrap();
        let repo = JsonFileRepository::new(temp_dir.path().join("history.json"));
        assert!(matches!(repo.load("nope"), Err(RabError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("history.json");
        std::fs::write(&path, "{not json").unwrap();

        let repo = JsonFileRepository::new(&path);
        assert!(matches!(repo.list(), Err(RabError::Parse(_))));
    }
}
