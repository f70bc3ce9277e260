//! Backup files: export the program to JSON, import it back

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::model::WorkoutState;
use crate::sanitize::sanitize;

pub const BACKUP_VERSION: &str = "2.0";

#[derive(Debug, thiserror::Error)]
pub enum BackupError {
    #[error("Lecture/écriture du fichier impossible : {0}")]
    Io(#[from] std::io::Error),
    #[error("Fichier JSON invalide : {0}")]
    Json(#[from] serde_json::Error),
    #[error("Format de sauvegarde invalide")]
    InvalidFormat,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BackupFile<'a> {
    workouts: &'a WorkoutState,
    export_date: DateTime<Utc>,
    version: &'static str,
}

/// workout-backup-YYYY-MM-DD.json
pub fn backup_file_name(now: DateTime<Utc>) -> String {
    format!("workout-backup-{}.json", now.format("%Y-%m-%d"))
}

pub fn to_backup_json(state: &WorkoutState, now: DateTime<Utc>) -> Result<String, BackupError> {
    let file = BackupFile {
        workouts: state,
        export_date: now,
        version: BACKUP_VERSION,
    };
    Ok(serde_json::to_string_pretty(&file)?)
}

/// Write a backup into `dir`, returns the file path
pub fn export_to(dir: &Path, state: &WorkoutState, now: DateTime<Utc>) -> Result<PathBuf, BackupError> {
    let path = dir.join(backup_file_name(now));
    std::fs::write(&path, to_backup_json(state, now)?)?;
    info!("Exported program to {}", path.display());
    Ok(path)
}

/// Parse backup text. A top-level `workouts` object is required.
pub fn parse_backup(text: &str) -> Result<WorkoutState, BackupError> {
    let value: Value = serde_json::from_str(text)?;
    match value.get("workouts") {
        Some(workouts @ Value::Object(_)) => Ok(sanitize(workouts)),
        _ => {
            warn!("Backup rejected: no workouts object");
            Err(BackupError::InvalidFormat)
        }
    }
}

pub fn import_from(path: &Path) -> Result<WorkoutState, BackupError> {
    let text = std::fs::read_to_string(path)?;
    parse_backup(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::seed::seed_state;
    use crate::workbook::Workbook;
    use chrono::TimeZone;

    #[test]
    fn test_file_name() {
        let now = Utc.with_ymd_and_hms(2025, 6, 9, 23, 59, 0).unwrap();
        assert_eq!(backup_file_name(now), "workout-backup-2025-06-09.json");
    }

    #[test]
    fn test_export_shape() {
        let json = to_backup_json(&seed_state(), Utc::now()).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["version"], "2.0");
        assert!(value["exportDate"].is_string());
        assert!(value["workouts"]["days"]["Lundi"].is_object());
    }

    #[test]
    fn test_export_then_import() {
        let dir = tempfile::tempdir().unwrap();
        let path = export_to(dir.path(), &seed_state(), Utc::now()).unwrap();
        assert!(path.file_name().unwrap().to_str().unwrap().starts_with("workout-backup-"));
        assert_eq!(import_from(&path).unwrap(), seed_state());
    }

    #[test]
    fn test_legacy_day_map_accepted() {
        let text = r#"{"workouts": {"Mardi": {"categories": {"Dos": [{"name": "Tractions"}]}}}}"#;
        let state = parse_backup(text).unwrap();
        assert_eq!(state.day_order, vec!["Mardi"]);
        assert_eq!(state.days["Mardi"].categories["Dos"][0].name, "Tractions");
    }

    #[test]
    fn test_invalid_backups_rejected() {
        assert!(matches!(parse_backup("not json"), Err(BackupError::Json(_))));
        assert!(matches!(parse_backup("[]"), Err(BackupError::InvalidFormat)));
        assert!(matches!(parse_backup(r#"{"workouts": 3}"#), Err(BackupError::InvalidFormat)));
        assert!(matches!(parse_backup(r#"{"data": {}}"#), Err(BackupError::InvalidFormat)));
    }

    #[test]
    fn test_failed_import_leaves_workbook_unchanged() {
        let mut book = Workbook::new(seed_state());
        if let Ok(state) = parse_backup(r#"{"nope": true}"#) {
            book.import(state);
        }
        assert_eq!(book.state(), &seed_state());
        assert!(!book.timeline().can_undo());
    }
}
