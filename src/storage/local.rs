use crate::error::AppResult;
use crate::reminder::Reminder;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk shape of the reminder data file
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ReminderFile {
    pub pending: Vec<Reminder>,
    pub completed: Vec<Reminder>,
}

impl ReminderFile {
    pub fn next_id(&self) -> i64 {
        let max_pending = self.pending.iter().map(|r| r.id).max().unwrap_or(0);
        let max_completed = self.completed.iter().map(|r| r.id).max().unwrap_or(0);
        max_pending.max(max_completed) + 1
    }

    pub fn find(&self, id: i64) -> Option<&Reminder> {
        self.pending
            .iter()
            .chain(self.completed.iter())
            .find(|r| r.id == id)
    }
}

/// Load reminders from the local JSON file
pub fn load_local(path: &Path) -> AppResult<ReminderFile> {
    if !path.exists() {
        return Ok(ReminderFile::default());
    }

    let content = fs::read_to_string(path)?;
    if content.trim().is_empty() {
        return Ok(ReminderFile::default());
    }

    Ok(serde_json::from_str(&content)?)
}

/// Save reminders to the local JSON file, replacing it atomically
pub fn save_local(path: &Path, data: &ReminderFile) -> AppResult<()> {
    let content = serde_json::to_string_pretty(data)?;
    let tmp_path = path.with_extension("json.tmp");
    fs::write(&tmp_path, content)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};

    #[test]
    fn test_load_nonexistent_returns_empty() {
        let temp_dir = tempfile::tempdir().unwrap();

        let store = load_local(&temp_dir.path().join("reminders.json")).unwrap();
        assert!(store.pending.is_empty());
        assert!(store.completed.is_empty());
    }

    #[test]
    fn test_save_and_load_keeps_records() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reminders.json");

        let mut reminder = Reminder::new(
            "Break and shake GJ-0002".to_string(),
            NaiveDate::from_ymd_opt(2024, 5, 4).unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
        );
        reminder.id = 1;
        let store = ReminderFile {
            pending: vec![reminder],
            completed: vec![],
        };

        save_local(&path, &store).unwrap();
        let loaded = load_local(&path).unwrap();

        assert_eq!(loaded, store);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_a_storage_error() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("reminders.json");
        fs::write(&path, "{ not json").unwrap();

        let err = load_local(&path).unwrap_err();
        assert!(matches!(err, crate::error::AppError::Storage(_)));
    }
}
