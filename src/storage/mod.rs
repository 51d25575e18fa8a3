mod local;
pub mod query;

use crate::error::{AppError, AppResult};
use crate::reminder::Reminder;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use fs2::FileExt;
use local::ReminderFile;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

pub use query::{DateRange, DueWindow, ListFilter, Status};

/// Fields of a stored reminder that may change after creation
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReminderPatch {
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
    pub completed: Option<bool>,
    pub notified: Option<bool>,
}

impl ReminderPatch {
    /// The occurrence fired and nothing follows it.
    pub fn finished() -> Self {
        Self {
            completed: Some(true),
            notified: Some(true),
            ..Default::default()
        }
    }

    /// Move a recurring reminder to its next occurrence.
    pub fn rescheduled(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            scheduled_date: Some(date),
            scheduled_time: Some(time),
            notified: Some(false),
            ..Default::default()
        }
    }

    pub fn mark_completed() -> Self {
        Self {
            completed: Some(true),
            ..Default::default()
        }
    }

    pub fn apply(&self, reminder: &mut Reminder) {
        if let Some(date) = self.scheduled_date {
            reminder.scheduled_date = date;
        }
        if let Some(time) = self.scheduled_time {
            reminder.scheduled_time = time;
        }
        if let Some(completed) = self.completed {
            reminder.completed = completed;
        }
        if let Some(notified) = self.notified {
            reminder.notified = notified;
        }
    }
}

/// Record store for reminders.
///
/// `list` and `list_due` return reminders ordered by their due timestamp.
pub trait ReminderStore {
    /// Persist a new reminder and return its assigned id.
    fn insert(&mut self, reminder: Reminder) -> AppResult<i64>;

    fn get(&self, id: i64) -> AppResult<Reminder>;

    /// Pending reminders due at or before `as_of`.
    fn list_due(&self, as_of: NaiveDateTime) -> AppResult<Vec<Reminder>>;

    fn update(&mut self, id: i64, patch: &ReminderPatch) -> AppResult<Reminder>;

    fn delete(&mut self, id: i64) -> AppResult<()>;

    fn list(&self, filter: &ListFilter) -> AppResult<Vec<Reminder>>;

    /// Manually mark a pending reminder as done.
    fn complete(&mut self, id: i64) -> AppResult<Reminder> {
        if self.get(id)?.completed {
            return Err(AppError::validation(
                "Cannot mark completed reminders as complete.",
            ));
        }
        self.update(id, &ReminderPatch::mark_completed())
    }
}

fn sort_by_due(reminders: &mut [Reminder]) {
    reminders.sort_by(|a, b| a.due_at().cmp(&b.due_at()).then(a.id.cmp(&b.id)));
}

/// Reminder store persisted as a JSON file in the app data directory.
///
/// Nothing is cached between calls: every read loads the file and every
/// write reloads it before applying the change, so a long-running `run` loop
/// sees reminders added or removed by other invocations of the CLI.
pub struct Storage {
    data_path: PathBuf,
}

impl Storage {
    /// Open (or create) the data file at `data_path`.
    pub fn open(data_path: impl Into<PathBuf>) -> AppResult<Self> {
        let data_path = data_path.into();
        if let Some(dir) = data_path.parent() {
            fs::create_dir_all(dir)?;
        }

        let data = local::load_local(&data_path)?;
        log::info!(
            "Loaded {} pending, {} completed reminders from {}",
            data.pending.len(),
            data.completed.len(),
            data_path.display()
        );

        Ok(Self { data_path })
    }

    fn load(&self) -> AppResult<ReminderFile> {
        local::load_local(&self.data_path)
    }

    /// Apply `change` to the current file contents and write them back while
    /// holding an exclusive lock on `<data file>.lock`. Nothing is written when
    /// `change` fails.
    fn commit<T>(&self, change: impl FnOnce(&mut ReminderFile) -> AppResult<T>) -> AppResult<T> {
        let lock = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.data_path.with_extension("json.lock"))?;
        lock.lock_exclusive()?;

        let result = self.load().and_then(|mut data| {
            let value = change(&mut data)?;
            local::save_local(&self.data_path, &data)?;
            Ok(value)
        });

        if let Err(e) = lock.unlock() {
            log::warn!("Failed to release lock on {}: {}", self.data_path.display(), e);
        }
        result
    }
}

impl ReminderStore for Storage {
    fn insert(&mut self, mut reminder: Reminder) -> AppResult<i64> {
        let id = self.commit(move |data| {
            reminder.id = data.next_id();
            let id = reminder.id;
            if reminder.completed {
                data.completed.push(reminder);
            } else {
                data.pending.push(reminder);
            }
            Ok(id)
        })?;

        log::debug!("Inserted reminder {}", id);
        Ok(id)
    }

    fn get(&self, id: i64) -> AppResult<Reminder> {
        self.load()?
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::not_found(id))
    }

    fn list_due(&self, as_of: NaiveDateTime) -> AppResult<Vec<Reminder>> {
        let mut due: Vec<Reminder> = self
            .load()?
            .pending
            .into_iter()
            .filter(|r| r.is_due(as_of))
            .collect();
        sort_by_due(&mut due);
        Ok(due)
    }

    fn update(&mut self, id: i64, patch: &ReminderPatch) -> AppResult<Reminder> {
        self.commit(|data| {
            let mut reminder = if let Some(pos) = data.pending.iter().position(|r| r.id == id) {
                data.pending.remove(pos)
            } else if let Some(pos) = data.completed.iter().position(|r| r.id == id) {
                data.completed.remove(pos)
            } else {
                return Err(AppError::not_found(id));
            };

            patch.apply(&mut reminder);
            let updated = reminder.clone();
            if reminder.completed {
                data.completed.push(reminder);
            } else {
                data.pending.push(reminder);
            }
            Ok(updated)
        })
    }

    fn delete(&mut self, id: i64) -> AppResult<()> {
        self.commit(|data| {
            if data.find(id).is_none() {
                return Err(AppError::not_found(id));
            }
            data.pending.retain(|r| r.id != id);
            data.completed.retain(|r| r.id != id);
            Ok(())
        })
    }

    fn list(&self, filter: &ListFilter) -> AppResult<Vec<Reminder>> {
        let data = self.load()?;
        let source = match filter.status {
            Status::Pending => data.pending,
            Status::Completed => data.completed,
        };

        let mut reminders: Vec<Reminder> =
            source.into_iter().filter(|r| filter.matches(r)).collect();
        sort_by_due(&mut reminders);
        Ok(reminders)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DATA_FILE_NAME;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn reminder(task: &str, d: NaiveDate, t: NaiveTime) -> Reminder {
        Reminder::new(task.to_string(), d, t)
    }

    fn open_temp() -> (tempfile::TempDir, Storage) {
        let dir = tempfile::tempdir().unwrap();
        let storage = Storage::open(dir.path().join(DATA_FILE_NAME)).unwrap();
        (dir, storage)
    }

    #[test]
    fn test_insert_assigns_sequential_ids() {
        let (_dir, mut storage) = open_temp();

        let a = storage.insert(reminder("A", date(2024, 1, 1), time(9, 0))).unwrap();
        let b = storage.insert(reminder("B", date(2024, 1, 2), time(9, 0))).unwrap();

        assert_eq!(a, 1);
        assert_eq!(b, 2);
        assert_eq!(storage.get(b).unwrap().task, "B");
    }

    #[test]
    fn test_list_due_orders_by_timestamp_and_skips_future() {
        let (_dir, mut storage) = open_temp();
        storage.insert(reminder("late", date(2024, 3, 1), time(10, 0))).unwrap();
        storage.insert(reminder("early", date(2024, 2, 28), time(23, 0))).unwrap();
        storage.insert(reminder("same day", date(2024, 3, 1), time(8, 0))).unwrap();
        storage.insert(reminder("future", date(2024, 3, 1), time(12, 0))).unwrap();

        let due = storage.list_due(date(2024, 3, 1).and_time(time(10, 0))).unwrap();
        let tasks: Vec<&str> = due.iter().map(|r| r.task.as_str()).collect();

        assert_eq!(tasks, vec!["early", "same day", "late"]);
    }

    #[test]
    fn test_completed_reminders_are_never_due() {
        let (_dir, mut storage) = open_temp();
        let id = storage.insert(reminder("done", date(2024, 1, 1), time(9, 0))).unwrap();
        storage.update(id, &ReminderPatch::finished()).unwrap();

        let due = storage.list_due(date(2030, 1, 1).and_time(time(0, 0))).unwrap();
        assert!(due.is_empty());

        let completed = storage.list(&ListFilter::completed()).unwrap();
        assert_eq!(completed.len(), 1);
        assert!(completed[0].completed && completed[0].notified);
    }

    #[test]
    fn test_update_reschedules_in_place() {
        let (_dir, mut storage) = open_temp();
        let id = storage.insert(reminder("shake", date(2024, 1, 31), time(9, 0))).unwrap();
        storage
            .update(id, &ReminderPatch { notified: Some(true), ..Default::default() })
            .unwrap();

        let updated = storage
            .update(id, &ReminderPatch::rescheduled(date(2024, 2, 29), time(9, 0)))
            .unwrap();

        assert_eq!(updated.scheduled_date, date(2024, 2, 29));
        assert!(!updated.notified);
        assert!(!updated.completed);
        assert_eq!(storage.list(&ListFilter::pending()).unwrap().len(), 1);
    }

    #[test]
    fn test_manual_complete_and_double_complete() {
        let (_dir, mut storage) = open_temp();
        let id = storage.insert(reminder("mist tub", date(2024, 1, 1), time(9, 0))).unwrap();

        let done = storage.complete(id).unwrap();
        assert!(done.completed);

        let err = storage.complete(id).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn test_unknown_ids_are_not_found() {
        let (_dir, mut storage) = open_temp();

        assert!(matches!(storage.get(42), Err(AppError::NotFound(42))));
        assert!(matches!(storage.delete(42), Err(AppError::NotFound(42))));
        assert!(matches!(
            storage.update(42, &ReminderPatch::finished()),
            Err(AppError::NotFound(42))
        ));
        assert!(matches!(storage.complete(42), Err(AppError::NotFound(42))));
    }

    #[test]
    fn test_delete_removes_from_either_list() {
        let (_dir, mut storage) = open_temp();
        let a = storage.insert(reminder("A", date(2024, 1, 1), time(9, 0))).unwrap();
        let b = storage.insert(reminder("B", date(2024, 1, 1), time(9, 0))).unwrap();
        storage.complete(b).unwrap();

        storage.delete(a).unwrap();
        storage.delete(b).unwrap();

        assert!(storage.list(&ListFilter::pending()).unwrap().is_empty());
        assert!(storage.list(&ListFilter::completed()).unwrap().is_empty());
    }

    #[test]
    fn test_list_with_date_range() {
        let (_dir, mut storage) = open_temp();
        storage.insert(reminder("mon", date(2024, 3, 11), time(9, 0))).unwrap();
        storage.insert(reminder("next mon", date(2024, 3, 18), time(9, 0))).unwrap();

        let filter = ListFilter::pending().within(DueWindow::ThisWeek.range(date(2024, 3, 13)));
        let listed = storage.list(&filter).unwrap();

        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].task, "mon");
    }

    #[test]
    fn test_reopen_reads_saved_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);

        let id = {
            let mut storage = Storage::open(&path).unwrap();
            storage.insert(reminder("persist me", date(2024, 6, 1), time(6, 0))).unwrap()
        };

        let storage = Storage::open(&path).unwrap();
        assert_eq!(storage.get(id).unwrap().task, "persist me");
    }

    #[test]
    fn test_handles_see_each_others_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);
        let mut first = Storage::open(&path).unwrap();
        let mut second = Storage::open(&path).unwrap();

        let a = first.insert(reminder("A", date(2024, 1, 1), time(9, 0))).unwrap();
        let b = second.insert(reminder("B", date(2024, 1, 2), time(9, 0))).unwrap();
        assert_eq!(b, a + 1);

        first.complete(b).unwrap();
        second.delete(a).unwrap();

        assert!(first.list(&ListFilter::pending()).unwrap().is_empty());
        assert!(matches!(first.get(a), Err(AppError::NotFound(_))));
        assert!(second.get(b).unwrap().completed);
    }

    #[test]
    fn test_concurrent_writers_keep_every_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);

        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let mut storage = Storage::open(&path).unwrap();
                    for n in 0..5 {
                        let task = format!("jar {}-{}", worker, n);
                        storage.insert(reminder(&task, date(2024, 1, 1), time(9, 0))).unwrap();
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let storage = Storage::open(&path).unwrap();
        let mut ids: Vec<i64> = storage
            .list(&ListFilter::pending())
            .unwrap()
            .iter()
            .map(|r| r.id)
            .collect();
        ids.sort();
        assert_eq!(ids, (1..=20).collect::<Vec<i64>>());
    }

    #[test]
    fn test_failed_save_leaves_data_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);
        let mut storage = Storage::open(&path).unwrap();
        let id = storage.insert(reminder("A", date(2024, 1, 1), time(9, 0))).unwrap();

        // A directory in place of the temp file makes the write fail.
        fs::create_dir_all(path.with_extension("json.tmp")).unwrap();

        let err = storage.update(id, &ReminderPatch::finished()).unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
        assert!(!storage.get(id).unwrap().completed);
    }
}
