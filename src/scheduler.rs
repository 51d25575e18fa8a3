//! Periodic due-check for reminders.
//!
//! Each tick looks up the reminders due at the given moment, fires their
//! notifications and then either completes them or rolls them forward to the
//! next occurrence of their series.

use crate::error::{AppError, AppResult};
use crate::notify::{self, Channel, NotificationSink};
use crate::recurrence::{first_occurrence_after, next_occurrence};
use crate::reminder::Reminder;
use crate::storage::{ReminderPatch, ReminderStore};
use chrono::{Local, NaiveDate, NaiveDateTime};
use std::str::FromStr;
use std::thread;
use std::time::Duration;

/// What happens to a recurring reminder whose due time passed while the app was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CatchUpPolicy {
    /// Advance one interval per firing, so every missed occurrence fires on a later tick.
    #[default]
    EveryOccurrence,
    /// Fire once, then jump to the first occurrence after now.
    SkipMissed,
}

impl FromStr for CatchUpPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "every" | "every-occurrence" => Ok(CatchUpPolicy::EveryOccurrence),
            "skip" | "skip-missed" => Ok(CatchUpPolicy::SkipMissed),
            other => Err(AppError::config(format!(
                "Unknown catch-up policy '{}', expected 'every' or 'skip'",
                other
            ))),
        }
    }
}

/// State change applied to a reminder after it fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// One-off reminder done
    Completed,
    /// Recurring reminder whose next occurrence falls past its end date
    SeriesEnded,
    Rescheduled(NaiveDate),
}

impl Transition {
    pub fn patch(&self, reminder: &Reminder) -> ReminderPatch {
        match self {
            Transition::Completed | Transition::SeriesEnded => ReminderPatch::finished(),
            Transition::Rescheduled(date) => {
                ReminderPatch::rescheduled(*date, reminder.scheduled_time)
            }
        }
    }
}

/// Decide what a due reminder becomes once fired at `now`.
pub fn plan_transition(reminder: &Reminder, now: NaiveDateTime, policy: CatchUpPolicy) -> Transition {
    if !reminder.recurrence.is_recurring() {
        return Transition::Completed;
    }

    let next = match policy {
        CatchUpPolicy::EveryOccurrence => {
            next_occurrence(reminder.scheduled_date, reminder.recurrence)
        }
        CatchUpPolicy::SkipMissed => first_occurrence_after(
            reminder.scheduled_date,
            reminder.recurrence,
            reminder.scheduled_time,
            now,
        ),
    };

    match (next, reminder.recurrence_end_date) {
        (None, _) => Transition::SeriesEnded,
        (Some(next), Some(end)) if next > end => Transition::SeriesEnded,
        (Some(next), _) => Transition::Rescheduled(next),
    }
}

#[derive(Debug, Clone)]
pub struct Firing {
    pub id: i64,
    pub task: String,
    pub transition: Transition,
    pub delivery_failures: Vec<(Channel, AppError)>,
}

#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub fired: Vec<Firing>,
    /// Reminders whose state could not be saved; they stay due and retry next tick
    pub store_failures: Vec<(i64, AppError)>,
}

impl TickReport {
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty() && self.store_failures.is_empty()
    }

    pub fn delivery_failures(&self) -> impl Iterator<Item = (&Firing, &Channel, &AppError)> {
        self.fired.iter().flat_map(|firing| {
            firing
                .delivery_failures
                .iter()
                .map(move |(channel, error)| (firing, channel, error))
        })
    }
}

pub struct ReminderScheduler<N: NotificationSink> {
    sink: N,
    catch_up: CatchUpPolicy,
}

impl<N: NotificationSink> ReminderScheduler<N> {
    pub fn new(sink: N, catch_up: CatchUpPolicy) -> Self {
        Self { sink, catch_up }
    }

    /// The notifier alerts are dispatched through.
    pub fn sink(&self) -> &N {
        &self.sink
    }

    /// Fire everything due at `now`, oldest first.
    ///
    /// Fails only when the due list itself cannot be read. Delivery problems
    /// and per-reminder save failures are collected in the report.
    pub fn tick<S: ReminderStore + ?Sized>(
        &self,
        store: &mut S,
        now: NaiveDateTime,
    ) -> AppResult<TickReport> {
        let due = store.list_due(now)?;
        let mut report = TickReport::default();

        for reminder in due.into_iter().filter(|r| r.is_due(now)) {
            let delivery = notify::dispatch(&self.sink, &reminder);
            let transition = plan_transition(&reminder, now, self.catch_up);

            match store.update(reminder.id, &transition.patch(&reminder)) {
                Ok(_) => {
                    log::info!(
                        "Reminder {} ({}) fired: {:?}",
                        reminder.id,
                        reminder.task,
                        transition
                    );
                    report.fired.push(Firing {
                        id: reminder.id,
                        task: reminder.task,
                        transition,
                        delivery_failures: delivery.failures(),
                    });
                }
                Err(e) => {
                    log::error!("Failed to save reminder {} after firing: {}", reminder.id, e);
                    report.store_failures.push((reminder.id, e));
                }
            }
        }

        Ok(report)
    }

    /// Check on a fixed interval for the lifetime of the process.
    pub fn run_forever<S: ReminderStore + ?Sized>(&self, store: &mut S, interval: Duration) -> ! {
        log::info!("Reminder checks every {}s", interval.as_secs());
        loop {
            let now = Local::now().naive_local();
            match self.tick(store, now) {
                Ok(report) if !report.is_empty() => log::debug!(
                    "Tick at {}: {} fired, {} not saved",
                    now,
                    report.fired.len(),
                    report.store_failures.len()
                ),
                Ok(_) => {}
                Err(e) => log::error!("Reminder check failed: {}", e),
            }
            thread::sleep(interval);
        }
    }
}
