use crate::config::{DATE_FORMAT, TIME_FORMAT};
use crate::error::{AppError, AppResult};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::str::FromStr;

/// How often a reminder repeats. The interval counts days, weeks or months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "kind", content = "interval")]
pub enum Recurrence {
    #[default]
    None,
    Daily(NonZeroU32),
    Weekly(NonZeroU32),
    Monthly(NonZeroU32),
}

impl Recurrence {
    /// Build a recurrence from form input. The interval is ignored for `None`.
    pub fn from_parts(kind: &str, interval: &str) -> AppResult<Self> {
        let kind = kind.trim();
        if kind.is_empty() || kind.eq_ignore_ascii_case("none") {
            return Ok(Recurrence::None);
        }

        let interval = interval
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(NonZeroU32::new)
            .ok_or_else(|| {
                AppError::validation("Interval must be a positive number for recurring reminders.")
            })?;

        match kind.to_ascii_lowercase().as_str() {
            "daily" => Ok(Recurrence::Daily(interval)),
            "weekly" => Ok(Recurrence::Weekly(interval)),
            "monthly" => Ok(Recurrence::Monthly(interval)),
            other => Err(AppError::validation(format!(
                "Unknown recurrence '{}', expected None, Daily, Weekly or Monthly.",
                other
            ))),
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Recurrence::None)
    }

    pub fn interval(&self) -> Option<NonZeroU32> {
        match self {
            Recurrence::None => None,
            Recurrence::Daily(n) | Recurrence::Weekly(n) | Recurrence::Monthly(n) => Some(*n),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Recurrence::None => "None",
            Recurrence::Daily(_) => "Daily",
            Recurrence::Weekly(_) => "Weekly",
            Recurrence::Monthly(_) => "Monthly",
        }
    }

    fn unit(&self) -> &'static str {
        match self {
            Recurrence::None => "",
            Recurrence::Daily(_) => "day(s)",
            Recurrence::Weekly(_) => "week(s)",
            Recurrence::Monthly(_) => "month(s)",
        }
    }

    /// Human readable form, e.g. `Weekly every 2 week(s) until 2024-06-30`.
    pub fn describe(&self, end_date: Option<NaiveDate>) -> String {
        let Some(interval) = self.interval() else {
            return "None".to_string();
        };

        let mut text = format!("{} every {} {}", self.kind_name(), interval, self.unit());
        if let Some(end) = end_date {
            text.push_str(&format!(" until {}", end.format(DATE_FORMAT)));
        }
        text
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        };
        f.write_str(name)
    }
}

impl FromStr for Priority {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "low" => Ok(Priority::Low),
            other => Err(AppError::validation(format!(
                "Unknown priority '{}', expected High, Medium or Low.",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub task: String,
    /// Date of the next unfired occurrence
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    #[serde(default)]
    pub recurrence: Recurrence,
    #[serde(default)]
    pub recurrence_end_date: Option<NaiveDate>,
    #[serde(default)]
    pub priority: Priority,
    pub completed: bool,
    /// Reset to false whenever a recurring reminder rolls forward
    pub notified: bool,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub send_email: bool,
    #[serde(default)]
    pub email_address: Option<String>,
    #[serde(default)]
    pub sound_file: Option<PathBuf>,
    pub created_at: String,
}

impl Reminder {
    pub fn new(task: String, scheduled_date: NaiveDate, scheduled_time: NaiveTime) -> Self {
        Self {
            id: 0, // Will be set by storage
            task,
            scheduled_date,
            scheduled_time,
            recurrence: Recurrence::None,
            recurrence_end_date: None,
            priority: Priority::Medium,
            completed: false,
            notified: false,
            category: None,
            notes: None,
            send_email: false,
            email_address: None,
            sound_file: None,
            created_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn due_at(&self) -> NaiveDateTime {
        self.scheduled_date.and_time(self.scheduled_time)
    }

    pub fn is_due(&self, now: NaiveDateTime) -> bool {
        !self.completed && self.due_at() <= now
    }

    /// Address to email, if the email channel is switched on for this reminder.
    pub fn email_target(&self) -> Option<&str> {
        if !self.send_email {
            return None;
        }
        self.email_address
            .as_deref()
            .map(str::trim)
            .filter(|addr| !addr.is_empty())
    }

    pub fn recurrence_description(&self) -> String {
        self.recurrence.describe(self.recurrence_end_date)
    }
}

/// Raw reminder input as typed by the user, validated before anything is stored.
#[derive(Debug, Clone, Default)]
pub struct ReminderDraft {
    pub task: String,
    pub date: String,
    pub time: String,
    pub recurrence: String,
    pub interval: String,
    pub end_date: String,
    pub priority: String,
    pub category: String,
    pub notes: String,
    pub email_address: String,
    pub send_email: bool,
    pub sound_file: String,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

impl ReminderDraft {
    pub fn validate(self) -> AppResult<Reminder> {
        let task = self.task.trim();
        let date = self.date.trim();
        let time = self.time.trim();

        if task.is_empty() || date.is_empty() || time.is_empty() {
            return Err(AppError::validation("Task, Date, and Time are required."));
        }

        let scheduled_date = NaiveDate::parse_from_str(date, DATE_FORMAT);
        let scheduled_time = NaiveTime::parse_from_str(time, TIME_FORMAT);
        let (scheduled_date, scheduled_time) = match (scheduled_date, scheduled_time) {
            (Ok(d), Ok(t)) => (d, t),
            _ => {
                return Err(AppError::validation(
                    "Date format should be YYYY-MM-DD and Time HH:MM.",
                ))
            }
        };

        let recurrence = Recurrence::from_parts(&self.recurrence, &self.interval)?;

        let recurrence_end_date = match non_empty(&self.end_date) {
            Some(raw) => Some(NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(|_| {
                AppError::validation("Recurrence End Date format should be YYYY-MM-DD.")
            })?),
            None => None,
        };

        let priority = self.priority.parse::<Priority>()?;

        let email_address = non_empty(&self.email_address);
        if self.send_email {
            match email_address.as_deref() {
                Some(addr) if addr.contains('@') => {}
                Some(addr) => {
                    return Err(AppError::validation(format!(
                        "'{}' is not a valid email address.",
                        addr
                    )))
                }
                None => {
                    return Err(AppError::validation(
                        "An email address is required when email notification is enabled.",
                    ))
                }
            }
        }

        let mut reminder = Reminder::new(task.to_string(), scheduled_date, scheduled_time);
        reminder.recurrence = recurrence;
        reminder.recurrence_end_date = if recurrence.is_recurring() {
            recurrence_end_date
        } else {
            None
        };
        reminder.priority = priority;
        reminder.category = non_empty(&self.category);
        reminder.notes = non_empty(&self.notes);
        reminder.send_email = self.send_email;
        reminder.email_address = email_address;
        reminder.sound_file = non_empty(&self.sound_file).map(PathBuf::from);
        Ok(reminder)
    }
}
