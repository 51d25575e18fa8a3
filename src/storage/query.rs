use crate::reminder::Reminder;
use chrono::{Datelike, Days, NaiveDate};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Pending,
    Completed,
}

/// Inclusive range of scheduled dates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListFilter {
    pub status: Status,
    pub range: Option<DateRange>,
}

impl ListFilter {
    pub fn pending() -> Self {
        Self {
            status: Status::Pending,
            range: None,
        }
    }

    pub fn completed() -> Self {
        Self {
            status: Status::Completed,
            range: None,
        }
    }

    pub fn within(mut self, range: Option<DateRange>) -> Self {
        self.range = range;
        self
    }

    pub fn matches(&self, reminder: &Reminder) -> bool {
        let status = match self.status {
            Status::Pending => !reminder.completed,
            Status::Completed => reminder.completed,
        };
        status
            && self
                .range
                .map_or(true, |range| range.contains(reminder.scheduled_date))
    }
}

/// Preset date windows offered when browsing reminders. Weeks run Monday to Sunday.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DueWindow {
    #[default]
    All,
    Today,
    ThisWeek,
    NextWeek,
}

impl DueWindow {
    pub fn range(&self, today: NaiveDate) -> Option<DateRange> {
        let week_start =
            today - Days::new(u64::from(today.weekday().num_days_from_monday()));
        match self {
            DueWindow::All => None,
            DueWindow::Today => Some(DateRange::new(today, today)),
            DueWindow::ThisWeek => Some(DateRange::new(week_start, week_start + Days::new(6))),
            DueWindow::NextWeek => {
                let next_start = week_start + Days::new(7);
                Some(DateRange::new(next_start, next_start + Days::new(6)))
            }
        }
    }
}
