use crate::reminder::Recurrence;
use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};

/// Next occurrence of a series after `reference`.
///
/// Monthly steps keep the day of month and clamp to the last day of the target
/// month (Jan 31 + 1 month is Feb 28/29, never Mar 2). Returns `None` for a
/// non-recurring reminder or when the result would leave chrono's date range.
pub fn next_occurrence(reference: NaiveDate, recurrence: Recurrence) -> Option<NaiveDate> {
    match recurrence {
        Recurrence::None => None,
        Recurrence::Daily(n) => reference.checked_add_days(Days::new(u64::from(n.get()))),
        Recurrence::Weekly(n) => reference.checked_add_days(Days::new(7 * u64::from(n.get()))),
        Recurrence::Monthly(n) => reference.checked_add_months(Months::new(n.get())),
    }
}

/// First occurrence whose due time at `time` is strictly after `after`,
/// stepping from `reference` one interval at a time.
pub fn first_occurrence_after(
    reference: NaiveDate,
    recurrence: Recurrence,
    time: NaiveTime,
    after: NaiveDateTime,
) -> Option<NaiveDate> {
    let mut next = next_occurrence(reference, recurrence)?;
    while next.and_time(time) <= after {
        next = next_occurrence(next, recurrence)?;
    }
    Some(next)
}
