use crate::config::{DATE_FORMAT, TIME_FORMAT};
use crate::reminder::{Reminder, ReminderDraft};
use crate::scheduler::{TickReport, Transition};
use crate::storage::DueWindow;
use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "myco-reminders")]
#[command(about = "Recurring reminders for mushroom cultivation work")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a new reminder
    Add(AddArgs),

    /// List pending (or completed) reminders
    List {
        /// Show completed reminders instead of pending ones
        #[arg(long)]
        completed: bool,

        /// Only reminders scheduled in this window
        #[arg(long, value_enum, default_value_t = WindowArg::All)]
        window: WindowArg,
    },

    /// Mark a pending reminder as complete
    Complete { id: i64 },

    /// Delete a reminder
    Delete { id: i64 },

    /// Fire everything that is due right now, then exit
    Check,

    /// Keep checking for due reminders until interrupted
    Run,
}

#[derive(Args)]
pub struct AddArgs {
    /// What needs doing, e.g. "Shake jar GJ-0001"
    #[arg(long)]
    pub task: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// Due time (HH:MM)
    #[arg(long)]
    pub time: String,

    /// None, Daily, Weekly or Monthly
    #[arg(long, default_value = "None")]
    pub recurrence: String,

    /// Days, weeks or months between occurrences
    #[arg(long, default_value = "1")]
    pub interval: String,

    /// Last date the series may run to (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<String>,

    /// High, Medium or Low
    #[arg(long, default_value = "Medium")]
    pub priority: String,

    #[arg(long)]
    pub category: Option<String>,

    #[arg(long)]
    pub notes: Option<String>,

    /// Also email this address when the reminder fires
    #[arg(long)]
    pub email: Option<String>,

    /// Sound file to play when the reminder fires
    #[arg(long)]
    pub sound: Option<String>,
}

impl From<AddArgs> for ReminderDraft {
    fn from(args: AddArgs) -> Self {
        ReminderDraft {
            task: args.task,
            date: args.date,
            time: args.time,
            recurrence: args.recurrence,
            interval: args.interval,
            end_date: args.until.unwrap_or_default(),
            priority: args.priority,
            category: args.category.unwrap_or_default(),
            notes: args.notes.unwrap_or_default(),
            send_email: args.email.is_some(),
            email_address: args.email.unwrap_or_default(),
            sound_file: args.sound.unwrap_or_default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum WindowArg {
    All,
    Today,
    ThisWeek,
    NextWeek,
}

impl From<WindowArg> for DueWindow {
    fn from(arg: WindowArg) -> Self {
        match arg {
            WindowArg::All => DueWindow::All,
            WindowArg::Today => DueWindow::Today,
            WindowArg::ThisWeek => DueWindow::ThisWeek,
            WindowArg::NextWeek => DueWindow::NextWeek,
        }
    }
}

pub fn format_row(reminder: &Reminder) -> String {
    let mut row = format!(
        "#{:<4} {} {}  {:<6}  {}  [{}]",
        reminder.id,
        reminder.scheduled_date.format(DATE_FORMAT),
        reminder.scheduled_time.format(TIME_FORMAT),
        reminder.priority.to_string(),
        reminder.task,
        reminder.recurrence_description()
    );
    if let Some(category) = &reminder.category {
        row.push_str(&format!("  ({})", category));
    }
    row
}

pub fn print_report(report: &TickReport) {
    if report.is_empty() {
        println!("No reminders due.");
        return;
    }

    for firing in &report.fired {
        let outcome = match firing.transition {
            Transition::Completed => "completed".to_string(),
            Transition::SeriesEnded => "series finished".to_string(),
            Transition::Rescheduled(date) => format!("next on {}", date.format(DATE_FORMAT)),
        };
        println!("#{} {}: {}", firing.id, firing.task, outcome);
    }

    for (firing, channel, error) in report.delivery_failures() {
        eprintln!("#{} {}: {} not delivered: {}", firing.id, firing.task, channel, error);
    }

    for (id, error) in &report.store_failures {
        eprintln!("#{}: not saved, will retry: {}", id, error);
    }
}
