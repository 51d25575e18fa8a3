mod cli;
pub mod config;
pub mod email;
pub mod error;
pub mod notify;
pub mod recurrence;
pub mod reminder;
pub mod scheduler;
pub mod storage;

use chrono::{Local, NaiveDate};
use clap::Parser;
use cli::{Cli, Command};
use config::Settings;
use email::SmtpMailer;
use notify::DesktopNotifier;

pub use error::{AppError, AppResult};
pub use recurrence::next_occurrence;
pub use reminder::{Priority, Recurrence, Reminder, ReminderDraft};
pub use scheduler::{CatchUpPolicy, ReminderScheduler, TickReport, Transition};
pub use storage::{DueWindow, ListFilter, ReminderPatch, ReminderStore, Storage};

// ============ User actions ============

/// Validate and store a new reminder.
pub fn add_reminder<S: ReminderStore + ?Sized>(
    store: &mut S,
    draft: ReminderDraft,
) -> AppResult<i64> {
    let reminder = draft.validate()?;
    let id = store.insert(reminder)?;
    log::info!("Added reminder {}", id);
    Ok(id)
}

pub fn list_reminders<S: ReminderStore + ?Sized>(
    store: &S,
    completed: bool,
    window: DueWindow,
    today: NaiveDate,
) -> AppResult<Vec<Reminder>> {
    let filter = if completed {
        ListFilter::completed()
    } else {
        ListFilter::pending()
    };
    store.list(&filter.within(window.range(today)))
}

pub fn complete_reminder<S: ReminderStore + ?Sized>(store: &mut S, id: i64) -> AppResult<Reminder> {
    let reminder = store.complete(id)?;
    log::info!("Reminder {} marked complete", id);
    Ok(reminder)
}

pub fn delete_reminder<S: ReminderStore + ?Sized>(store: &mut S, id: i64) -> AppResult<()> {
    store.delete(id)?;
    log::info!("Reminder {} deleted", id);
    Ok(())
}

pub fn build_scheduler(settings: &Settings) -> ReminderScheduler<DesktopNotifier> {
    let mailer = settings.email.clone().map(SmtpMailer::new);
    if mailer.is_none() {
        log::warn!("SMTP settings incomplete, email reminders will not be sent");
    }
    ReminderScheduler::new(DesktopNotifier::new(mailer), settings.catch_up)
}

/// Start the logger at the configured level. Settings are read first, so
/// anything worth reporting about them is logged here.
pub fn init_logging(settings: &Settings) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&settings.log_level))
        .init();
    log_startup(settings);
}

fn log_startup(settings: &Settings) {
    if let Some(path) = &settings.env_file {
        log::debug!("Loaded environment from {}", path.display());
    }
    log::debug!("Reminder data file: {}", settings.data_file().display());
}

pub fn run() -> AppResult<()> {
    let cli = Cli::parse();
    let settings = Settings::from_env()?;

    init_logging(&settings);

    let mut storage = Storage::open(settings.data_file())?;

    match cli.command {
        Command::Add(args) => {
            let id = add_reminder(&mut storage, args.into())?;
            println!("Reminder added successfully! (#{})", id);
        }
        Command::List { completed, window } => {
            let today = Local::now().date_naive();
            let reminders = list_reminders(&storage, completed, window.into(), today)?;
            if reminders.is_empty() {
                println!("No reminders.");
            }
            for reminder in &reminders {
                println!("{}", cli::format_row(reminder));
            }
        }
        Command::Complete { id } => {
            complete_reminder(&mut storage, id)?;
            println!("Reminder marked as complete!");
        }
        Command::Delete { id } => {
            delete_reminder(&mut storage, id)?;
            println!("Reminder deleted successfully!");
        }
        Command::Check => {
            let scheduler = build_scheduler(&settings);
            let report = scheduler.tick(&mut storage, Local::now().naive_local())?;
            cli::print_report(&report);
        }
        Command::Run => {
            build_scheduler(&settings).run_forever(&mut storage, settings.check_interval);
        }
    }

    Ok(())
}
