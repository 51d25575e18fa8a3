//! Application configuration
//!
//! Centralized constants plus the runtime settings read from the environment.

use crate::error::{AppError, AppResult};
use crate::scheduler::CatchUpPolicy;
use std::path::PathBuf;
use std::time::Duration;

/// Folder created under the platform data directory
pub const APP_DIR_NAME: &str = "MycoTracker";

/// Reminder data file inside the data directory
pub const DATA_FILE_NAME: &str = "reminders.json";

/// How often the scheduler checks for due reminders
pub const DEFAULT_CHECK_INTERVAL_SECS: u64 = 60;

/// Date format accepted from users and shown in lists
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format accepted from users and shown in lists
pub const TIME_FORMAT: &str = "%H:%M";

/// Submission port used when `SMTP_PORT` is not set
pub const DEFAULT_SMTP_PORT: u16 = 587;

pub const DEFAULT_LOG_LEVEL: &str = "info";

/// SMTP account used to send reminder emails
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailSettings {
    pub sender: String,
    pub password: String,
    pub server: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub data_dir: PathBuf,
    pub check_interval: Duration,
    pub catch_up: CatchUpPolicy,
    pub log_level: String,
    /// `None` when the sender account is not fully configured
    pub email: Option<EmailSettings>,
    /// `.env` file the variables were loaded from, if any
    pub env_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from the process environment, reading `.env` first if present.
    pub fn from_env() -> AppResult<Self> {
        let env_file = dotenvy::dotenv().ok();
        let mut settings = Self::from_lookup(|key| std::env::var(key).ok())?;
        settings.env_file = env_file;
        Ok(settings)
    }

    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let data_dir = match get("MYCO_DATA_DIR") {
            Some(dir) => PathBuf::from(dir),
            None => dirs::data_local_dir()
                .ok_or_else(|| AppError::config("Failed to get local data dir"))?
                .join(APP_DIR_NAME),
        };

        let interval_secs = match get("MYCO_CHECK_INTERVAL_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    AppError::config(format!(
                        "MYCO_CHECK_INTERVAL_SECS must be a positive number of seconds, got '{}'",
                        raw
                    ))
                })?,
            None => DEFAULT_CHECK_INTERVAL_SECS,
        };

        let catch_up = match get("MYCO_CATCH_UP") {
            Some(raw) => raw.parse::<CatchUpPolicy>()?,
            None => CatchUpPolicy::default(),
        };

        let log_level = get("MYCO_LOG_LEVEL").unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());

        let email = match (
            get("SENDER_EMAIL"),
            get("SENDER_PASSWORD"),
            get("SMTP_SERVER"),
        ) {
            (Some(sender), Some(password), Some(server)) => {
                let port = match get("SMTP_PORT") {
                    Some(raw) => raw.parse::<u16>().map_err(|_| {
                        AppError::config(format!("SMTP_PORT must be a port number, got '{}'", raw))
                    })?,
                    None => DEFAULT_SMTP_PORT,
                };
                Some(EmailSettings {
                    sender,
                    password,
                    server,
                    port,
                })
            }
            _ => None,
        };

        Ok(Self {
            data_dir,
            check_interval: Duration::from_secs(interval_secs),
            catch_up,
            log_level,
            email,
            env_file: None,
        })
    }

    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE_NAME)
    }
}
