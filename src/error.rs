use serde::Serialize;
use std::fmt;

/// Application error types for reminder handling and user feedback.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum AppError {
    /// Errors related to the reminder data file
    Storage(String),
    /// Errors related to user input
    Validation(String),
    /// An explicit action referenced a reminder that does not exist
    NotFound(i64),
    /// Errors playing an alert sound
    Sound(String),
    /// Errors building or sending a reminder email
    Email(String),
    /// Missing or malformed settings
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Storage(msg) => write!(f, "Storage error: {}", msg),
            AppError::Validation(msg) => write!(f, "Validation error: {}", msg),
            AppError::NotFound(id) => write!(f, "Reminder {} not found", id),
            AppError::Sound(msg) => write!(f, "Sound error: {}", msg),
            AppError::Email(msg) => write!(f, "Email error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

// Convenience constructors
impl AppError {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        AppError::Storage(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn not_found(id: i64) -> Self {
        AppError::NotFound(id)
    }

    pub fn sound<S: Into<String>>(msg: S) -> Self {
        AppError::Sound(msg.into())
    }

    pub fn email<S: Into<String>>(msg: S) -> Self {
        AppError::Email(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        AppError::Config(msg.into())
    }
}

impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        AppError::Storage(error.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::Storage(error.to_string())
    }
}

/// Result type alias used across the crate
pub type AppResult<T> = Result<T, AppError>;
