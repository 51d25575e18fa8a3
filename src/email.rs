use crate::config::{EmailSettings, DATE_FORMAT, TIME_FORMAT};
use crate::error::{AppError, AppResult};
use crate::reminder::{Priority, Recurrence, Reminder};
use chrono::{NaiveDate, NaiveTime};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{Message, SmtpTransport, Transport};

/// Contents of one reminder email
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderEmail<'a> {
    pub to: &'a str,
    pub task: &'a str,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub recurrence: Recurrence,
    pub recurrence_description: String,
    pub priority: Priority,
    pub notes: Option<&'a str>,
    pub category: Option<&'a str>,
}

impl<'a> ReminderEmail<'a> {
    /// `None` unless the reminder has email switched on with an address.
    pub fn for_reminder(reminder: &'a Reminder) -> Option<Self> {
        let to = reminder.email_target()?;
        Some(Self {
            to,
            task: &reminder.task,
            date: reminder.scheduled_date,
            time: reminder.scheduled_time,
            recurrence: reminder.recurrence,
            recurrence_description: reminder.recurrence_description(),
            priority: reminder.priority,
            notes: reminder.notes.as_deref(),
            category: reminder.category.as_deref(),
        })
    }

    pub fn subject(&self) -> String {
        format!("MycoTracker Reminder: {}", self.task)
    }

    pub fn body(&self) -> String {
        let mut body = format!(
            "Dear User,\n\n\
             This is a reminder from your MycoTracker application for the following task:\n\n\
             Task: {}\n\
             Date: {}\n\
             Time: {}\n\
             Category: {}\n\
             Priority: {}\n\n",
            self.task,
            self.date.format(DATE_FORMAT),
            self.time.format(TIME_FORMAT),
            self.category.unwrap_or("None"),
            self.priority,
        );

        if self.recurrence.is_recurring() {
            body.push_str(&format!("Recurrence: {}\n", self.recurrence_description));
        }
        if let Some(notes) = self.notes {
            body.push_str(&format!("Notes: {}\n", notes));
        }

        body.push_str(
            "\n\nTo manage your reminders, please open the MycoTracker application.\n\n\
             Best regards,\n\
             MycoTracker App\n",
        );
        body
    }
}

/// Sends reminder emails through an authenticated STARTTLS relay
pub struct SmtpMailer {
    settings: EmailSettings,
}

impl SmtpMailer {
    pub fn new(settings: EmailSettings) -> Self {
        Self { settings }
    }

    fn build_message(&self, email: &ReminderEmail<'_>) -> AppResult<Message> {
        let from: Mailbox = self
            .settings
            .sender
            .parse()
            .map_err(|e| AppError::config(format!("Invalid sender address: {}", e)))?;
        let to: Mailbox = email
            .to
            .parse()
            .map_err(|e| AppError::email(format!("Invalid recipient {}: {}", email.to, e)))?;

        Message::builder()
            .from(from)
            .to(to)
            .subject(email.subject())
            .header(ContentType::TEXT_PLAIN)
            .body(email.body())
            .map_err(|e| AppError::email(format!("Failed to build message: {}", e)))
    }

    pub fn send(&self, email: &ReminderEmail<'_>) -> AppResult<()> {
        let message = self.build_message(email)?;

        let mailer = SmtpTransport::starttls_relay(&self.settings.server)
            .map_err(|e| AppError::email(format!("SMTP relay {}: {}", self.settings.server, e)))?
            .port(self.settings.port)
            .credentials(Credentials::new(
                self.settings.sender.clone(),
                self.settings.password.clone(),
            ))
            .build();

        mailer.send(&message).map_err(|e| {
            AppError::email(format!(
                "Failed to send email to {} for task {}: {}",
                email.to, email.task, e
            ))
        })?;

        log::info!("Email reminder sent to {} for task: {}", email.to, email.task);
        Ok(())
    }
}
