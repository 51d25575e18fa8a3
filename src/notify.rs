use crate::config::{DATE_FORMAT, TIME_FORMAT};
use crate::email::{ReminderEmail, SmtpMailer};
use crate::error::{AppError, AppResult};
use crate::reminder::Reminder;
use chrono::{NaiveDate, NaiveTime};
use std::fmt;
use std::path::Path;

/// Where reminder alerts go when a reminder fires.
///
/// The in-app alert cannot fail. Sound and email report their outcome so the
/// scheduler can log it and carry on.
pub trait NotificationSink {
    fn show_alert(&self, task: &str, date: NaiveDate, time: NaiveTime);

    fn play_sound(&self, path: &Path) -> AppResult<()>;

    fn send_email(&self, email: &ReminderEmail<'_>) -> AppResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Sound,
    Email,
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Sound => f.write_str("sound"),
            Channel::Email => f.write_str("email"),
        }
    }
}

/// Outcome of each optional channel attempted for one firing.
/// `None` means the channel is not configured on the reminder.
#[derive(Debug, Clone, Default)]
pub struct DeliveryReport {
    pub sound: Option<AppResult<()>>,
    pub email: Option<AppResult<()>>,
}

impl DeliveryReport {
    pub fn failures(&self) -> Vec<(Channel, AppError)> {
        let mut failures = Vec::new();
        if let Some(Err(e)) = &self.sound {
            failures.push((Channel::Sound, e.clone()));
        }
        if let Some(Err(e)) = &self.email {
            failures.push((Channel::Email, e.clone()));
        }
        failures
    }
}

/// Run every notification configured on `reminder` once.
pub fn dispatch<N: NotificationSink + ?Sized>(sink: &N, reminder: &Reminder) -> DeliveryReport {
    sink.show_alert(&reminder.task, reminder.scheduled_date, reminder.scheduled_time);

    let sound = reminder
        .sound_file
        .as_deref()
        .map(|path| sink.play_sound(path));

    let email = ReminderEmail::for_reminder(reminder).map(|email| sink.send_email(&email));

    let report = DeliveryReport { sound, email };
    for (channel, error) in report.failures() {
        log::error!(
            "Reminder {} ({}): {} notification failed: {}",
            reminder.id,
            reminder.task,
            channel,
            error
        );
    }
    report
}

/// Notifier used by the application: console alert, OS sound player, SMTP email.
pub struct DesktopNotifier {
    mailer: Option<SmtpMailer>,
}

impl DesktopNotifier {
    pub fn new(mailer: Option<SmtpMailer>) -> Self {
        Self { mailer }
    }
}

impl NotificationSink for DesktopNotifier {
    fn show_alert(&self, task: &str, date: NaiveDate, time: NaiveTime) {
        let message = format!(
            "Reminder: {} at {} on {}",
            task,
            time.format(TIME_FORMAT),
            date.format(DATE_FORMAT)
        );
        log::info!("{}", message);
        println!("{}", message);
    }

    fn play_sound(&self, path: &Path) -> AppResult<()> {
        if !path.is_file() {
            return Err(AppError::sound(format!(
                "Sound file {} not found",
                path.display()
            )));
        }

        open::that(path).map_err(|e| {
            AppError::sound(format!("Error playing sound {}: {}", path.display(), e))
        })
    }

    fn send_email(&self, email: &ReminderEmail<'_>) -> AppResult<()> {
        match &self.mailer {
            Some(mailer) => mailer.send(email),
            None => Err(AppError::config(
                "Email sender credentials are not fully configured (SENDER_EMAIL, SENDER_PASSWORD, SMTP_SERVER).",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;

    #[derive(Default)]
    struct Recorder {
        calls: RefCell<Vec<String>>,
        fail_email: bool,
    }

    impl NotificationSink for Recorder {
        fn show_alert(&self, task: &str, _date: NaiveDate, _time: NaiveTime) {
            self.calls.borrow_mut().push(format!("alert:{}", task));
        }

        fn play_sound(&self, path: &Path) -> AppResult<()> {
            self.calls.borrow_mut().push(format!("sound:{}", path.display()));
            Ok(())
        }

        fn send_email(&self, email: &ReminderEmail<'_>) -> AppResult<()> {
            self.calls.borrow_mut().push(format!("email:{}", email.to));
            if self.fail_email {
                Err(AppError::email("relay refused"))
            } else {
                Ok(())
            }
        }
    }

    fn reminder() -> Reminder {
        Reminder::new(
            "Check LC-0004".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn test_alert_only_by_default() {
        let sink = Recorder::default();
        let report = dispatch(&sink, &reminder());

        assert_eq!(*sink.calls.borrow(), vec!["alert:Check LC-0004"]);
        assert!(report.sound.is_none());
        assert!(report.email.is_none());
        assert!(report.failures().is_empty());
    }

    #[test]
    fn test_all_channels_when_configured() {
        let mut r = reminder();
        r.sound_file = Some(PathBuf::from("/sounds/bell.wav"));
        r.send_email = true;
        r.email_address = Some("grower@example.com".to_string());

        let sink = Recorder::default();
        let report = dispatch(&sink, &r);

        assert_eq!(
            *sink.calls.borrow(),
            vec![
                "alert:Check LC-0004",
                "sound:/sounds/bell.wav",
                "email:grower@example.com"
            ]
        );
        assert!(matches!(report.sound, Some(Ok(()))));
        assert!(matches!(report.email, Some(Ok(()))));
    }

    #[test]
    fn test_email_failure_is_reported_not_raised() {
        let mut r = reminder();
        r.send_email = true;
        r.email_address = Some("grower@example.com".to_string());

        let sink = Recorder {
            fail_email: true,
            ..Default::default()
        };
        let failures = dispatch(&sink, &r).failures();

        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].0, Channel::Email);
    }

    #[test]
    fn test_desktop_notifier_missing_sound_file() {
        let notifier = DesktopNotifier::new(None);
        let dir = tempfile::tempdir().unwrap();

        let err = notifier.play_sound(&dir.path().join("missing.wav")).unwrap_err();
        assert!(matches!(err, AppError::Sound(_)));
    }

    #[test]
    fn test_desktop_notifier_without_smtp_settings() {
        let mut r = reminder();
        r.send_email = true;
        r.email_address = Some("grower@example.com".to_string());
        let email = ReminderEmail::for_reminder(&r).unwrap();

        let err = DesktopNotifier::new(None).send_email(&email).unwrap_err();
        assert!(matches!(err, AppError::Config(_)));
    }
}
