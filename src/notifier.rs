use crate::domain::SubscriberEmail;
use chrono::Utc;
use fs2::FileExt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

/// An email ready to be handed to a [`Notifier`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub recipient: SubscriberEmail,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

#[derive(thiserror::Error, Debug)]
#[error("Failed to deliver an email to {recipient}")]
pub struct NotifyError {
    pub recipient: SubscriberEmail,
    #[source]
    pub source: anyhow::Error,
}

/// Delivery boundary for verification codes and digests.
pub trait Notifier: Send + Sync {
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Simulated delivery: every email becomes a structured log event plus a plain-text record
/// appended to `log_file`.
#[derive(Debug, Clone)]
pub struct LogNotifier {
    sender: SubscriberEmail,
    log_file: PathBuf,
}

impl LogNotifier {
    pub fn new(sender: SubscriberEmail, log_file: impl Into<PathBuf>) -> Self {
        Self {
            sender,
            log_file: log_file.into(),
        }
    }

    fn format_entry(&self, message: &EmailMessage) -> String {
        format!(
            "=== EMAIL SENT ===\nFrom: {}\nTo: {}\nSubject: {}\nTimestamp: {}\n--- Plain Text Version ---\n{}\n\n",
            self.sender,
            message.recipient,
            message.subject,
            Utc::now().format("%Y-%m-%d %H:%M:%S"),
            message.text_body,
        )
    }

    fn append(&self, entry: &str) -> std::io::Result<()> {
        if let Some(parent) = self.log_file.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_file)?;
        // Digests and verification codes may be written by two processes at once.
        file.lock_exclusive()?;
        let written = file.write_all(entry.as_bytes());
        FileExt::unlock(&file)?;
        written
    }
}

impl Notifier for LogNotifier {
    #[tracing::instrument(
        name = "Deliver an email",
        skip(self, message),
        fields(recipient = %message.recipient, subject = %message.subject)
    )]
    fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.append(&self.format_entry(message))
            .map_err(|e| NotifyError {
                recipient: message.recipient.clone(),
                source: anyhow::Error::new(e).context(format!(
                    "Failed to append to {}",
                    self.log_file.display()
                )),
            })?;
        tracing::info!(
            sender = %self.sender,
            log_file = %self.log_file.display(),
            "Simulated email delivery"
        );
        Ok(())
    }
}
