//! Delivery of finished reports.

use std::path::{Path, PathBuf};

use base64::Engine;
use chrono::Local;
use log::info;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Failed to read attachment '{path}': {source}")]
    Attachment {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write message '{path}': {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub subject: String,
    pub body: String,
    pub attachment: PathBuf,
}

impl Notification {
    /// Message announcing the report generated for `folder`.
    pub fn report_ready(folder: &str, attachment: PathBuf) -> Self {
        let folder = folder.trim_end_matches('/');
        Self {
            subject: format!("RS3 Report: {}", folder),
            body: format!("Here is the report for {} attached.", folder),
            attachment,
        }
    }
}

pub trait Notifier: Send + Sync {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

/// Drops every message.
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn send(&self, _notification: &Notification) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Writes each message as a MIME `.eml` file into a directory watched by a
/// mail relay.
pub struct OutboxNotifier {
    directory: PathBuf,
    sender: String,
    recipient: String,
}

impl OutboxNotifier {
    pub fn new<P: AsRef<Path>>(directory: P, sender: &str, recipient: &str) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            sender: sender.to_string(),
            recipient: recipient.to_string(),
        }
    }

    fn render(&self, notification: &Notification, attachment: &[u8]) -> String {
        let boundary = format!("casefile-{}", uuid::Uuid::new_v4().simple());
        let filename = notification
            .attachment
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "attachment".to_string());
        let content_type = mime_guess::from_path(&notification.attachment).first_or_octet_stream();

        let encoded = base64::engine::general_purpose::STANDARD.encode(attachment);
        let wrapped: Vec<&str> = encoded
            .as_bytes()
            .chunks(76)
            .map(|chunk| std::str::from_utf8(chunk).unwrap_or_default())
            .collect();

        let mut message = String::new();
        message.push_str(&format!("From: {}\r\n", self.sender));
        message.push_str(&format!("To: {}\r\n", self.recipient));
        message.push_str(&format!("Subject: {}\r\n", notification.subject));
        message.push_str(&format!("Date: {}\r\n", Local::now().to_rfc2822()));
        message.push_str("MIME-Version: 1.0\r\n");
        message.push_str(&format!(
            "Content-Type: multipart/mixed; boundary=\"{}\"\r\n\r\n",
            boundary
        ));

        message.push_str(&format!("--{}\r\n", boundary));
        message.push_str("Content-Type: text/plain; charset=utf-8\r\n\r\n");
        message.push_str(&notification.body);
        message.push_str("\r\n");

        message.push_str(&format!("--{}\r\n", boundary));
        message.push_str(&format!(
            "Content-Type: {}; name=\"{}\"\r\n",
            content_type, filename
        ));
        message.push_str("Content-Transfer-Encoding: base64\r\n");
        message.push_str(&format!(
            "Content-Disposition: attachment; filename=\"{}\"\r\n\r\n",
            filename
        ));
        message.push_str(&wrapped.join("\r\n"));
        message.push_str(&format!("\r\n--{}--\r\n", boundary));
        message
    }
}

impl Notifier for OutboxNotifier {
    fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let attachment =
            std::fs::read(&notification.attachment).map_err(|e| NotifyError::Attachment {
                path: notification.attachment.clone(),
                source: e,
            })?;

        std::fs::create_dir_all(&self.directory).map_err(|e| NotifyError::Write {
            path: self.directory.clone(),
            source: e,
        })?;

        let path = self
            .directory
            .join(format!("{}.eml", uuid::Uuid::new_v4()));
        std::fs::write(&path, self.render(notification, &attachment)).map_err(|e| {
            NotifyError::Write {
                path: path.clone(),
                source: e,
            }
        })?;

        info!("Queued '{}' for {}", notification.subject, self.recipient);
        Ok(())
    }
}
