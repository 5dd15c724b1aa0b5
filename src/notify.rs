//! Notification: package the artifact as an email and hand it to a session.
//!
//! The pipeline only sees the `Authenticator` and `MailSession` capabilities;
//! concrete transports live in `crate::transport`.
use crate::mission::MissionLog;
use crate::report::{ReportWeek, XLSX_MIME};
use anyhow::{anyhow, Context, Result};
use lettre::message::header::ContentType;
use lettre::message::{Attachment, Mailbox, MultiPart, SinglePart};
use lettre::Message;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Fixed body text of the report email.
pub const EMAIL_BODY: &str = "Hello,\n\n\
Attached is the consolidated sales report for this week.\n\
It contains the full detail sheet and a per-product summary.\n\n\
This message was generated automatically.\n";

/// Subject line for `week`.
pub fn subject_for(week: ReportWeek) -> String {
    format!("Sales Report Consolidated - Week {}", week.label())
}

/// A composed message ready for any transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailMessage {
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub attachment_name: String,
    pub attachment_mime: String,
    pub attachment: Vec<u8>,
}

/// An authenticated handle able to send messages.
pub trait MailSession {
    fn send(&self, message: &EmailMessage) -> Result<()>;
}

/// Capability producing sessions from stored credentials.
pub trait Authenticator {
    /// Whether credentials are already established (no interactive step needed).
    fn is_authorized(&self) -> bool;

    fn authenticate(&self) -> Result<Box<dyn MailSession>>;
}

/// Result of the notification step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum NotificationStatus {
    NotAttempted,
    Sent,
    Failed(String),
}

/// Build the report email for `artifact`.
pub fn compose(
    sender: &str,
    recipients: &[String],
    artifact: &Path,
    week: ReportWeek,
) -> Result<EmailMessage> {
    if recipients.is_empty() {
        return Err(anyhow!("no recipients configured"));
    }
    let attachment = fs::read(artifact).with_context(|| format!("read {}", artifact.display()))?;
    let attachment_name = artifact
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow!("artifact path {} has no file name", artifact.display()))?;
    Ok(EmailMessage {
        from: sender.to_string(),
        to: recipients.to_vec(),
        subject: subject_for(week),
        body: EMAIL_BODY.to_string(),
        attachment_name,
        attachment_mime: XLSX_MIME.to_string(),
        attachment,
    })
}

/// Compose and send the report; failures are logged and returned, never retried.
pub fn notify(
    session: &dyn MailSession,
    sender: &str,
    recipients: &[String],
    artifact: &Path,
    week: ReportWeek,
    log: &mut MissionLog,
) -> NotificationStatus {
    let message = match compose(sender, recipients, artifact, week) {
        Ok(message) => message,
        Err(err) => {
            log.error(format!("could not prepare the email: {err:#}"));
            return NotificationStatus::Failed(format!("{err:#}"));
        }
    };
    log.info(format!(
        "sending '{}' to {}",
        message.subject,
        message.to.join(", ")
    ));
    match session.send(&message) {
        Ok(()) => {
            log.info("email sent");
            NotificationStatus::Sent
        }
        Err(err) => {
            log.error(format!("transport error while sending email: {err:#}"));
            NotificationStatus::Failed(format!("{err:#}"))
        }
    }
}

/// Parse a mailbox (`addr` or `Name <addr>`).
pub fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse::<Mailbox>()
        .with_context(|| format!("invalid email address {address:?}"))
}

/// Render `message` as RFC 5322 bytes with a plain-text part and the attachment.
pub fn render_mime(message: &EmailMessage) -> Result<Vec<u8>> {
    let mut builder = Message::builder()
        .from(parse_mailbox(&message.from)?)
        .subject(message.subject.as_str());
    for recipient in &message.to {
        builder = builder.to(parse_mailbox(recipient)?);
    }
    let content_type = ContentType::parse(&message.attachment_mime)
        .with_context(|| format!("invalid content type {:?}", message.attachment_mime))?;
    let attachment = Attachment::new(message.attachment_name.clone())
        .body(message.attachment.clone(), content_type);
    let email = builder
        .multipart(
            MultiPart::mixed()
                .singlepart(SinglePart::plain(message.body.clone()))
                .singlepart(attachment),
        )
        .context("build email")?;
    Ok(email.formatted())
}
