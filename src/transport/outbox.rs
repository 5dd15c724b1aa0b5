//! Directory drop transport: each message becomes an `.eml` file.
use crate::notify::{render_mime, Authenticator, EmailMessage, MailSession};
use anyhow::{Context, Result};
use chrono::Local;
use std::fs;
use std::path::PathBuf;

pub struct OutboxAuthenticator {
    dir: PathBuf,
}

impl OutboxAuthenticator {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }
}

impl Authenticator for OutboxAuthenticator {
    fn is_authorized(&self) -> bool {
        true
    }

    fn authenticate(&self) -> Result<Box<dyn MailSession>> {
        fs::create_dir_all(&self.dir).with_context(|| format!("create {}", self.dir.display()))?;
        Ok(Box::new(OutboxSession {
            dir: self.dir.clone(),
        }))
    }
}

pub struct OutboxSession {
    dir: PathBuf,
}

impl MailSession for OutboxSession {
    fn send(&self, message: &EmailMessage) -> Result<()> {
        let bytes = render_mime(message)?;
        let stem = message
            .attachment_name
            .rsplit_once('.')
            .map_or(message.attachment_name.as_str(), |(stem, _)| stem);
        let path = self.dir.join(format!(
            "{}-{stem}.eml",
            Local::now().format("%Y%m%dT%H%M%S%.3f")
        ));
        fs::write(&path, bytes).with_context(|| format!("write {}", path.display()))?;
        tracing::info!(path = %path.display(), "message written to outbox");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_one_eml_per_message() {
        let dir = TempDir::new().unwrap();
        let outbox = dir.path().join("outbox");
        let session = OutboxAuthenticator::new(outbox.clone())
            .authenticate()
            .unwrap();
        let message = EmailMessage {
            from: "reports@example.com".to_string(),
            to: vec!["boss@example.com".to_string()],
            subject: "Sales Report Consolidated - Week 2026_S42".to_string(),
            body: "hi".to_string(),
            attachment_name: "reporte_consolidado_2026_S42.xlsx".to_string(),
            attachment_mime: crate::report::XLSX_MIME.to_string(),
            attachment: vec![1, 2, 3],
        };
        session.send(&message).unwrap();

        let files: Vec<PathBuf> = fs::read_dir(&outbox)
            .unwrap()
            .map(|entry| entry.unwrap().path())
            .collect();
        assert_eq!(files.len(), 1);
        let name = files[0].file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.ends_with("-reporte_consolidado_2026_S42.eml"));
        let text = fs::read_to_string(&files[0]).unwrap();
        assert!(text.contains("Subject: Sales Report Consolidated - Week 2026_S42"));
    }
}
