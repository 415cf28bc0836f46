//! HTTP mail-relay notifier
//!
//! Delivery goes through an internal HTTP relay that accepts a JSON payload
//! with base64-encoded attachments. Notification is strictly best-effort: any
//! failure is logged and swallowed so a relay outage never fails a run whose
//! outcomes are already persisted.

use crate::config::NotifyConfig;
use crate::domain::{Result, SettlecheckError};
use base64::Engine;
use chrono::NaiveDate;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct Attachment {
    filename: String,
    content_base64: String,
}

#[derive(Debug, Serialize)]
struct RelayPayload {
    recipients: Vec<String>,
    subject: String,
    body: String,
    attachments: Vec<Attachment>,
}

/// Sends run snapshots to the configured recipients through the relay
pub struct RelayMailer {
    client: reqwest::Client,
    config: NotifyConfig,
}

impl RelayMailer {
    /// Creates a mailer from the notification configuration
    ///
    /// # Errors
    ///
    /// Returns an error when the HTTP client cannot be constructed.
    pub fn new(config: NotifyConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| SettlecheckError::Notify(e.to_string()))?;
        Ok(Self { client, config })
    }

    /// Delivers the snapshot files for one settlement date
    ///
    /// Returns `Some(())` on delivery and `None` on any failure, which has
    /// already been logged.
    pub async fn send(&self, date: NaiveDate, files: &[PathBuf]) -> Option<()> {
        if !self.config.enabled {
            tracing::debug!("Notification disabled; skipping delivery");
            return None;
        }

        match self.deliver(date, files).await {
            Ok(()) => {
                tracing::info!(
                    date = %date,
                    recipients = self.config.recipients.len(),
                    attachments = files.len(),
                    "Delivered run notification"
                );
                Some(())
            }
            Err(e) => {
                tracing::error!(date = %date, error = %e, "Notification delivery failed");
                None
            }
        }
    }

    async fn deliver(&self, date: NaiveDate, files: &[PathBuf]) -> Result<()> {
        let endpoint = self
            .config
            .relay_endpoint
            .as_deref()
            .ok_or_else(|| SettlecheckError::Notify("no relay endpoint configured".into()))?;

        let mut attachments = Vec::with_capacity(files.len());
        for path in files {
            attachments.push(load_attachment(path)?);
        }

        let payload = RelayPayload {
            recipients: self.config.recipients.clone(),
            subject: format!("{} {}", self.config.subject_prefix, date),
            body: format!(
                "Settlement reconciliation snapshots for {date} are attached.\n\
                 This message was generated automatically."
            ),
            attachments,
        };

        let response = self
            .client
            .post(endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| SettlecheckError::Notify(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SettlecheckError::Notify(format!(
                "relay returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

fn load_attachment(path: &Path) -> Result<Attachment> {
    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| SettlecheckError::Notify(format!("bad attachment path: {}", path.display())))?;
    let content = fs::read(path)?;
    Ok(Attachment {
        filename,
        content_base64: base64::engine::general_purpose::STANDARD.encode(content),
    })
}
