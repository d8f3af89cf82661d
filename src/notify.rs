use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification failed: {0}")]
    Delivery(String),
}

/// Event fired after a successful anonymous upload.
#[derive(Debug, Clone, Serialize)]
pub struct UploadEvent {
    /// Uploader address, taken from the trusted proxy header.
    pub ip: String,
    pub key: String,
    /// Human-formatted payload size ("12.0 KiB", "3.4 MiB").
    pub size: String,
    pub content_type: String,
    pub url: String,
}

/// Outbound notification channel for anonymous uploads. Delivery is
/// best-effort; callers spawn it off the response path and only log
/// failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_upload(&self, event: UploadEvent) -> Result<(), NotifyError>;
}

/// POSTs the event as JSON to a configured webhook URL.
pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: &str) -> Result<Self, anyhow::Error> {
        Ok(Self {
            client: Client::builder().build()?,
            url: url.to_string(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn notify_upload(&self, event: UploadEvent) -> Result<(), NotifyError> {
        let resp = self
            .client
            .post(&self.url)
            .json(&event)
            .send()
            .await
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(NotifyError::Delivery(format!(
                "webhook answered {}",
                resp.status()
            )));
        }
        Ok(())
    }
}

/// Used when no webhook is configured.
pub struct NullNotifier;

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify_upload(&self, _event: UploadEvent) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// Format a byte count the way the notification channel displays it.
pub fn human_size(bytes: u64) -> String {
    const MIB: f64 = 1024.0 * 1024.0;
    const KIB: f64 = 1024.0;
    let bytes = bytes as f64;
    if bytes >= MIB {
        format!("{:.1} MiB", bytes / MIB)
    } else {
        format!("{:.1} KiB", bytes / KIB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn human_size_picks_unit() {
        assert_eq!(human_size(512), "0.5 KiB");
        assert_eq!(human_size(1024), "1.0 KiB");
        assert_eq!(human_size(5 * 1024 * 1024), "5.0 MiB");
    }
}
