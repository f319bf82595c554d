//! Generic JSON webhook, e.g. an iOS Shortcuts automation.

use std::time::Duration;

use reqwest::StatusCode;
use tracing::{info, warn};

use super::{http_client, ReminderPayload, SinkError};
use crate::extractor::Reminder;

pub struct WebhookSink {
    url: String,
    http: reqwest::Client,
}

impl WebhookSink {
    pub fn new(url: String, timeout: Duration) -> Result<Self, SinkError> {
        Ok(Self {
            url,
            http: http_client(timeout)?,
        })
    }

    /// POST the reminder. Only `200 OK` counts as delivered.
    pub async fn send(&self, reminder: &Reminder) -> Result<(), SinkError> {
        let payload = ReminderPayload::from(reminder);

        let response = self
            .http
            .post(&self.url)
            .json(&payload)
            .send()
            .await
            .map_err(SinkError::from_reqwest)?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            warn!("Webhook rejected reminder: {status}");
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("📤 Reminder delivered to webhook");
        Ok(())
    }
}
