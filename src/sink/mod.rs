//! Destinations for extracted reminders.
//!
//! One sink is active per process. Network sinks make a single attempt with
//! the configured timeout; a failure goes back to the user as-is.

pub mod calendar;
pub mod deep_link;
pub mod memory;
pub mod webhook;

use std::fmt;
use std::time::Duration;

use chrono_tz::Tz;
use serde::Serialize;

use crate::config::SinkSettings;
use crate::extractor::{Category, Priority, Reminder};
use crate::message::CandidateMessage;

pub use calendar::CalendarSink;
pub use deep_link::DeepLinkSink;
pub use memory::{MemorySink, StoredReminder};
pub use webhook::WebhookSink;

/// JSON shape shared by the webhook body and the deep-link payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReminderPayload {
    pub title: String,
    pub notes: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub priority: Priority,
    pub category: Category,
}

impl From<&Reminder> for ReminderPayload {
    fn from(reminder: &Reminder) -> Self {
        Self {
            title: reminder.title.clone(),
            notes: reminder.description.clone(),
            date: reminder.date_string(),
            time: reminder.time_string(),
            priority: reminder.priority,
            category: reminder.category,
        }
    }
}

/// What the user gets back after a successful delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Receipt {
    /// Accepted by a webhook or calendar.
    Sent,
    /// A link the user has to open themselves.
    Link(String),
    /// Kept in memory; `total` is the sender's reminder count.
    Stored { total: usize },
}

#[derive(Debug)]
pub enum SinkError {
    /// Could not set up the HTTP client.
    Client(String),
    Http(String),
    Timeout,
    /// The receiver answered with an unexpected status.
    Status { status: u16, body: String },
    Encode(String),
}

impl SinkError {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            SinkError::Timeout
        } else {
            SinkError::Http(e.to_string())
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkError::Client(e) => write!(f, "HTTP client error: {e}"),
            SinkError::Http(e) => write!(f, "HTTP error: {e}"),
            SinkError::Timeout => write!(f, "request timed out"),
            SinkError::Status { status, body } => {
                if body.is_empty() {
                    write!(f, "unexpected status {status}")
                } else {
                    write!(f, "unexpected status {status}: {body}")
                }
            }
            SinkError::Encode(e) => write!(f, "encode error: {e}"),
        }
    }
}

impl std::error::Error for SinkError {}

pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, SinkError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| SinkError::Client(e.to_string()))
}

pub enum Sink {
    Webhook(WebhookSink),
    Calendar(CalendarSink),
    DeepLink(DeepLinkSink),
    Memory(MemorySink),
}

impl Sink {
    pub fn from_settings(settings: &SinkSettings, timezone: Tz, timeout: Duration) -> Result<Self, SinkError> {
        let sink = match settings {
            SinkSettings::Webhook { url } => Sink::Webhook(WebhookSink::new(url.clone(), timeout)?),
            SinkSettings::Calendar {
                base_url,
                api_key,
                calendars,
                default_calendar,
            } => Sink::Calendar(CalendarSink::new(
                base_url.clone(),
                api_key.clone(),
                calendars.clone(),
                default_calendar.clone(),
                timezone,
                timeout,
            )?),
            SinkSettings::DeepLink { shortcut_name } => {
                Sink::DeepLink(DeepLinkSink::new(shortcut_name.clone()))
            }
            SinkSettings::Memory => Sink::Memory(MemorySink::new()),
        };
        Ok(sink)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Sink::Webhook(_) => "webhook",
            Sink::Calendar(_) => "calendar",
            Sink::DeepLink(_) => "deep link",
            Sink::Memory(_) => "memory",
        }
    }

    /// The in-memory list, when that is the active sink.
    pub fn memory(&self) -> Option<&MemorySink> {
        match self {
            Sink::Memory(memory) => Some(memory),
            _ => None,
        }
    }

    pub async fn deliver(&self, reminder: &Reminder, message: &CandidateMessage) -> Result<Receipt, SinkError> {
        match self {
            Sink::Webhook(webhook) => webhook.send(reminder).await.map(|_| Receipt::Sent),
            Sink::Calendar(calendar) => calendar
                .send(reminder, message.received_at)
                .await
                .map(|_| Receipt::Sent),
            Sink::DeepLink(link) => link.link(reminder).map(Receipt::Link),
            Sink::Memory(memory) => {
                let total = memory
                    .store(message.user_id, message.received_at, reminder.clone())
                    .await;
                Ok(Receipt::Stored { total })
            }
        }
    }
}
