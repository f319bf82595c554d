//! `shortcuts://` deep links. Nothing is sent; the user opens the link.

use super::{ReminderPayload, SinkError};
use crate::extractor::Reminder;

pub struct DeepLinkSink {
    shortcut_name: String,
}

impl DeepLinkSink {
    pub fn new(shortcut_name: String) -> Self {
        Self { shortcut_name }
    }

    /// Link that runs the shortcut with the reminder JSON as text input.
    pub fn link(&self, reminder: &Reminder) -> Result<String, SinkError> {
        let json = serde_json::to_string(&ReminderPayload::from(reminder))
            .map_err(|e| SinkError::Encode(e.to_string()))?;
        Ok(format!(
            "shortcuts://run-shortcut?name={}&input=text&text={}",
            urlencoding::encode(&self.shortcut_name),
            urlencoding::encode(&json)
        ))
    }
}
