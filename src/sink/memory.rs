//! In-process reminder list. Nothing survives a restart.

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;
use tracing::info;

use crate::extractor::Reminder;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredReminder {
    pub user_id: i64,
    pub stored_at: DateTime<Utc>,
    pub reminder: Reminder,
}

#[derive(Default)]
pub struct MemorySink {
    entries: Mutex<Vec<StoredReminder>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a reminder and return how many the user now has.
    pub async fn store(&self, user_id: i64, stored_at: DateTime<Utc>, reminder: Reminder) -> usize {
        let mut entries = self.entries.lock().await;
        entries.push(StoredReminder {
            user_id,
            stored_at,
            reminder,
        });
        let total = entries.iter().filter(|e| e.user_id == user_id).count();
        info!("🗂 Stored reminder for {} ({} total)", user_id, total);
        total
    }

    /// The user's reminders, oldest first.
    pub async fn list(&self, user_id: i64) -> Vec<StoredReminder> {
        self.entries
            .lock()
            .await
            .iter()
            .filter(|e| e.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Drop the user's reminders and return how many were removed.
    pub async fn clear(&self, user_id: i64) -> usize {
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|e| e.user_id != user_id);
        before - entries.len()
    }
}
