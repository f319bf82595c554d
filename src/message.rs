//! Incoming message as seen by the analyzer and sinks.

use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// One text message from a user. Lives for a single request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
    pub text: String,
    pub user_id: i64,
    pub received_at: DateTime<Utc>,
}

impl CandidateMessage {
    /// Receipt time on the user's wall clock.
    pub fn local_time(&self, timezone: Tz) -> NaiveDateTime {
        self.received_at.with_timezone(&timezone).naive_local()
    }

    /// Short preview for log lines.
    pub fn preview(&self) -> String {
        self.text.chars().take(100).collect()
    }
}
