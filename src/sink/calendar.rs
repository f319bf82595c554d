//! Calendar HTTP API sink.
//!
//! Events are one hour long. A reminder without a date lands on the day the
//! message arrived; one without a time starts at 09:00.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use tracing::{info, warn};

use super::{http_client, SinkError};
use crate::extractor::{Category, Reminder};

const DEFAULT_START_HOUR: u32 = 9;

pub struct CalendarSink {
    base_url: String,
    api_key: String,
    calendars: HashMap<Category, String>,
    default_calendar: String,
    timezone: Tz,
    http: reqwest::Client,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(crate) struct EventPayload {
    summary: String,
    description: String,
    start: EventTime,
    end: EventTime,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub(crate) struct EventTime {
    date_time: String,
    time_zone: String,
}

impl CalendarSink {
    pub fn new(
        base_url: String,
        api_key: String,
        calendars: HashMap<Category, String>,
        default_calendar: String,
        timezone: Tz,
        timeout: Duration,
    ) -> Result<Self, SinkError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            calendars,
            default_calendar,
            timezone,
            http: http_client(timeout)?,
        })
    }

    pub fn calendar_for(&self, category: Category) -> &str {
        self.calendars
            .get(&category)
            .map(String::as_str)
            .unwrap_or(&self.default_calendar)
    }

    pub(crate) fn event_payload(&self, reminder: &Reminder, reference_date: NaiveDate) -> Result<EventPayload, SinkError> {
        let date = reminder.date.unwrap_or(reference_date);
        let time = match reminder.time {
            Some(time) => time,
            None => NaiveTime::from_hms_opt(DEFAULT_START_HOUR, 0, 0)
                .ok_or_else(|| SinkError::Encode("invalid default start time".into()))?,
        };
        let start = NaiveDateTime::new(date, time);
        let end = start
            .checked_add_signed(ChronoDuration::hours(1))
            .ok_or_else(|| SinkError::Encode(format!("event end out of range for {start}")))?;

        let mut description = reminder.description.clone();
        description.push_str(&format!("\n\nПриоритет: {}", reminder.priority.label()));

        Ok(EventPayload {
            summary: reminder.title.clone(),
            description,
            start: self.event_time(start),
            end: self.event_time(end),
        })
    }

    fn event_time(&self, at: NaiveDateTime) -> EventTime {
        EventTime {
            date_time: at.format("%Y-%m-%dT%H:%M:%S").to_string(),
            time_zone: self.timezone.name().to_string(),
        }
    }

    pub async fn send(&self, reminder: &Reminder, received_at: DateTime<Utc>) -> Result<(), SinkError> {
        let reference_date = received_at.with_timezone(&self.timezone).date_naive();
        let payload = self.event_payload(reminder, reference_date)?;
        let calendar_id = self.calendar_for(reminder.category);
        let url = format!(
            "{}/calendars/{}/events",
            self.base_url,
            urlencoding::encode(calendar_id)
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(SinkError::from_reqwest)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("Calendar rejected event: {status}");
            return Err(SinkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        info!("📅 Event created in calendar {}", calendar_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Priority;

    fn sink() -> CalendarSink {
        CalendarSink::new(
            "https://calendar.example.com/v3/".into(),
            "key".into(),
            HashMap::from([(Category::Medicine, "health".to_string())]),
            "primary".into(),
            chrono_tz::Europe::Moscow,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn reminder(date: Option<NaiveDate>, time: Option<NaiveTime>) -> Reminder {
        Reminder {
            title: "Принять лекарство".into(),
            description: "Через 2 часа принять лекарство".into(),
            date,
            time,
            priority: Priority::Medium,
            category: Category::Medicine,
            keywords_found: vec!["лекарство".into()],
        }
    }

    #[test]
    fn test_calendar_lookup_falls_back_to_default() {
        let sink = sink();
        assert_eq!(sink.calendar_for(Category::Medicine), "health");
        assert_eq!(sink.calendar_for(Category::Call), "primary");
    }

    #[test]
    fn test_event_is_one_hour() {
        let sink = sink();
        let r = reminder(NaiveDate::from_ymd_opt(2026, 10, 19), NaiveTime::from_hms_opt(23, 30, 0));
        let payload = sink.event_payload(&r, NaiveDate::from_ymd_opt(2026, 1, 1).unwrap()).unwrap();
        assert_eq!(payload.start.date_time, "2026-10-19T23:30:00");
        assert_eq!(payload.end.date_time, "2026-10-20T00:30:00");
        assert_eq!(payload.start.time_zone, "Europe/Moscow");
        assert!(payload.description.contains("средний"));
    }

    #[test]
    fn test_missing_date_and_time_use_defaults() {
        let sink = sink();
        let payload = sink
            .event_payload(&reminder(None, None), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
            .unwrap();
        assert_eq!(payload.start.date_time, "2026-10-19T09:00:00");
        assert_eq!(payload.end.date_time, "2026-10-19T10:00:00");
    }

    #[test]
    fn test_payload_field_names() {
        let sink = sink();
        let payload = sink
            .event_payload(&reminder(None, None), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap())
            .unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert!(json["start"]["dateTime"].is_string());
        assert!(json["end"]["timeZone"].is_string());
        assert_eq!(json["summary"], "Принять лекарство");
    }
}
