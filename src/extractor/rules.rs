//! Ordered date, time and priority rules.
//!
//! Each resolver walks a fixed list of rules and stops at the first one that
//! matches. Inside a rule the earliest occurrence in the text wins.

use std::ops::Range;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};
use regex::Regex;

use super::keywords::{keyword_regex, KeywordSet, TableError, TimeOfDay};
use super::Priority;

/// A resolved date and the words that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct DateMatch {
    pub date: NaiveDate,
    /// Clock time implied by a minute or hour offset ("через 2 часа").
    pub time: Option<NaiveTime>,
    pub keyword: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TimeMatch {
    pub time: NaiveTime,
    pub keyword: String,
}

#[derive(Debug, Clone, Copy)]
enum DateRule {
    RelativeDay,
    Weekday,
    Offset,
    CalendarDate,
}

const DATE_RULES: [DateRule; 4] = [
    DateRule::RelativeDay,
    DateRule::Weekday,
    DateRule::Offset,
    DateRule::CalendarDate,
];

#[derive(Debug, Clone, Copy)]
enum TimeRule {
    Clock,
    DayPeriod,
    Hours,
    TimeOfDay,
}

const TIME_RULES: [TimeRule; 4] = [
    TimeRule::Clock,
    TimeRule::DayPeriod,
    TimeRule::Hours,
    TimeRule::TimeOfDay,
];

const MONTHS: [&str; 12] = [
    "января", "февраля", "марта", "апреля", "мая", "июня", "июля", "августа", "сентября",
    "октября", "ноября", "декабря",
];

fn compile(pattern: &str) -> Result<Regex, TableError> {
    Regex::new(pattern).map_err(|source| TableError::Regex {
        keyword: pattern.to_string(),
        source,
    })
}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_signed(Duration::days(days))
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    time.with_second(0)
        .and_then(|t| t.with_nanosecond(0))
        .unwrap_or(time)
}

fn weekday_from_word(word: &str) -> Option<Weekday> {
    let day = match word {
        w if w.starts_with("понедельник") => Weekday::Mon,
        w if w.starts_with("вторник") => Weekday::Tue,
        w if w.starts_with("сред") => Weekday::Wed,
        w if w.starts_with("четверг") => Weekday::Thu,
        w if w.starts_with("пятниц") => Weekday::Fri,
        w if w.starts_with("суббот") => Weekday::Sat,
        w if w.starts_with("воскресень") => Weekday::Sun,
        _ => return None,
    };
    Some(day)
}

/// Next occurrence of `target` strictly after `today`.
pub(crate) fn next_weekday(today: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let from = i64::from(today.weekday().num_days_from_monday());
    let to = i64::from(target.num_days_from_monday());
    let ahead = match (to - from).rem_euclid(7) {
        0 => 7,
        n => n,
    };
    add_days(today, ahead)
}

/// Offset length for a "через N <unit>" phrase.
fn offset_duration(unit: &str, count: i64) -> Option<Duration> {
    let duration = match unit {
        "полчаса" => Duration::minutes(30),
        u if u.starts_with("минут") => Duration::minutes(count),
        u if u.starts_with("час") => Duration::hours(count),
        "день" | "дня" | "дней" => Duration::days(count),
        u if u.starts_with("недел") => Duration::weeks(count),
        _ => return None,
    };
    Some(duration)
}

/// 12-hour "в H утра/дня/вечера/ночи" to a 24-hour clock hour.
pub(crate) fn day_period_hour(hour: u32, period: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    let converted = match period {
        "утра" => hour % 12,
        "дня" | "вечера" if hour < 12 => hour + 12,
        "дня" | "вечера" => 12,
        "ночи" if hour == 12 => 0,
        "ночи" if hour >= 6 => hour + 12,
        "ночи" => hour,
        _ => return None,
    };
    Some(converted)
}

pub(crate) struct DateRules {
    relative_day: Regex,
    weekday: Regex,
    offset: Regex,
    day_month: Regex,
    numeric_date: Regex,
}

impl DateRules {
    pub(crate) fn new() -> Result<Self, TableError> {
        Ok(Self {
            relative_day: compile(r"(?i)\b(послезавтра|завтра|сегодня)\b")?,
            weekday: compile(
                r"(?i)\b(?:(?:в|во)\s+)?(понедельник|вторник|сред[ауы]|четверг|пятниц[ауы]|суббот[ауы]|воскресень[ея])\b",
            )?,
            offset: compile(
                r"(?i)\bчерез\s+(?:(\d{1,4})\s+)?(полчаса|минуту|минуты|минут|часа|часов|час|день|дня|дней|неделю|недели|недель)\b",
            )?,
            day_month: compile(&format!(r"(?i)\b(\d{{1,2}})\s+({})\b", MONTHS.join("|")))?,
            numeric_date: compile(r"\b(\d{1,2})\.(\d{1,2})(?:\.(\d{4}))?\b")?,
        })
    }

    /// First matching rule wins.
    pub(crate) fn resolve(&self, text: &str, now: NaiveDateTime) -> Option<DateMatch> {
        DATE_RULES.iter().find_map(|rule| self.apply(*rule, text, now))
    }

    /// Byte spans of every date expression in `text`.
    pub(crate) fn spans(&self, text: &str) -> Vec<Range<usize>> {
        [
            &self.relative_day,
            &self.weekday,
            &self.offset,
            &self.day_month,
            &self.numeric_date,
        ]
        .iter()
        .flat_map(|re| re.find_iter(text).map(|m| m.range()))
        .collect()
    }

    fn apply(&self, rule: DateRule, text: &str, now: NaiveDateTime) -> Option<DateMatch> {
        let today = now.date();
        match rule {
            DateRule::RelativeDay => {
                let caps = self.relative_day.captures(text)?;
                let word = caps[1].to_lowercase();
                let days = match word.as_str() {
                    "сегодня" => 0,
                    "завтра" => 1,
                    _ => 2,
                };
                Some(DateMatch {
                    date: add_days(today, days)?,
                    time: None,
                    keyword: word,
                })
            }
            DateRule::Weekday => self.weekday.captures_iter(text).find_map(|caps| {
                let word = caps[1].to_lowercase();
                let date = next_weekday(today, weekday_from_word(&word)?)?;
                Some(DateMatch {
                    date,
                    time: None,
                    keyword: word,
                })
            }),
            DateRule::Offset => self.offset.captures_iter(text).find_map(|caps| {
                let count = match caps.get(1) {
                    Some(n) => n.as_str().parse().ok()?,
                    None => 1,
                };
                let unit = caps[2].to_lowercase();
                let target = now.checked_add_signed(offset_duration(&unit, count)?)?;
                let carries_clock = unit == "полчаса" || unit.starts_with("минут") || unit.starts_with("час");
                Some(DateMatch {
                    date: target.date(),
                    time: carries_clock.then(|| truncate_to_minute(target.time())),
                    keyword: caps[0].to_lowercase(),
                })
            }),
            DateRule::CalendarDate => self
                .day_month_date(text, today)
                .or_else(|| self.numeric(text, today)),
        }
    }

    /// "15 мая": this year, or next year once the day has passed.
    fn day_month_date(&self, text: &str, today: NaiveDate) -> Option<DateMatch> {
        self.day_month.captures_iter(text).find_map(|caps| {
            let day: u32 = caps[1].parse().ok()?;
            let month_name = caps[2].to_lowercase();
            let month = MONTHS.iter().position(|m| *m == month_name)? as u32 + 1;
            Some(DateMatch {
                date: upcoming(today, month, day)?,
                time: None,
                keyword: caps[0].to_lowercase(),
            })
        })
    }

    /// "15.05" or "15.05.2027".
    fn numeric(&self, text: &str, today: NaiveDate) -> Option<DateMatch> {
        self.numeric_date.captures_iter(text).find_map(|caps| {
            let day: u32 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let date = match caps.get(3) {
                Some(year) => NaiveDate::from_ymd_opt(year.as_str().parse().ok()?, month, day)?,
                None => upcoming(today, month, day)?,
            };
            Some(DateMatch {
                date,
                time: None,
                keyword: caps[0].to_string(),
            })
        })
    }
}

fn upcoming(today: NaiveDate, month: u32, day: u32) -> Option<NaiveDate> {
    let this_year = NaiveDate::from_ymd_opt(today.year(), month, day);
    match this_year {
        Some(date) if date >= today => Some(date),
        _ => NaiveDate::from_ymd_opt(today.year() + 1, month, day),
    }
}

pub(crate) struct TimeRules {
    clock: Regex,
    day_period: Regex,
    hours: Regex,
    times_of_day: Vec<(Regex, NaiveTime)>,
}

impl TimeRules {
    pub(crate) fn new(times_of_day: &[TimeOfDay]) -> Result<Self, TableError> {
        let times_of_day = times_of_day
            .iter()
            .map(|entry| -> Result<(Regex, NaiveTime), TableError> {
                let time = NaiveTime::from_hms_opt(entry.hour, entry.minute, 0).ok_or_else(|| {
                    TableError::InvalidTime {
                        word: entry.word.clone(),
                        hour: entry.hour,
                        minute: entry.minute,
                    }
                })?;
                Ok((keyword_regex(&entry.word)?, time))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            clock: compile(r"(?i)\b(?:(?:в|к)\s+)?([01]?\d|2[0-3]):([0-5]\d)\b")?,
            day_period: compile(
                r"(?i)\b(?:в|к)\s+(\d{1,2})(?:\s+час(?:а|ов)?)?\s+(утра|дня|вечера|ночи)\b",
            )?,
            hours: compile(r"(?i)\b(?:в|к)\s+(\d{1,2})\s+час(?:а|ов)?\b")?,
            times_of_day,
        })
    }

    /// First matching rule wins.
    pub(crate) fn resolve(&self, text: &str) -> Option<TimeMatch> {
        TIME_RULES.iter().find_map(|rule| self.apply(*rule, text))
    }

    /// Byte spans of every time expression in `text`.
    pub(crate) fn spans(&self, text: &str) -> Vec<Range<usize>> {
        [&self.clock, &self.day_period, &self.hours]
            .into_iter()
            .chain(self.times_of_day.iter().map(|(re, _)| re))
            .flat_map(|re| re.find_iter(text).map(|m| m.range()))
            .collect()
    }

    fn apply(&self, rule: TimeRule, text: &str) -> Option<TimeMatch> {
        match rule {
            TimeRule::Clock => self.clock.captures_iter(text).find_map(|caps| {
                let hour = caps[1].parse().ok()?;
                let minute = caps[2].parse().ok()?;
                Some(TimeMatch {
                    time: NaiveTime::from_hms_opt(hour, minute, 0)?,
                    keyword: caps[0].to_lowercase(),
                })
            }),
            TimeRule::DayPeriod => self.day_period.captures_iter(text).find_map(|caps| {
                let hour = day_period_hour(caps[1].parse().ok()?, &caps[2].to_lowercase())?;
                Some(TimeMatch {
                    time: NaiveTime::from_hms_opt(hour, 0, 0)?,
                    keyword: caps[0].to_lowercase(),
                })
            }),
            TimeRule::Hours => self.hours.captures_iter(text).find_map(|caps| {
                let hour = caps[1].parse().ok()?;
                Some(TimeMatch {
                    time: NaiveTime::from_hms_opt(hour, 0, 0)?,
                    keyword: caps[0].to_lowercase(),
                })
            }),
            TimeRule::TimeOfDay => self.times_of_day.iter().find_map(|(re, time)| {
                re.find(text).map(|m| TimeMatch {
                    time: *time,
                    keyword: m.as_str().to_lowercase(),
                })
            }),
        }
    }
}

/// Priority words, applied in a fixed order: low, then high, then the
/// unconditional urgency override.
pub(crate) struct PriorityRules {
    pub low: KeywordSet,
    pub high: KeywordSet,
    pub urgent: KeywordSet,
}

impl PriorityRules {
    /// Resolve priority and report the words that decided it.
    pub(crate) fn resolve(&self, text: &str) -> (Priority, Vec<String>) {
        let mut priority = Priority::Medium;
        let mut found = Vec::new();

        let low = self.low.find_all(text);
        if let Some(m) = low.first() {
            priority = Priority::Low;
            found.push(m.as_str().to_lowercase());
        }

        // Low phrases contain urgency words ("не срочно"), so hide them first.
        let remaining = blank_spans(text, low.iter().map(|m| m.range()).collect());

        if let Some(m) = self.high.first_match(&remaining) {
            priority = Priority::High;
            found.push(m.as_str().to_lowercase());
        }
        if let Some(m) = self.urgent.first_match(&remaining) {
            priority = Priority::High;
            found.push(m.as_str().to_lowercase());
        }

        (priority, found)
    }
}

/// Sort and merge overlapping byte ranges.
pub(crate) fn merge_spans(mut spans: Vec<Range<usize>>) -> Vec<Range<usize>> {
    spans.sort_by_key(|s| s.start);
    let mut merged: Vec<Range<usize>> = Vec::with_capacity(spans.len());
    for span in spans {
        match merged.last_mut() {
            Some(last) if span.start <= last.end => last.end = last.end.max(span.end),
            _ => merged.push(span),
        }
    }
    merged
}

/// Replace every span with a single space.
pub(crate) fn blank_spans(text: &str, spans: Vec<Range<usize>>) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pos = 0;
    for span in merge_spans(spans) {
        out.push_str(&text[pos..span.start]);
        out.push(' ');
        pos = span.end;
    }
    out.push_str(&text[pos..]);
    out
}
