//! End-to-end checks of the rule extractor with the built-in Russian tables.
//!
//! Reference time is Monday 2026-10-19 10:00 local.

use chrono::{NaiveDate, NaiveDateTime};
use remindbot::extractor::{Category, Extraction, Extractor, KeywordTables, Priority, Reminder, TITLE_MAX_CHARS};

fn extractor() -> Extractor {
    Extractor::new(&KeywordTables::default()).unwrap()
}

fn now() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 10, 19)
        .unwrap()
        .and_hms_opt(10, 0, 0)
        .unwrap()
}

fn task(text: &str) -> Reminder {
    match extractor().extract(text, now()) {
        Extraction::Task(reminder) => reminder,
        Extraction::Rejected { reason } => panic!("'{text}' rejected: {reason}"),
    }
}

#[test]
fn test_weekday_alone_is_not_a_task() {
    assert!(!extractor().extract("В пятницу", now()).is_task());
}

#[test]
fn test_no_keyword_rejected_with_reason() {
    match extractor().extract("Какая сегодня погода?", now()) {
        Extraction::Rejected { reason } => assert!(!reason.is_empty()),
        Extraction::Task(r) => panic!("unexpected task: {r:?}"),
    }
}

#[test]
fn test_tomorrow() {
    let reminder = task("Завтра купить молоко");
    assert_eq!(reminder.date_string().as_deref(), Some("2026-10-20"));
    assert_eq!(reminder.time, None);
    assert_eq!(reminder.category, Category::Shopping);
}

#[test]
fn test_clock_time_taken_verbatim() {
    for (text, expected) in [
        ("Встреча в 15:00", "15:00"),
        ("Позвонить в банк к 9:05", "09:05"),
        ("Сдать отчет 23:59", "23:59"),
    ] {
        assert_eq!(task(text).time_string().as_deref(), Some(expected), "{text}");
    }
}

#[test]
fn test_medicine_in_two_hours() {
    let reminder = task("Через 2 часа принять лекарство");
    assert_eq!(reminder.category, Category::Medicine);
    assert_eq!(reminder.date_string().as_deref(), Some("2026-10-19"));
    assert_eq!(reminder.time_string().as_deref(), Some("12:00"));
    assert_eq!(reminder.priority, Priority::Medium);
    assert!(reminder.keywords_found.contains(&"лекарство".to_string()));
}

#[test]
fn test_day_offset_has_no_time() {
    let reminder = task("Через 2 дня позвонить маме");
    assert_eq!(reminder.date_string().as_deref(), Some("2026-10-21"));
    assert_eq!(reminder.time, None);
    assert_eq!(reminder.keywords_found, vec!["позвонить".to_string(), "через 2 дня".to_string()]);
}

#[test]
fn test_todays_report_is_not_urgent() {
    let reminder = task("Сдать сегодняшний отчет");
    assert_eq!(reminder.category, Category::Work);
    assert_eq!(reminder.date, None);
    assert_eq!(reminder.priority, Priority::Medium);
}

#[test]
fn test_urgent_call() {
    let reminder = task("Срочно позвонить маме");
    assert_eq!(reminder.category, Category::Call);
    assert_eq!(reminder.priority, Priority::High);
}

#[test]
fn test_not_urgent_is_low() {
    let reminder = task("Не срочно купить лампочки");
    assert_eq!(reminder.priority, Priority::Low);
}

#[test]
fn test_friday_morning_meeting() {
    let reminder = task("В пятницу в 10 утра встреча с врачом");
    assert_eq!(reminder.date_string().as_deref(), Some("2026-10-23"));
    assert_eq!(reminder.time_string().as_deref(), Some("10:00"));
    assert_eq!(reminder.category, Category::Meeting);
}

#[test]
fn test_day_and_month_in_the_past_rolls_over() {
    let reminder = task("15 мая поздравить Анну с днем рождения");
    assert_eq!(reminder.date_string().as_deref(), Some("2027-05-15"));
    assert_eq!(reminder.category, Category::Personal);
}

#[test]
fn test_vague_time_words() {
    assert_eq!(task("Утром выпить таблетку").time_string().as_deref(), Some("09:00"));
    assert_eq!(task("Вечером позвонить брату").time_string().as_deref(), Some("18:00"));
}

#[test]
fn test_long_title_is_truncated() {
    let text = "Нужно обязательно разобрать все старые документы на антресоли, \
                отсортировать их по годам и выбросить ненужные бумаги";
    let reminder = task(text);
    assert_eq!(reminder.title.chars().count(), TITLE_MAX_CHARS);
    assert!(reminder.title.ends_with("..."));
    assert_eq!(reminder.description, text);
}

#[test]
fn test_long_title_drops_date_and_time() {
    let reminder = task("Завтра в 15:00 встреча с командой по поводу нового проекта в зале");
    assert_eq!(reminder.title, "встреча с командой по поводу нового проекта в зале");
    assert_eq!(reminder.date_string().as_deref(), Some("2026-10-20"));
    assert_eq!(reminder.time_string().as_deref(), Some("15:00"));
}

#[test]
fn test_extraction_is_deterministic() {
    let extractor = extractor();
    let text = "Послезавтра вечером обязательно забрать посылку";
    assert_eq!(extractor.extract(text, now()), extractor.extract(text, now()));
}
