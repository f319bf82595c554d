//! Texts the bot sends back. All of them are Telegram HTML.

use crate::extractor::Reminder;
use crate::sink::{Receipt, SinkError, StoredReminder};

pub const ANALYZING: &str = "🤖 Анализирую сообщение...";

pub const GENERIC_ERROR: &str = "❌ Произошла ошибка при обработке сообщения.\nПопробуйте еще раз позже.";

pub const ACCESS_DENIED: &str = "Доступ запрещен.";

pub const UNKNOWN_COMMAND: &str = "Неизвестная команда. Список команд: /help";

pub const LIST_UNAVAILABLE: &str =
    "Список напоминаний доступен только когда бот хранит их сам. Сейчас напоминания отправляются во внешний сервис.";

/// Escape text for Telegram's HTML parse mode.
pub fn html_escape(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            _ => result.push(c),
        }
    }
    result
}

pub fn welcome(sink_name: &str) -> String {
    format!(
        "🤖 Привет! Я превращаю сообщения в напоминания.\n\n\
         Просто напишите задачу, например:\n\
         • «Напомни завтра в 15:00 купить молоко»\n\
         • «Встреча с врачом в пятницу в 10 утра»\n\
         • «Позвонить маме через час»\n\n\
         Напоминания уходят в: <b>{}</b>\n\n\
         Команды:\n\
         /start - это сообщение\n\
         /help - помощь\n\
         /list - сохраненные напоминания\n\
         /clear - удалить сохраненные напоминания",
        html_escape(sink_name)
    )
}

pub fn help() -> String {
    "❓ Как пользоваться ботом:\n\n\
     1. Отправьте сообщение с описанием задачи\n\
     2. Бот найдет в нем:\n\
     \u{20}  - категорию (встреча, лекарства, покупки, звонок, работа, личное)\n\
     \u{20}  - дату и время\n\
     \u{20}  - приоритет\n\
     3. Напоминание будет передано дальше\n\n\
     Примеры:\n\
     • «Завтра в 9 утра встреча с клиентом»\n\
     • «Через 2 часа принять лекарство»\n\
     • «В понедельник сдать отчет»\n\
     • «15 мая поздравить Анну с днем рождения»\n\
     • «Срочно позвонить в банк»"
        .to_string()
}

pub fn not_recognized(reason: &str) -> String {
    format!(
        "🤔 Я не смог определить это как задачу или напоминание ({}).\n\
         Попробуйте сформулировать четче, например:\n\
         • «Завтра в 15:00 встреча с врачом»\n\
         • «Через час принять лекарство»",
        html_escape(reason)
    )
}

/// The extracted fields, one per line.
fn fields(reminder: &Reminder) -> String {
    let mut text = format!("📝 <b>{}</b>\n", html_escape(&reminder.title));
    text.push_str(&format!("📂 Категория: {}\n", reminder.category.label()));
    if let Some(date) = reminder.date_string() {
        text.push_str(&format!("📅 Дата: {}\n", date));
    }
    if let Some(time) = reminder.time_string() {
        text.push_str(&format!("⏰ Время: {}\n", time));
    }
    text.push_str(&format!("🔥 Приоритет: {}", reminder.priority.label()));
    text
}

pub fn confirmation(reminder: &Reminder, receipt: &Receipt, assisted_by: Option<&str>) -> String {
    let mut text = match receipt {
        Receipt::Link(_) => "✅ Напоминание готово!\n\n".to_string(),
        _ => "✅ Напоминание создано!\n\n".to_string(),
    };
    text.push_str(&fields(reminder));

    match receipt {
        Receipt::Sent => {}
        Receipt::Link(url) => {
            text.push_str(&format!(
                "\n\n🔗 Откройте ссылку на iPhone, чтобы добавить напоминание:\n<code>{}</code>",
                html_escape(url)
            ));
        }
        Receipt::Stored { total } => {
            text.push_str(&format!("\n\n🗂 Сохранено. Всего напоминаний: {}", total));
        }
    }

    if let Some(model) = assisted_by {
        text.push_str(&format!("\n\n🧠 Распознано с помощью {}", html_escape(model)));
    }
    text
}

/// Sink failed: show what was extracted so nothing is lost.
pub fn delivery_failed(reminder: &Reminder, error: &SinkError) -> String {
    let cause = match error {
        SinkError::Timeout => "сервис не ответил вовремя".to_string(),
        SinkError::Status { status, .. } => format!("сервис ответил кодом {}", status),
        other => other.to_string(),
    };
    format!(
        "❌ Не удалось создать напоминание: {}.\n\nВот что я распознал:\n{}",
        html_escape(&cause),
        fields(reminder)
    )
}

pub fn reminder_list(entries: &[StoredReminder]) -> String {
    if entries.is_empty() {
        return "📭 Сохраненных напоминаний нет.".to_string();
    }
    let mut text = format!("🗂 Напоминания ({}):\n", entries.len());
    for (i, entry) in entries.iter().enumerate() {
        let r = &entry.reminder;
        let when = match (r.date_string(), r.time_string()) {
            (Some(d), Some(t)) => format!(" — {} {}", d, t),
            (Some(d), None) => format!(" — {}", d),
            (None, Some(t)) => format!(" — {}", t),
            (None, None) => String::new(),
        };
        text.push_str(&format!(
            "\n{}. {}{} [{}, {}]",
            i + 1,
            html_escape(&r.title),
            when,
            r.category.label(),
            r.priority.label()
        ));
    }
    text
}

pub fn cleared(removed: usize) -> String {
    format!("🧹 Удалено напоминаний: {}", removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{Category, Priority};
    use chrono::{NaiveDate, NaiveTime, Utc};

    fn reminder() -> Reminder {
        Reminder {
            title: "Купить <молоко> & хлеб".into(),
            description: "Завтра купить <молоко> & хлеб".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 20),
            time: NaiveTime::from_hms_opt(15, 0, 0),
            priority: Priority::High,
            category: Category::Shopping,
            keywords_found: vec!["купить".into()],
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(html_escape("hello"), "hello");
        assert_eq!(html_escape("<b>"), "&lt;b&gt;");
        assert_eq!(html_escape("a & \"b\""), "a &amp; &quot;b&quot;");
    }

    #[test]
    fn test_confirmation_escapes_title() {
        let text = confirmation(&reminder(), &Receipt::Sent, None);
        assert!(text.contains("<b>Купить &lt;молоко&gt; &amp; хлеб</b>"));
        assert!(text.contains("📅 Дата: 2026-10-20"));
        assert!(text.contains("⏰ Время: 15:00"));
        assert!(text.contains("высокий"));
    }

    #[test]
    fn test_confirmation_omits_missing_date() {
        let mut r = reminder();
        r.date = None;
        r.time = None;
        let text = confirmation(&r, &Receipt::Stored { total: 3 }, Some("Gemini"));
        assert!(!text.contains("Дата"));
        assert!(!text.contains("Время"));
        assert!(text.contains("Всего напоминаний: 3"));
        assert!(text.contains("Gemini"));
    }

    #[test]
    fn test_confirmation_shows_link() {
        let text = confirmation(&reminder(), &Receipt::Link("shortcuts://x?a=1&b=2".into()), None);
        assert!(text.contains("<code>shortcuts://x?a=1&amp;b=2</code>"));
    }

    #[test]
    fn test_failure_repeats_fields() {
        let err = SinkError::Status { status: 502, body: "bad gateway".into() };
        let text = delivery_failed(&reminder(), &err);
        assert!(text.contains("502"));
        assert!(text.contains("Купить &lt;молоко&gt;"));
        assert!(text.contains("2026-10-20"));
    }

    #[test]
    fn test_not_recognized_has_hint() {
        let text = not_recognized("нет ключевых слов");
        assert!(text.contains("нет ключевых слов"));
        assert!(text.contains("Через час принять лекарство"));
    }

    #[test]
    fn test_reminder_list() {
        assert!(reminder_list(&[]).contains("нет"));
        let entries = vec![StoredReminder {
            user_id: 1,
            stored_at: Utc::now(),
            reminder: reminder(),
        }];
        let text = reminder_list(&entries);
        assert!(text.contains("1. Купить &lt;молоко&gt; &amp; хлеб — 2026-10-20 15:00 [покупки, высокий]"));
    }
}
