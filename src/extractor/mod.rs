//! Text-to-reminder extraction.
//!
//! A message is a task when it contains a category keyword. Date, time and
//! priority are then resolved by the ordered rules in `rules`; the first
//! rule that matches decides. Extraction is a pure function of the text and
//! the reference time.

pub mod keywords;
mod rules;

use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

pub use keywords::{CategoryKeywords, KeywordTables, TableError, TimeOfDay};

use keywords::{fold, KeywordSet};
use rules::{blank_spans, DateRules, PriorityRules, TimeRules};

/// Titles up to this many characters are kept as typed.
pub const TITLE_MAX_CHARS: usize = 50;
/// Characters kept before the ellipsis when a title is cut.
const TITLE_KEEP_CHARS: usize = 47;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Meeting,
    Medicine,
    Shopping,
    Call,
    Work,
    Personal,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meeting => "meeting",
            Category::Medicine => "medicine",
            Category::Shopping => "shopping",
            Category::Call => "call",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Other => "other",
        }
    }

    /// Name shown to users.
    pub fn label(&self) -> &'static str {
        match self {
            Category::Meeting => "встреча",
            Category::Medicine => "лекарства",
            Category::Shopping => "покупки",
            Category::Call => "звонок",
            Category::Work => "работа",
            Category::Personal => "личное",
            Category::Other => "другое",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Priority::High => "высокий",
            Priority::Medium => "средний",
            Priority::Low => "низкий",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A message recognised as a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub title: String,
    pub description: String,
    pub date: Option<NaiveDate>,
    pub time: Option<NaiveTime>,
    pub priority: Priority,
    pub category: Category,
    /// Words that drove the decision, in the order they were found.
    pub keywords_found: Vec<String>,
}

impl Reminder {
    /// `YYYY-MM-DD`
    pub fn date_string(&self) -> Option<String> {
        self.date.map(|d| d.format("%Y-%m-%d").to_string())
    }

    /// `HH:MM`
    pub fn time_string(&self) -> Option<String> {
        self.time.map(|t| t.format("%H:%M").to_string())
    }
}

/// Outcome of running the extractor on one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Extraction {
    Task(Reminder),
    Rejected { reason: String },
}

impl Extraction {
    pub fn is_task(&self) -> bool {
        matches!(self, Extraction::Task(_))
    }

    pub fn task(&self) -> Option<&Reminder> {
        match self {
            Extraction::Task(reminder) => Some(reminder),
            Extraction::Rejected { .. } => None,
        }
    }
}

/// Compiled keyword tables and rules.
pub struct Extractor {
    categories: Vec<(Category, KeywordSet)>,
    dates: DateRules,
    times: TimeRules,
    priorities: PriorityRules,
}

impl Extractor {
    pub fn new(tables: &KeywordTables) -> Result<Self, TableError> {
        let categories = tables
            .categories
            .iter()
            .map(|entry| -> Result<_, TableError> {
                Ok((entry.category, KeywordSet::compile(&entry.keywords)?))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if categories.iter().all(|(_, set)| set.is_empty()) {
            return Err(TableError::NoCategories);
        }

        Ok(Self {
            categories,
            dates: DateRules::new()?,
            times: TimeRules::new(&tables.times_of_day)?,
            priorities: PriorityRules {
                low: KeywordSet::compile(&tables.low_priority)?,
                high: KeywordSet::compile(&tables.high_priority)?,
                urgent: KeywordSet::compile_words(&tables.urgent)?,
            },
        })
    }

    /// Decide whether `text` is a task and pull out its fields.
    ///
    /// `now` is the local reference time used for relative dates.
    pub fn extract(&self, text: &str, now: NaiveDateTime) -> Extraction {
        let text = text.trim();
        if text.is_empty() {
            return Extraction::Rejected {
                reason: "сообщение пустое".to_string(),
            };
        }

        let folded = fold(text);
        let Some((category, keyword)) = self.find_category(&folded) else {
            return Extraction::Rejected {
                reason: "не найдено ни одного слова, похожего на задачу".to_string(),
            };
        };

        let mut keywords_found = vec![keyword];
        let mut note = |word: String| {
            if !keywords_found.contains(&word) {
                keywords_found.push(word);
            }
        };

        let date = self.dates.resolve(&folded, now);
        let time = self.times.resolve(&folded);
        let (priority, priority_words) = self.priorities.resolve(&folded);

        if let Some(ref d) = date {
            note(d.keyword.clone());
        }
        if let Some(ref t) = time {
            note(t.keyword.clone());
        }
        priority_words.into_iter().for_each(&mut note);

        Extraction::Task(Reminder {
            title: self.title(text, &folded),
            description: text.to_string(),
            date: date.as_ref().map(|d| d.date),
            // Clock time from an offset ("через 2 часа") only fills a gap.
            time: time.map(|t| t.time).or(date.and_then(|d| d.time)),
            priority,
            category,
            keywords_found,
        })
    }

    fn find_category(&self, folded: &str) -> Option<(Category, String)> {
        self.categories.iter().find_map(|(category, keywords)| {
            keywords
                .first_match(folded)
                .map(|m| (*category, m.as_str().to_lowercase()))
        })
    }

    fn title(&self, text: &str, folded: &str) -> String {
        if text.chars().count() <= TITLE_MAX_CHARS {
            return text.to_string();
        }

        // fold() keeps byte offsets, so spans from `folded` apply to `text`.
        let mut spans = self.dates.spans(folded);
        spans.extend(self.times.spans(folded));
        let mut title = collapse_whitespace(&blank_spans(text, spans));
        if title.is_empty() {
            title = collapse_whitespace(text);
        }

        if title.chars().count() <= TITLE_MAX_CHARS {
            title
        } else {
            let mut cut: String = title.chars().take(TITLE_KEEP_CHARS).collect();
            cut.push_str("...");
            cut
        }
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
