//! Keyword tables for the extractor.
//!
//! Tables are plain data: they are loaded once (built-in Russian defaults,
//! optionally overridden from the config file) and compiled into regexes by
//! [`Extractor::new`](super::Extractor::new).

use std::fmt;

use regex::{Match, Regex};
use serde::Deserialize;

use super::Category;

/// Keywords that put a message into one category.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CategoryKeywords {
    pub category: Category,
    pub keywords: Vec<String>,
}

/// A vague time-of-day word ("вечером") and the clock time it stands for.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimeOfDay {
    pub word: String,
    pub hour: u32,
    #[serde(default)]
    pub minute: u32,
}

/// All keyword tables. Any table missing from the config keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeywordTables {
    /// Tried in order; the first keyword found decides the category.
    pub categories: Vec<CategoryKeywords>,
    /// Words that lower the priority.
    pub low_priority: Vec<String>,
    /// Words that raise the priority.
    pub high_priority: Vec<String>,
    /// Words that force high priority no matter what else was found.
    pub urgent: Vec<String>,
    pub times_of_day: Vec<TimeOfDay>,
}

fn words(list: &[&str]) -> Vec<String> {
    list.iter().map(|w| w.to_string()).collect()
}

impl Default for KeywordTables {
    fn default() -> Self {
        let category = |category, list: &[&str]| CategoryKeywords {
            category,
            keywords: words(list),
        };
        let time_of_day = |word: &str, hour| TimeOfDay {
            word: word.to_string(),
            hour,
            minute: 0,
        };

        // Entries are word-start prefixes, so stems like "таблетк" are fine.
        Self {
            categories: vec![
                category(
                    Category::Meeting,
                    &[
                        "встреч", "встрет", "совещани", "собрани", "конференци", "переговор",
                        "собеседовани", "свидани", "врач", "доктор", "стоматолог", "прием",
                    ],
                ),
                category(
                    Category::Medicine,
                    &["лекарств", "таблетк", "витамин", "укол", "капл", "антибиотик", "микстур"],
                ),
                category(
                    Category::Shopping,
                    &["купи", "покупк", "магазин", "заказа", "закажи", "продукт"],
                ),
                category(
                    Category::Call,
                    &["позвони", "перезвони", "звонок", "звонк", "набрать", "созвон"],
                ),
                category(
                    Category::Work,
                    &[
                        "отчет", "работ", "проект", "дедлайн", "сдать", "отправить", "письм",
                        "презентаци", "задач",
                    ],
                ),
                category(
                    Category::Personal,
                    &[
                        "напомни", "день рождения", "поздрави", "забрать", "убрать", "уборк",
                        "спортзал", "тренировк", "не забыть",
                    ],
                ),
                category(Category::Other, &["надо", "нужно", "сделать", "не забудь"]),
            ],
            low_priority: words(&[
                "не срочно",
                "не важно",
                "когда-нибудь",
                "по возможности",
                "если будет время",
            ]),
            high_priority: words(&["немедленно", "обязательно", "критично", "горит", "asap"]),
            urgent: words(&["сегодня", "срочно", "важно"]),
            times_of_day: vec![
                time_of_day("утром", 9),
                time_of_day("днем", 14),
                time_of_day("вечером", 18),
                time_of_day("ночью", 21),
            ],
        }
    }
}

/// Problems found while compiling keyword tables.
#[derive(Debug)]
pub enum TableError {
    /// A keyword did not compile into a regex.
    Regex { keyword: String, source: regex::Error },
    /// A time-of-day entry names an impossible clock time.
    InvalidTime { word: String, hour: u32, minute: u32 },
    /// The category table has no usable keyword at all.
    NoCategories,
}

impl fmt::Display for TableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Regex { keyword, source } => {
                write!(f, "keyword '{}' does not compile: {}", keyword, source)
            }
            Self::InvalidTime { word, hour, minute } => {
                write!(f, "time of day '{}' has invalid time {}:{:02}", word, hour, minute)
            }
            Self::NoCategories => write!(f, "category table has no keywords"),
        }
    }
}

impl std::error::Error for TableError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Regex { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Map `ё` to `е` without changing byte offsets, so spans found in the
/// folded text are valid in the original.
pub(crate) fn fold(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'ё' => 'е',
            'Ё' => 'Е',
            c => c,
        })
        .collect()
}

/// Case-insensitive regex for a keyword anchored at a word start.
/// The match extends to the end of the word it hits.
pub(crate) fn keyword_regex(keyword: &str) -> Result<Regex, TableError> {
    build_regex(keyword, r"\w*")
}

/// Like [`keyword_regex`], but the keyword must be the whole word.
pub(crate) fn word_regex(keyword: &str) -> Result<Regex, TableError> {
    build_regex(keyword, r"\b")
}

fn build_regex(keyword: &str, tail: &str) -> Result<Regex, TableError> {
    let pattern = fold(keyword)
        .split_whitespace()
        .map(regex::escape)
        .collect::<Vec<_>>()
        .join(r"\s+");
    Regex::new(&format!(r"(?i)\b{pattern}{tail}")).map_err(|source| TableError::Regex {
        keyword: keyword.to_string(),
        source,
    })
}

/// An ordered, compiled keyword list.
#[derive(Debug, Clone)]
pub(crate) struct KeywordSet {
    patterns: Vec<Regex>,
}

impl KeywordSet {
    /// Keywords match as word-start prefixes.
    pub(crate) fn compile(keywords: &[String]) -> Result<Self, TableError> {
        Self::compile_with(keywords, keyword_regex)
    }

    /// Keywords match only as whole words ("сегодня" but not "сегодняшний").
    pub(crate) fn compile_words(keywords: &[String]) -> Result<Self, TableError> {
        Self::compile_with(keywords, word_regex)
    }

    fn compile_with(
        keywords: &[String],
        regex: fn(&str) -> Result<Regex, TableError>,
    ) -> Result<Self, TableError> {
        let patterns = keywords
            .iter()
            .filter(|k| !k.trim().is_empty())
            .map(|k| regex(k))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// First match in table order (not text order).
    pub(crate) fn first_match<'t>(&self, text: &'t str) -> Option<Match<'t>> {
        self.patterns.iter().find_map(|p| p.find(text))
    }

    /// Every match of every keyword.
    pub(crate) fn find_all<'t>(&self, text: &'t str) -> Vec<Match<'t>> {
        self.patterns.iter().flat_map(|p| p.find_iter(text)).collect()
    }
}
