use chrono_tz::Tz;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use teloxide::types::UserId;

use crate::extractor::{Category, Extractor, KeywordTables, TableError};

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// Failed to read the config file.
    ReadFile { path: PathBuf, source: std::io::Error },
    /// Failed to parse JSON.
    ParseJson { path: PathBuf, source: serde_json::Error },
    /// Keyword tables do not compile.
    Keywords(TableError),
    /// Validation error.
    Validation(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read config file '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse config file '{}': {}", path.display(), source)
            }
            Self::Keywords(source) => write!(f, "invalid keyword tables: {}", source),
            Self::Validation(msg) => write!(f, "config validation error: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
            Self::Keywords(source) => Some(source),
            Self::Validation(_) => None,
        }
    }
}

/// How messages are analysed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalyzerSettings {
    /// Keyword and regex rules only.
    #[default]
    Rules,
    /// Rules, with Gemini as a fallback for rejected messages.
    Gemini {
        api_key: String,
        #[serde(default = "default_gemini_model")]
        model: String,
    },
    /// Rules, with a Hugging Face inference model as a fallback.
    #[serde(rename = "huggingface")]
    HuggingFace {
        api_key: String,
        #[serde(default = "default_huggingface_model")]
        model: String,
    },
}

/// Where extracted reminders go. Exactly one sink is active.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkSettings {
    /// POST the reminder as JSON (e.g. an iOS Shortcuts automation).
    Webhook { url: String },
    /// Create an event through a calendar HTTP API.
    Calendar {
        base_url: String,
        api_key: String,
        /// Calendar id per category. Unlisted categories use `default_calendar`.
        #[serde(default)]
        calendars: HashMap<Category, String>,
        default_calendar: String,
    },
    /// Reply with a `shortcuts://` link instead of sending anything.
    DeepLink {
        #[serde(default = "default_shortcut_name")]
        shortcut_name: String,
    },
    /// Keep reminders in process memory.
    #[default]
    Memory,
}

#[derive(Deserialize)]
struct ConfigFile {
    telegram_bot_token: String,
    /// Users allowed to talk to the bot. Empty means everyone.
    #[serde(default)]
    allowed_users: Vec<u64>,
    /// IANA timezone used to resolve "завтра", "в 9 утра", etc.
    #[serde(default = "default_timezone")]
    timezone: String,
    /// Directory for logs. Defaults to current directory.
    data_dir: Option<String>,
    /// Timeout for every outbound HTTP call.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
    #[serde(default)]
    analyzer: AnalyzerSettings,
    #[serde(default)]
    sink: SinkSettings,
    /// Overrides for the built-in keyword tables.
    #[serde(default)]
    keywords: KeywordTables,
}

fn default_timezone() -> String {
    "Europe/Moscow".to_string()
}

fn default_request_timeout_secs() -> u64 {
    15
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_huggingface_model() -> String {
    "mistralai/Mistral-7B-Instruct-v0.2".to_string()
}

fn default_shortcut_name() -> String {
    "Добавить напоминание".to_string()
}

pub struct Config {
    /// Path to the config file.
    pub config_path: PathBuf,
    pub telegram_bot_token: String,
    pub allowed_users: HashSet<UserId>,
    pub timezone: Tz,
    /// Directory for logs.
    pub data_dir: PathBuf,
    pub request_timeout: Duration,
    pub analyzer: AnalyzerSettings,
    pub sink: SinkSettings,
    /// Keyword tables compiled once at startup.
    pub extractor: Extractor,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&config_path)
            .map_err(|e| ConfigError::ReadFile { path: config_path.clone(), source: e })?;
        let file: ConfigFile = serde_json::from_str(&content)
            .map_err(|e| ConfigError::ParseJson { path: config_path.clone(), source: e })?;

        if file.telegram_bot_token.is_empty() {
            return Err(ConfigError::Validation("telegram_bot_token is required".into()));
        }
        // Telegram tokens are formatted as {bot_id}:{secret} where bot_id is numeric
        let token_parts: Vec<&str> = file.telegram_bot_token.split(':').collect();
        if token_parts.len() != 2 || token_parts[0].parse::<u64>().is_err() || token_parts[1].is_empty() {
            return Err(ConfigError::Validation(
                "telegram_bot_token appears invalid (expected format: 123456789:ABCdefGHI...)".into()
            ));
        }

        let timezone: Tz = file.timezone.parse().map_err(|_| {
            ConfigError::Validation(format!("unknown timezone '{}'", file.timezone))
        })?;

        if file.request_timeout_secs == 0 {
            return Err(ConfigError::Validation("request_timeout_secs must be positive".into()));
        }

        validate_analyzer(&file.analyzer)?;
        validate_sink(&file.sink)?;

        let extractor = Extractor::new(&file.keywords).map_err(ConfigError::Keywords)?;

        let data_dir = file
            .data_dir
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        Ok(Self {
            config_path,
            telegram_bot_token: file.telegram_bot_token,
            allowed_users: file.allowed_users.into_iter().map(UserId).collect(),
            timezone,
            data_dir,
            request_timeout: Duration::from_secs(file.request_timeout_secs),
            analyzer: file.analyzer,
            sink: file.sink,
            extractor,
        })
    }
}

fn validate_analyzer(analyzer: &AnalyzerSettings) -> Result<(), ConfigError> {
    match analyzer {
        AnalyzerSettings::Rules => Ok(()),
        AnalyzerSettings::Gemini { api_key, model } | AnalyzerSettings::HuggingFace { api_key, model } => {
            if api_key.is_empty() {
                return Err(ConfigError::Validation("analyzer.api_key is required".into()));
            }
            if model.is_empty() {
                return Err(ConfigError::Validation("analyzer.model must not be empty".into()));
            }
            Ok(())
        }
    }
}

fn is_http_url(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}

fn validate_sink(sink: &SinkSettings) -> Result<(), ConfigError> {
    match sink {
        SinkSettings::Webhook { url } => {
            if !is_http_url(url) {
                return Err(ConfigError::Validation(format!(
                    "sink.url must be an http(s) URL, got '{}'",
                    url
                )));
            }
        }
        SinkSettings::Calendar { base_url, api_key, default_calendar, .. } => {
            if !is_http_url(base_url) {
                return Err(ConfigError::Validation(format!(
                    "sink.base_url must be an http(s) URL, got '{}'",
                    base_url
                )));
            }
            if api_key.is_empty() {
                return Err(ConfigError::Validation("sink.api_key is required".into()));
            }
            if default_calendar.is_empty() {
                return Err(ConfigError::Validation("sink.default_calendar is required".into()));
            }
        }
        SinkSettings::DeepLink { shortcut_name } => {
            if shortcut_name.trim().is_empty() {
                return Err(ConfigError::Validation("sink.shortcut_name must not be empty".into()));
            }
        }
        SinkSettings::Memory => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    fn assert_err<T>(result: Result<T, ConfigError>) -> ConfigError {
        match result {
            Ok(_) => panic!("expected error, got Ok"),
            Err(e) => e,
        }
    }

    #[test]
    fn test_minimal_config_defaults() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdefGHIjklMNOpqrsTUVwxyz"
        }"#);
        let config = Config::load(file.path()).expect("should load valid config");
        assert_eq!(config.timezone, chrono_tz::Europe::Moscow);
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.analyzer, AnalyzerSettings::Rules);
        assert_eq!(config.sink, SinkSettings::Memory);
        assert!(config.allowed_users.is_empty());
    }

    #[test]
    fn test_allowed_users() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "allowed_users": [7]
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert!(config.allowed_users.contains(&UserId(7)));
        assert!(!config.allowed_users.contains(&UserId(8)));
    }

    #[test]
    fn test_full_config() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "timezone": "Asia/Yekaterinburg",
            "request_timeout_secs": 5,
            "analyzer": { "kind": "huggingface", "api_key": "hf_xxx" },
            "sink": {
                "kind": "calendar",
                "base_url": "https://calendar.example.com/v3",
                "api_key": "secret",
                "calendars": { "medicine": "health", "work": "job" },
                "default_calendar": "primary"
            }
        }"#);
        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.timezone, chrono_tz::Asia::Yekaterinburg);
        assert_eq!(
            config.analyzer,
            AnalyzerSettings::HuggingFace {
                api_key: "hf_xxx".into(),
                model: default_huggingface_model(),
            }
        );
        match config.sink {
            SinkSettings::Calendar { calendars, .. } => {
                assert_eq!(calendars.get(&Category::Medicine).map(String::as_str), Some("health"));
            }
            other => panic!("unexpected sink {other:?}"),
        }
    }

    #[test]
    fn test_empty_token() {
        let file = write_config(r#"{ "telegram_bot_token": "" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("telegram_bot_token"));
    }

    #[test]
    fn test_invalid_token_format_no_colon() {
        let file = write_config(r#"{ "telegram_bot_token": "invalid_token_no_colon" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
        assert!(err.to_string().contains("invalid"));
    }

    #[test]
    fn test_invalid_token_format_empty_secret() {
        let file = write_config(r#"{ "telegram_bot_token": "123456789:" }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_unknown_timezone() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "timezone": "Mars/Olympus"
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("Mars/Olympus"));
    }

    #[test]
    fn test_zero_timeout() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "request_timeout_secs": 0
        }"#);
        assert!(matches!(assert_err(Config::load(file.path())), ConfigError::Validation(_)));
    }

    #[test]
    fn test_gemini_without_key() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "analyzer": { "kind": "gemini", "api_key": "" }
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("api_key"));
    }

    #[test]
    fn test_webhook_needs_http_url() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "sink": { "kind": "webhook", "url": "ftp://example.com" }
        }"#);
        let err = assert_err(Config::load(file.path()));
        assert!(err.to_string().contains("sink.url"));
    }

    #[test]
    fn test_unknown_sink_kind() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "sink": { "kind": "fax" }
        }"#);
        assert!(matches!(assert_err(Config::load(file.path())), ConfigError::ParseJson { .. }));
    }

    #[test]
    fn test_bad_time_of_day_table() {
        let file = write_config(r#"{
            "telegram_bot_token": "123456789:ABCdef",
            "keywords": { "times_of_day": [{ "word": "поздно", "hour": 30 }] }
        }"#);
        assert!(matches!(assert_err(Config::load(file.path())), ConfigError::Keywords(_)));
    }

    #[test]
    fn test_file_not_found() {
        let err = assert_err(Config::load("/nonexistent/path/config.json"));
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }

    #[test]
    fn test_invalid_json() {
        let file = write_config("{ invalid json }");
        let err = assert_err(Config::load(file.path()));
        assert!(matches!(err, ConfigError::ParseJson { .. }));
    }
}
