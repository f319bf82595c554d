//! Optional language-model collaborators.
//!
//! A model is only consulted when the rule-based extractor rejects a message.
//! It answers in free text; that text is appended to the original message and
//! fed back through the extractor, so the model never produces structured
//! output on its own.

pub mod gemini;
pub mod huggingface;

use std::time::Duration;

use chrono::NaiveDateTime;

use crate::config::AnalyzerSettings;

pub use gemini::GeminiClient;
pub use huggingface::HuggingFaceClient;

pub enum LanguageModel {
    Gemini(GeminiClient),
    HuggingFace(HuggingFaceClient),
}

impl LanguageModel {
    /// Build the configured model, or `None` for rules-only analysis.
    pub fn from_settings(settings: &AnalyzerSettings, timeout: Duration) -> Result<Option<Self>, Error> {
        let model = match settings {
            AnalyzerSettings::Rules => return Ok(None),
            AnalyzerSettings::Gemini { api_key, model } => {
                LanguageModel::Gemini(GeminiClient::new(api_key.clone(), model.clone(), timeout)?)
            }
            AnalyzerSettings::HuggingFace { api_key, model } => LanguageModel::HuggingFace(
                HuggingFaceClient::new(api_key.clone(), model.clone(), timeout)?,
            ),
        };
        Ok(Some(model))
    }

    pub fn name(&self) -> &'static str {
        match self {
            LanguageModel::Gemini(_) => "Gemini",
            LanguageModel::HuggingFace(_) => "Hugging Face",
        }
    }

    /// Ask the model to restate `text` as a plain reminder sentence.
    pub async fn restate(&self, text: &str, now: NaiveDateTime) -> Result<String, Error> {
        let prompt = restate_prompt(text, now);
        let answer = match self {
            LanguageModel::Gemini(client) => client.generate(&prompt).await?,
            LanguageModel::HuggingFace(client) => client.generate(&prompt).await?,
        };
        let answer = answer.trim();
        if answer.is_empty() {
            return Err(Error::Empty);
        }
        Ok(answer.to_string())
    }
}

pub(crate) fn restate_prompt(text: &str, now: NaiveDateTime) -> String {
    format!(
        r#"Перескажи сообщение пользователя одной короткой фразой-напоминанием на русском языке.
Используй простые слова: встреча, лекарство, купить, позвонить, отчет, напомнить.
Если в сообщении есть дата или время, сохрани их в виде "завтра", "в пятницу", "через 2 часа" или "в 15:00".
Если это не задача, ответь одним словом: нет.

Текущие дата и время: {}

Сообщение: "{}""#,
        now.format("%Y-%m-%d %H:%M"),
        text.replace('"', "'")
    )
}

#[derive(Debug)]
pub enum Error {
    Http(String),
    Timeout,
    Api(String),
    Parse(String),
    Empty,
}

impl Error {
    pub(crate) fn from_reqwest(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Error::Timeout
        } else {
            Error::Http(e.to_string())
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Http(e) => write!(f, "HTTP error: {e}"),
            Error::Timeout => write!(f, "request timed out"),
            Error::Api(e) => write!(f, "API error: {e}"),
            Error::Parse(e) => write!(f, "Parse error: {e}"),
            Error::Empty => write!(f, "Empty response"),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_prompt_carries_text_and_time() {
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(8, 5, 0)
            .unwrap();
        let prompt = restate_prompt("нужно \"молоко\"", now);
        assert!(prompt.contains("2026-10-19 08:05"));
        assert!(prompt.contains("нужно 'молоко'"));
    }

    #[test]
    fn test_rules_settings_build_no_model() {
        let model = LanguageModel::from_settings(&AnalyzerSettings::Rules, Duration::from_secs(5)).unwrap();
        assert!(model.is_none());
    }

    #[test]
    fn test_gemini_settings_build_model() {
        let settings = AnalyzerSettings::Gemini {
            api_key: "key".into(),
            model: "gemini-1.5-flash".into(),
        };
        let model = LanguageModel::from_settings(&settings, Duration::from_secs(5))
            .unwrap()
            .unwrap();
        assert_eq!(model.name(), "Gemini");
    }
}
