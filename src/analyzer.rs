//! Rule-based analysis with an optional language-model second opinion.

use chrono::NaiveDateTime;
use tracing::{debug, info, warn};

use crate::extractor::{Extraction, Extractor};
use crate::llm::LanguageModel;

/// Result of analysing one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Analysis {
    pub extraction: Extraction,
    /// Set when the task was only recognised after the model restated it.
    pub assisted_by: Option<&'static str>,
}

pub struct Analyzer {
    extractor: Extractor,
    model: Option<LanguageModel>,
}

impl Analyzer {
    pub fn new(extractor: Extractor, model: Option<LanguageModel>) -> Self {
        Self { extractor, model }
    }

    pub fn model_name(&self) -> Option<&'static str> {
        self.model.as_ref().map(LanguageModel::name)
    }

    pub async fn analyze(&self, text: &str, now: NaiveDateTime) -> Analysis {
        let extraction = self.extractor.extract(text, now);
        let Some(model) = self.model.as_ref().filter(|_| !extraction.is_task()) else {
            return Analysis {
                extraction,
                assisted_by: None,
            };
        };

        let answer = match model.restate(text, now).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("{} analysis failed: {e}", model.name());
                return Analysis {
                    extraction,
                    assisted_by: None,
                };
            }
        };
        debug!("{} restated message as: {answer}", model.name());

        Self::merge(extraction, self.extractor.extract(&format!("{text} {answer}"), now), text, model.name())
    }

    /// Keep the retry only if it found a task; the description stays the
    /// user's own words.
    fn merge(original: Extraction, retry: Extraction, text: &str, model: &'static str) -> Analysis {
        match retry {
            Extraction::Task(mut reminder) => {
                info!("Task recognised with help from {model}");
                reminder.description = text.trim().to_string();
                Analysis {
                    extraction: Extraction::Task(reminder),
                    assisted_by: Some(model),
                }
            }
            Extraction::Rejected { .. } => Analysis {
                extraction: original,
                assisted_by: None,
            },
        }
    }
}
