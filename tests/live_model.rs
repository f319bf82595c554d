//! Live language-model checks.
//!
//! These tests call the real Gemini API and need GEMINI_API_KEY set.
//!
//! Run with: cargo test --features integ_test --test live_model

#[cfg(feature = "integ_test")]
mod tests {
    use std::time::Duration;

    use chrono::NaiveDate;
    use remindbot::analyzer::Analyzer;
    use remindbot::extractor::{Extractor, KeywordTables};
    use remindbot::llm::{GeminiClient, LanguageModel};

    fn gemini() -> Option<LanguageModel> {
        let Ok(key) = std::env::var("GEMINI_API_KEY") else {
            eprintln!("Skipping test: GEMINI_API_KEY not set");
            return None;
        };
        let client = GeminiClient::new(key, "gemini-1.5-flash".into(), Duration::from_secs(30)).unwrap();
        Some(LanguageModel::Gemini(client))
    }

    #[tokio::test]
    async fn test_gemini_restates_message() {
        let Some(model) = gemini() else { return };
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();

        let answer = model.restate("мама ждёт вечером", now).await;
        assert!(answer.is_ok(), "Gemini failed: {:?}", answer.err());
        assert!(!answer.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_analyzer_falls_back_to_gemini() {
        let Some(model) = gemini() else { return };
        let now = NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap();
        let analyzer = Analyzer::new(Extractor::new(&KeywordTables::default()).unwrap(), Some(model));

        let analysis = analyzer.analyze("мама ждёт вечером", now).await;
        // The model may or may not help; it must never break the rule result.
        if analysis.extraction.is_task() {
            assert_eq!(analysis.assisted_by, Some("Gemini"));
        } else {
            assert_eq!(analysis.assisted_by, None);
        }
    }
}
