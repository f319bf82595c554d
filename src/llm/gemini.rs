//! Gemini `generateContent` client for short text answers.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Error;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize, Debug)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize, Debug)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, Error> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            api_key,
            model,
            client,
        })
    }

    /// Generate a text answer for `prompt`.
    pub async fn generate(&self, prompt: &str) -> Result<String, Error> {
        info!("🧠 Asking Gemini ({})", self.model);

        let request = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.2,
                max_output_tokens: 128,
            },
        };

        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);

        let response = self
            .client
            .post(&url)
            .query(&[("key", &self.api_key)])
            .json(&request)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_reqwest)?;

        debug!("Gemini response status: {status}");

        if !status.is_success() {
            return Err(Error::Api(format!("{status}: {body}")));
        }

        parse_response(&body)
    }
}

/// Concatenate the text parts of the first candidate.
fn parse_response(body: &str) -> Result<String, Error> {
    let parsed: GenerateResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    if let Some(error) = parsed.error {
        return Err(Error::Api(error.message));
    }

    let candidate = parsed
        .candidates
        .and_then(|c| c.into_iter().next())
        .ok_or(Error::Empty)?;
    let content = candidate.content.ok_or(Error::Empty)?;

    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    if text.trim().is_empty() {
        return Err(Error::Empty);
    }
    Ok(text)
}
