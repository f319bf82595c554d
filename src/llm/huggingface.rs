//! Hugging Face serverless inference client (free tier).

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::Error;

const HF_API_BASE: &str = "https://api-inference.huggingface.co/models";

pub struct HuggingFaceClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: Parameters,
}

#[derive(Serialize)]
struct Parameters {
    max_new_tokens: u32,
    return_full_text: bool,
}

#[derive(Deserialize, Debug)]
#[serde(untagged)]
enum InferenceResponse {
    Generated(Vec<Generated>),
    Failed { error: String },
}

#[derive(Deserialize, Debug)]
struct Generated {
    generated_text: String,
}

impl HuggingFaceClient {
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

    pub async fn generate(&self, prompt: &str) -> Result<String, Error> {
        info!("🧠 Asking Hugging Face ({})", self.model);

        let request = InferenceRequest {
            inputs: prompt,
            parameters: Parameters {
                max_new_tokens: 96,
                return_full_text: false,
            },
        };

        let response = self
            .client
            .post(format!("{}/{}", HF_API_BASE, self.model))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(Error::from_reqwest)?;

        let status = response.status();
        let body = response.text().await.map_err(Error::from_reqwest)?;

        debug!("Hugging Face response status: {status}");

        // A cold model answers 503 with {"error": "... is currently loading"}
        if !status.is_success() {
            return Err(Error::Api(format!("{status}: {body}")));
        }

        parse_response(&body)
    }
}

fn parse_response(body: &str) -> Result<String, Error> {
    let parsed: InferenceResponse =
        serde_json::from_str(body).map_err(|e| Error::Parse(e.to_string()))?;

    match parsed {
        InferenceResponse::Failed { error } => Err(Error::Api(error)),
        InferenceResponse::Generated(generated) => generated
            .into_iter()
            .next()
            .map(|g| g.generated_text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(Error::Empty),
    }
}
