use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;

use crate::models::content::NormalizedProduct;

pub const GENERATE_ENDPOINT: &str = "workers-ai/run";

/// Produces structured rich content for a normalized product.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate(&self, input: &NormalizedProduct) -> Result<Value, GeneratorError>;
}

#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("Generator request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Generator rate limit exceeded")]
    RateLimited,

    #[error("Generator returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Generator output is not valid rich-content JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

impl GeneratorError {
    pub fn status(&self) -> i32 {
        match self {
            GeneratorError::Http(e) => e.status().map(|s| s.as_u16() as i32).unwrap_or(502),
            GeneratorError::RateLimited => 429,
            GeneratorError::Status { status, .. } => *status as i32,
            GeneratorError::Parse(_) => 422,
        }
    }
}

/// Client for a Cloudflare Workers AI text model.
pub struct WorkersAiGenerator {
    http: Client,
    account_id: String,
    api_token: String,
    model: String,
}

#[derive(Deserialize)]
struct RunResponse {
    result: RunResult,
}

#[derive(Deserialize)]
struct RunResult {
    response: String,
}

impl WorkersAiGenerator {
    pub fn new(account_id: String, api_token: String, model: String) -> Self {
        Self {
            http: Client::new(),
            account_id,
            api_token,
            model,
        }
    }
}

fn build_prompt(input: &NormalizedProduct) -> Result<String, serde_json::Error> {
    let product = serde_json::to_string_pretty(input)?;
    Ok(format!(
        concat!(
            "You write rich product content for an Ozon marketplace card. ",
            "Using the product data below, return ONLY a JSON object in Ozon rich-content format: ",
            "{{\"content\": [ widgets ], \"version\": 0.3}}. ",
            "Use \"raShowcase\" and \"raTextBlock\" widgets, reference only the listed image URLs, ",
            "and write in the language of the product name.\n\nProduct:\n{}"
        ),
        product
    ))
}

/// Pull the JSON object out of a model reply that may be fenced or padded with prose.
pub fn extract_json(reply: &str) -> Result<Value, serde_json::Error> {
    let trimmed = reply.trim();
    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };
    serde_json::from_str(candidate)
}

#[async_trait]
impl ContentGenerator for WorkersAiGenerator {
    async fn generate(&self, input: &NormalizedProduct) -> Result<Value, GeneratorError> {
        let url = format!(
            "https://api.cloudflare.com/client/v4/accounts/{}/ai/run/{}",
            self.account_id, self.model
        );

        let request_body = serde_json::json!({
            "messages": [
                { "role": "system", "content": "You are a marketplace copywriter. Reply with JSON only." },
                { "role": "user", "content": build_prompt(input)? },
            ],
            "max_tokens": 2048
        });

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&request_body)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(GeneratorError::RateLimited);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let run: RunResponse = response.json().await?;
        Ok(extract_json(&run.result.response)?)
    }
}
