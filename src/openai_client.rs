use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use log::{debug, info};
use serde::Deserialize;
use serde_json::json;

use crate::config::OpenAiConfig;
use crate::error::{describe_transport, DigestError, DigestResult};

const GENERATION_TIMEOUT: Duration = Duration::from_secs(30);
const TEMPERATURE: f64 = 0.3;

/// A chat-style text-generation service asked for a JSON object reply
pub trait TextGenerator: Send + Sync {
    /// Returns the raw content of the first choice
    fn generate<'a>(&'a self, system: &'a str, prompt: &'a str)
        -> Pin<Box<dyn Future<Output = DigestResult<String>> + Send + 'a>>;
}

/// OpenAI chat-completions client
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    endpoint: String,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatApiResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

impl OpenAiClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        OpenAiClient {
            http,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
        }
    }

    pub async fn complete(&self, system: &str, prompt: &str) -> DigestResult<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| DigestError::Generation("OPENAI_API_KEY is not set".to_string()))?;

        info!("Requesting digest from {}", self.model);

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .timeout(GENERATION_TIMEOUT)
            .json(&json!({
                "model": &self.model,
                "temperature": TEMPERATURE,
                "response_format": { "type": "json_object" },
                "messages": [
                    { "role": "system", "content": system },
                    { "role": "user", "content": prompt }
                ]
            }))
            .send()
            .await
            .map_err(|e| DigestError::Generation(describe_transport(&e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            debug!("Chat API error body: {}", body);
            return Err(DigestError::Generation(format!(
                "chat API returned {}",
                status.as_u16()
            )));
        }

        let parsed = response
            .json::<ChatApiResponse>()
            .await
            .map_err(|e| DigestError::Generation(describe_transport(&e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| DigestError::Generation("no content in chat response".to_string()))
    }
}

impl TextGenerator for OpenAiClient {
    fn generate<'a>(&'a self, system: &'a str, prompt: &'a str)
        -> Pin<Box<dyn Future<Output = DigestResult<String>> + Send + 'a>> {
        Box::pin(self.complete(system, prompt))
    }
}
