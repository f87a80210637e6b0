use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::future::Future;

const SYSTEM_PROMPT: &str = "You are a helpful assistant that responds in JSON format.";

/// Raw text-in, text-out inference backend.
pub trait LanguageModel: Send + Sync {
    fn infer(&self, prompt: &str) -> impl Future<Output = Result<String>> + Send;
}

/// Connection parameters for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub base_url: String,
    pub model_id: String,
    pub api_key: Option<String>,
    pub temperature: Option<f32>,
}

#[derive(Clone)]
pub struct OpenAiClient {
    settings: ModelSettings,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

impl OpenAiClient {
    pub fn new(settings: ModelSettings) -> Self {
        Self {
            settings,
            client: reqwest::Client::new(),
        }
    }

    pub fn model_id(&self) -> &str {
        &self.settings.model_id
    }

    pub async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!(
            "{}/chat/completions",
            self.settings.base_url.trim_end_matches('/')
        );

        let request = ChatRequest {
            model: &self.settings.model_id,
            messages: vec![
                ChatMessage { role: "system", content: SYSTEM_PROMPT },
                ChatMessage { role: "user", content: prompt },
            ],
            temperature: self.settings.temperature,
        };

        let mut builder = self.client.post(&url).json(&request);
        if let Some(key) = &self.settings.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .context("Failed to send request to inference endpoint")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Inference request failed: {} {}", status, body);
        }

        let chat_response: ChatResponse = response
            .json()
            .await
            .context("Failed to parse inference response")?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Inference response contained no message content")
    }
}

impl LanguageModel for OpenAiClient {
    async fn infer(&self, prompt: &str) -> Result<String> {
        self.generate(prompt).await
    }
}
