//! Chat-completions client for the vision model that reads scanned pages.
//!
//! Speaks the OpenAI-compatible `/chat/completions` protocol, so the same
//! client works against OpenAI or any gateway exposing that API.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::Settings;

/// Instruction sent alongside the page images.
pub const USER_INSTRUCTION: &str =
    "Analyze this Romanian insolvency document and extract the required fields as JSON.";

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("OPENAI_API_KEY not configured on server")]
    MissingApiKey,
    #[error("failed to reach vision model: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("vision model API error ({status}): {body}")]
    Api { status: u16, body: String },
    #[error("no response received from vision model")]
    EmptyResponse,
}

/// "Send N images plus a system prompt, get back the model's JSON text."
#[async_trait::async_trait]
pub trait VisionModel: Send + Sync {
    fn name(&self) -> &str;

    /// Returns the raw message content; parsing is the caller's job.
    async fn complete(&self, system_prompt: &str, images: &[String]) -> Result<String, VisionError>;
}

/// Chat-completions client.
#[derive(Clone)]
pub struct ChatVisionClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
    image_detail: String,
}

impl ChatVisionClient {
    /// Build from settings, reading the API key from `OPENAI_API_KEY`.
    pub fn from_settings(settings: &Settings) -> Result<Self, VisionError> {
        let api_key = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or(VisionError::MissingApiKey)?;
        Ok(Self::new(settings, api_key))
    }

    pub fn new(settings: &Settings, api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_url: settings.api_url.clone(),
            api_key: api_key.into(),
            model: settings.model.clone(),
            max_tokens: settings.max_tokens,
            image_detail: settings.image_detail.clone(),
        }
    }

    fn build_request(&self, system_prompt: &str, images: &[String]) -> ChatCompletionRequest {
        ChatCompletionRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(system_prompt),
                Message::user_with_images(USER_INSTRUCTION, images, &self.image_detail),
            ],
            max_tokens: Some(self.max_tokens),
            response_format: Some(ResponseFormat::JsonObject),
        }
    }
}

#[async_trait::async_trait]
impl VisionModel for ChatVisionClient {
    fn name(&self) -> &str {
        &self.model
    }

    async fn complete(&self, system_prompt: &str, images: &[String]) -> Result<String, VisionError> {
        let request = self.build_request(system_prompt, images);
        debug!(
            "Sending request to vision model: model={}, images={}",
            request.model,
            images.len()
        );

        let response = self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let response: ChatCompletionResponse = response.json().await?;

        if let Some(usage) = &response.usage {
            info!(
                "Vision model response: {} tokens (prompt: {}, completion: {})",
                usage.total_tokens, usage.prompt_tokens, usage.completion_tokens
            );
        }

        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(VisionError::EmptyResponse)
    }
}

/// Encode raw image bytes as a `data:` URL.
pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ResponseFormat {
    JsonObject,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    prompt_tokens: u32,
    completion_tokens: u32,
    total_tokens: u32,
}

// ============================================================================
// Message types
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageUrl {
    pub url: String,
    pub detail: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: MessageContent::Text(content.into()),
        }
    }

    /// User message with instruction text followed by one part per image URL.
    pub fn user_with_images(text: impl Into<String>, images: &[String], detail: &str) -> Self {
        let mut parts = vec![ContentPart::Text { text: text.into() }];
        parts.extend(images.iter().map(|url| ContentPart::ImageUrl {
            image_url: ImageUrl {
                url: url.clone(),
                detail: detail.to_string(),
            },
        }));

        Self {
            role: Role::User,
            content: MessageContent::Parts(parts),
        }
    }
}
