// src/services/providers/gemini.rs
use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::ServiceError;
use crate::image::{ImageData, ImageFormat};
use crate::services::providers::{ChatModel, ChatPrompt, ImageEditor};
use crate::services::renderer::{GeneratedImage, RenderRequest};
use crate::services::session_manager::Role;

const SAFETY_FINISH_REASONS: &[&str] = &[
    "SAFETY",
    "IMAGE_SAFETY",
    "IMAGE_PROHIBITED_CONTENT",
    "IMAGE_RECITATION",
    "RECITATION",
    "PROHIBITED_CONTENT",
    "BLOCKLIST",
];

/// `generateContent` endpoint for one model and credential.
struct Endpoint {
    client: Client,
    url: String,
    api_key: String,
    model: String,
}

impl Endpoint {
    fn new(config: &Config, model: &str, api_key: &str) -> Result<Self, ServiceError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ServiceError::ConfigurationMissing(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/models/{}:generateContent", config.api_base, model),
            api_key: api_key.to_string(),
            model: model.to_string(),
        })
    }

    async fn generate(&self, body: &GenerateRequest) -> Result<GenerateResponse, ServiceError> {
        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_failure(status.as_u16(), &text));
        }

        let parsed: GenerateResponse = response.json().await.map_err(transport_error)?;
        if let Some(reason) = parsed
            .prompt_feedback
            .as_ref()
            .and_then(|f| f.block_reason.as_deref())
        {
            return Err(ServiceError::ContentBlocked(format!("prompt blocked: {reason}")));
        }
        if let Some(reason) = parsed
            .candidates
            .first()
            .and_then(|c| c.finish_reason.as_deref())
        {
            if SAFETY_FINISH_REASONS.contains(&reason) {
                return Err(ServiceError::ContentBlocked(format!("finish reason {reason}")));
            }
        }
        Ok(parsed)
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::UpstreamUnavailable("request timed out".into())
    } else {
        ServiceError::UpstreamUnavailable(e.to_string())
    }
}

/// Maps a non-success provider status onto the error taxonomy.
pub fn classify_failure(status: u16, body: &str) -> ServiceError {
    let lower = body.to_lowercase();
    let detail = format!("HTTP {status}: {}", truncate(body, 300));
    match status {
        402 | 429 => ServiceError::QuotaExceeded(detail),
        _ if lower.contains("resource_exhausted") || lower.contains("quota") => {
            ServiceError::QuotaExceeded(detail)
        }
        413 => ServiceError::InvalidImage(detail),
        400 if lower.contains("image") || lower.contains("inline_data") || lower.contains("mime") => {
            ServiceError::InvalidImage(detail)
        }
        _ if lower.contains("safety") || lower.contains("blocked") => {
            ServiceError::ContentBlocked(detail)
        }
        _ => ServiceError::UpstreamUnavailable(detail),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max_chars).collect();
    out.push('…');
    out
}

fn inline(image: &ImageData) -> Part {
    Part::InlineData {
        inline_data: InlineData {
            mime_type: image.format().mime_type().to_string(),
            data: image.to_base64(),
        },
    }
}

pub struct GeminiChatClient {
    endpoint: Endpoint,
}

impl GeminiChatClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: Endpoint::new(config, &config.chat_model, &config.chat_api_key)?,
        })
    }
}

impl GenerateRequest {
    fn for_chat(prompt: &ChatPrompt) -> Self {
        // Consecutive messages of one role travel as a single content entry.
        let mut contents: Vec<Content> = Vec::new();
        for m in &prompt.messages {
            let role = match m.role {
                Role::User => "user",
                Role::Assistant => "model",
            };
            let mut parts = Vec::new();
            if let Some(image) = &m.image {
                parts.push(inline(image));
            }
            parts.push(Part::Text { text: m.text.clone() });

            match contents.last_mut() {
                Some(last) if last.role == Some(role) => last.parts.extend(parts),
                _ => contents.push(Content {
                    role: Some(role),
                    parts,
                }),
            }
        }

        Self {
            system_instruction: Some(Content {
                role: None,
                parts: vec![Part::Text {
                    text: prompt.system.clone(),
                }],
            }),
            contents,
            generation_config: GenerationConfig {
                temperature: 0.7,
                max_output_tokens: Some(1024),
                response_modalities: None,
            },
        }
    }

    fn for_edit(request: &RenderRequest) -> Self {
        let text = format!("{}\n\n{}", request.instruction, request.preserve_constraints);
        Self {
            system_instruction: None,
            contents: vec![Content {
                role: Some("user"),
                parts: vec![inline(&request.source_image), Part::Text { text }],
            }],
            generation_config: GenerationConfig {
                temperature: 0.4,
                max_output_tokens: None,
                response_modalities: Some(vec!["IMAGE", "TEXT"]),
            },
        }
    }
}

#[async_trait]
impl ChatModel for GeminiChatClient {
    fn name(&self) -> &str {
        &self.endpoint.model
    }

    async fn complete(&self, prompt: &ChatPrompt) -> Result<String, ServiceError> {
        let response = self.endpoint.generate(&GenerateRequest::for_chat(prompt)).await?;
        let text = response.text();
        if text.trim().is_empty() {
            return Err(ServiceError::UpstreamUnavailable(
                "chat model returned no text".into(),
            ));
        }
        Ok(text)
    }
}

pub struct GeminiImageClient {
    endpoint: Endpoint,
    max_image_bytes: usize,
}

impl GeminiImageClient {
    pub fn new(config: &Config) -> Result<Self, ServiceError> {
        Ok(Self {
            endpoint: Endpoint::new(config, &config.image_model, &config.image_api_key)?,
            max_image_bytes: config.max_image_bytes,
        })
    }
}

#[async_trait]
impl ImageEditor for GeminiImageClient {
    fn name(&self) -> &str {
        &self.endpoint.model
    }

    async fn edit(&self, request: &RenderRequest) -> Result<GeneratedImage, ServiceError> {
        let start = Instant::now();
        let response = self.endpoint.generate(&GenerateRequest::for_edit(request)).await?;
        let (declared, encoded) = response.first_image().ok_or_else(|| {
            ServiceError::UpstreamUnavailable("no image data in response".into())
        })?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(encoded)
            .map_err(|e| ServiceError::UpstreamUnavailable(format!("undecodable image: {e}")))?;

        Ok(GeneratedImage {
            image: ImageData::generated(
                bytes,
                ImageFormat::from_mime_type(declared),
                self.max_image_bytes,
            )?,
            model: self.endpoint.model.clone(),
            duration_ms: start.elapsed().as_millis() as u64,
        })
    }
}

// Wire types
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<&'static str>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    inline_data: Option<InlineData>,
}

impl GenerateResponse {
    fn parts(&self) -> impl Iterator<Item = &ResponsePart> {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .into_iter()
            .flat_map(|c| c.parts.iter())
    }

    fn text(&self) -> String {
        self.parts()
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    fn first_image(&self) -> Option<(&str, &str)> {
        self.parts()
            .filter_map(|p| p.inline_data.as_ref())
            .find(|d| !d.data.is_empty())
            .map(|d| (d.mime_type.as_str(), d.data.as_str()))
    }
}
