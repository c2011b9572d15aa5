use std::time::Instant;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use photostudio_proto::{
    GenerationFailure, GenerationRequest, GenerationResult, ImageGenerator, ImagePayload,
    SafetyPolicy,
};
use reqwest::{Client, StatusCode};
use tracing::{debug, info, warn};

use crate::config::GeminiConfig;
use crate::error::{GeminiError, Result};
use crate::types::*;

/// Persona sent as the system instruction of every call.
pub const SYSTEM_INSTRUCTION: &str = "You are a professional AI Photo Editor. \
    Merge the face from Image 1 into Image 2's style. Maintain facial identity exactly. \
    High-quality cinematic output.";

const REGION_MARKER: &str = "User location is not supported";

const PERMISSIVE_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

pub struct GeminiClient {
    client: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client with configuration
    pub fn new(config: GeminiConfig) -> Result<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self { client, config })
    }

    /// Create a client from environment variables
    pub fn from_env() -> Result<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Runs one `generateContent` call and returns the first image part.
    pub async fn generate_content(&self, request: &GenerationRequest) -> Result<ImagePayload> {
        let body = build_request(request);
        debug!(
            model = %self.config.model,
            images = request.images.len(),
            "Calling generateContent"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .header("accept", "application/json")
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| GeminiError::HttpError(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GeminiError::HttpError(e.without_url()))?;

        if !status.is_success() {
            return Err(classify_error(status, &text, &self.config.model));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&text)
            .map_err(|e| GeminiError::InvalidResponse(e.to_string()))?;
        extract_image(&parsed)
    }
}

#[async_trait]
impl ImageGenerator for GeminiClient {
    async fn generate(&self, request: &GenerationRequest) -> GenerationResult {
        let started = Instant::now();
        match self.generate_content(request).await {
            Ok(image) => {
                info!(
                    bytes = image.len(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "Gemini returned an image"
                );
                Ok(image)
            }
            Err(e) => {
                warn!(error = %e, "Gemini generation failed");
                Err(GenerationFailure::from(e))
            }
        }
    }
}

/// Builds the wire request: prompt text first, then the images in order.
pub fn build_request(request: &GenerationRequest) -> GenerateContentRequest {
    let mut parts = Vec::with_capacity(request.images.len() + 1);
    parts.push(Part::text(request.prompt.as_str()));
    parts.extend(
        request
            .images
            .iter()
            .map(|image| Part::inline(image.mime_type.as_str(), STANDARD.encode(&image.data))),
    );

    let safety_settings = match request.safety {
        SafetyPolicy::Permissive => PERMISSIVE_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: (*category).to_string(),
                threshold: "BLOCK_NONE".to_string(),
            })
            .collect(),
        SafetyPolicy::BackendDefault => Vec::new(),
    };

    GenerateContentRequest {
        system_instruction: Content {
            role: None,
            parts: vec![Part::text(SYSTEM_INSTRUCTION)],
        },
        contents: vec![Content {
            role: Some("user".to_string()),
            parts,
        }],
        safety_settings,
        generation_config: GenerationConfig {
            response_modalities: vec!["TEXT".to_string(), "IMAGE".to_string()],
        },
    }
}

/// Maps a non-success response to an error. Never echoes request headers.
pub fn classify_error(status: StatusCode, body: &str, model: &str) -> GeminiError {
    if status == StatusCode::FORBIDDEN || body.contains(REGION_MARKER) {
        return GeminiError::RegionRestricted;
    }
    if status == StatusCode::NOT_FOUND {
        return GeminiError::ModelNotFound(model.to_string());
    }

    let message = serde_json::from_str::<ApiErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.chars().take(200).collect());
    GeminiError::ApiError {
        status: status.as_u16(),
        message,
    }
}

/// Picks the first inline image of the first candidate.
pub fn extract_image(response: &GenerateContentResponse) -> Result<ImagePayload> {
    if let Some(reason) = response
        .prompt_feedback
        .as_ref()
        .and_then(|f| f.block_reason.as_deref())
    {
        return Err(GeminiError::NoImage(format!("prompt blocked: {reason}")));
    }

    let Some(candidate) = response.candidates.first() else {
        return Err(GeminiError::NoImage("no candidates".to_string()));
    };

    let inline = candidate
        .content
        .as_ref()
        .and_then(|c| c.parts.iter().find_map(|p| p.inline_data.as_ref()));
    let Some(inline) = inline else {
        let reason = candidate.finish_reason.as_deref().unwrap_or("no image part");
        return Err(GeminiError::NoImage(reason.to_string()));
    };

    let data = STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|e| GeminiError::InvalidResponse(format!("bad image data: {e}")))?;
    if data.is_empty() {
        return Err(GeminiError::NoImage("empty image data".to_string()));
    }
    Ok(ImagePayload::new(inline.mime_type.as_str(), data))
}
