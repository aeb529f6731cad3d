use crate::core::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Ratios the generation API accepts. Anything else must be rejected
/// before a request is issued.
pub const SUPPORTED_ASPECT_RATIOS: [&str; 5] = ["16:9", "9:16", "1:1", "4:3", "3:4"];

pub const DEFAULT_ASPECT_RATIO: &str = "16:9";

pub fn validate_aspect_ratio(value: &str) -> Result<()> {
    if SUPPORTED_ASPECT_RATIOS.contains(&value) {
        Ok(())
    } else {
        Err(anyhow!(
            "Unsupported aspect ratio '{}'. Supported values: {}",
            value,
            SUPPORTED_ASPECT_RATIOS.join(", ")
        ))
    }
}

/// Image-generation collaborator. Returns the generated image as a
/// `data:<mime>;base64,<data>` payload.
#[async_trait]
pub trait ImageClient: Send + Sync + Debug {
    async fn generate(
        &self,
        prompt: &str,
        character_context: &str,
        style: &str,
        aspect_ratio: &str,
    ) -> Result<String>;
}

pub fn create_image_client(config: &Config) -> Result<Box<dyn ImageClient>> {
    match config.image.provider.as_str() {
        "gemini" => {
            let cfg = config
                .image
                .gemini
                .as_ref()
                .context("Gemini image config missing")?;
            Ok(Box::new(GeminiImageClient::new(&cfg.api_key, &cfg.model)))
        }
        _ => Err(anyhow!("Unknown image provider: {}", config.image.provider)),
    }
}

// --- Gemini ---

#[derive(Debug)]
struct GeminiImageClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiImageClient {
    fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ImageRequest {
    contents: Vec<ImageContent>,
    #[serde(rename = "generationConfig")]
    generation_config: ImageGenerationConfig,
}

#[derive(Serialize)]
struct ImageContent {
    parts: Vec<ImagePart>,
}

#[derive(Serialize)]
struct ImagePart {
    text: String,
}

#[derive(Serialize)]
struct ImageGenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
    #[serde(rename = "imageConfig")]
    image_config: ImageSizeConfig,
}

#[derive(Serialize)]
struct ImageSizeConfig {
    #[serde(rename = "aspectRatio")]
    aspect_ratio: String,
}

#[derive(Deserialize)]
struct ImageResponse {
    candidates: Option<Vec<ImageCandidate>>,
    error: Option<ImageApiError>,
}

#[derive(Deserialize)]
struct ImageCandidate {
    content: Option<ImageCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ImageCandidateContent {
    #[serde(default)]
    parts: Vec<ImageResponsePart>,
}

#[derive(Deserialize)]
struct ImageResponsePart {
    #[serde(rename = "inlineData")]
    inline_data: Option<InlineData>,
}

#[derive(Deserialize)]
struct InlineData {
    #[serde(rename = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Deserialize, Debug)]
struct ImageApiError {
    message: String,
}

/// One combined instruction: the scene prompt plus the scoped character
/// context and the run-wide style.
fn compose_prompt(prompt: &str, character_context: &str, style: &str) -> String {
    format!(
        "{}\n\nCharacters in this scene: {}\nVisual style: {}\n\
        Keep every character's appearance consistent with its description.",
        prompt, character_context, style
    )
}

/// First inline-data part of the first candidate wins. A candidate with
/// only text parts is a failure carrying the finish reason.
fn extract_image_payload(response: ImageResponse) -> Result<String> {
    if let Some(err) = response.error {
        return Err(anyhow!("Gemini API returned error: {}", err.message));
    }

    let candidate = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini response contained no candidates"))?;

    if let Some(content) = &candidate.content {
        for part in &content.parts {
            if let Some(inline) = &part.inline_data {
                if !inline.data.is_empty() {
                    return Ok(format!("data:{};base64,{}", inline.mime_type, inline.data));
                }
            }
        }
    }

    let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
    Err(anyhow!("Gemini returned no image data. Finish reason: {}", reason))
}

#[async_trait]
impl ImageClient for GeminiImageClient {
    async fn generate(
        &self,
        prompt: &str,
        character_context: &str,
        style: &str,
        aspect_ratio: &str,
    ) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = ImageRequest {
            contents: vec![ImageContent {
                parts: vec![ImagePart {
                    text: compose_prompt(prompt, character_context, style),
                }],
            }],
            generation_config: ImageGenerationConfig {
                response_modalities: vec!["IMAGE".to_string()],
                image_config: ImageSizeConfig {
                    aspect_ratio: aspect_ratio.to_string(),
                },
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error: {}", error_text));
        }

        let response_text = resp.text().await?;
        let response: ImageResponse = serde_json::from_str(&response_text).map_err(|e| {
            anyhow!(
                "Failed to parse Gemini response: {}. Body: {}",
                e,
                response_text
            )
        })?;

        extract_image_payload(response)
    }
}
