use crate::core::config::Config;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Text-analysis collaborator. Every call in this crate expects the reply
/// to be a JSON document, so both clients request JSON output mode.
#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn chat(&self, system: &str, user: &str) -> Result<String>;
}

pub fn create_llm(config: &Config) -> Result<Box<dyn LlmClient>> {
    match config.llm.provider.as_str() {
        "gemini" => {
            let cfg = config.llm.gemini.as_ref().context("Gemini config missing")?;
            Ok(Box::new(GeminiClient::new(&cfg.api_key, &cfg.model)))
        }
        "openai" => {
            let cfg = config.llm.openai.as_ref().context("OpenAI config missing")?;
            Ok(Box::new(OpenAIClient::new(
                &cfg.api_key,
                &cfg.model,
                cfg.base_url.as_deref(),
            )))
        }
        _ => Err(anyhow!("Unknown LLM provider: {}", config.llm.provider)),
    }
}

// --- Gemini ---

#[derive(Debug)]
struct GeminiClient {
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl GeminiClient {
    fn new(api_key: &str, model: &str) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest {
    contents: Vec<ChatContent>,
    #[serde(rename = "systemInstruction")]
    system_instruction: ChatSystemInstruction,
    #[serde(rename = "generationConfig")]
    generation_config: ChatGenerationConfig,
}

#[derive(Serialize)]
struct ChatContent {
    role: String,
    parts: Vec<ChatPart>,
}

#[derive(Serialize)]
struct ChatSystemInstruction {
    parts: Vec<ChatPart>,
}

#[derive(Serialize)]
struct ChatPart {
    text: String,
}

#[derive(Serialize)]
struct ChatGenerationConfig {
    #[serde(rename = "responseMimeType")]
    response_mime_type: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    candidates: Option<Vec<ChatCandidate>>,
    error: Option<ApiError>,
}

#[derive(Deserialize)]
struct ChatCandidate {
    content: Option<ChatCandidateContent>,
    #[serde(rename = "finishReason")]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct ChatCandidateContent {
    #[serde(default)]
    parts: Vec<ChatResponsePart>,
}

#[derive(Deserialize)]
struct ChatResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize, Debug)]
struct ApiError {
    message: String,
}

/// Pulls the reply text out of a parsed response. Multi-part candidates
/// are concatenated; a candidate without text surfaces its finish reason.
fn extract_chat_text(response: ChatResponse) -> Result<String> {
    if let Some(err) = response.error {
        return Err(anyhow!("Gemini API returned error: {}", err.message));
    }

    let candidate = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini response contained no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.is_empty() {
        let reason = candidate.finish_reason.as_deref().unwrap_or("UNKNOWN");
        return Err(anyhow!("Gemini response empty. Finish reason: {}", reason));
    }

    Ok(text)
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
            self.model, self.api_key
        );

        let request_body = ChatRequest {
            contents: vec![ChatContent {
                role: "user".to_string(),
                parts: vec![ChatPart {
                    text: user.to_string(),
                }],
            }],
            system_instruction: ChatSystemInstruction {
                parts: vec![ChatPart {
                    text: system.to_string(),
                }],
            },
            generation_config: ChatGenerationConfig {
                response_mime_type: "application/json".to_string(),
            },
        };

        let resp = self.client.post(&url).json(&request_body).send().await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("Gemini API error: {}", error_text));
        }

        // Keep the raw body around so parse failures are debuggable.
        let response_text = resp.text().await?;
        let response: ChatResponse = serde_json::from_str(&response_text).map_err(|e| {
            anyhow!(
                "Failed to parse Gemini response: {}. Body: {}",
                e,
                response_text
            )
        })?;

        extract_chat_text(response)
    }
}

// --- OpenAI (and OpenAI-compatible servers via base_url) ---

#[derive(Debug)]
struct OpenAIClient {
    api_key: String,
    model: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    fn new(api_key: &str, model: &str, base_url: Option<&str>) -> Self {
        Self {
            api_key: api_key.to_string(),
            model: model.to_string(),
            base_url: base_url
                .unwrap_or("https://api.openai.com/v1")
                .trim_end_matches('/')
                .to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<CompletionMessage>,
    response_format: ResponseFormat,
}

#[derive(Serialize)]
struct CompletionMessage {
    role: String,
    content: String,
}

#[derive(Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    message: CompletionMessageResponse,
}

#[derive(Deserialize)]
struct CompletionMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn chat(&self, system: &str, user: &str) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);

        let request_body = CompletionRequest {
            model: self.model.clone(),
            messages: vec![
                CompletionMessage {
                    role: "system".to_string(),
                    content: system.to_string(),
                },
                CompletionMessage {
                    role: "user".to_string(),
                    content: user.to_string(),
                },
            ],
            response_format: ResponseFormat {
                kind: "json_object".to_string(),
            },
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI API error: {}", error_text));
        }

        let result: CompletionResponse = resp.json().await?;
        result
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("OpenAI response empty or missing content"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_text_success() {
        let json = r#"{
            "candidates": [
                {
                    "content": {
                        "parts": [
                            { "text": "{\"ok\":" },
                            { "text": " true}" }
                        ],
                        "role": "model"
                    },
                    "finishReason": "STOP",
                    "index": 0
                }
            ]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        assert_eq!(extract_chat_text(response).unwrap(), "{\"ok\": true}");
    }

    #[test]
    fn test_chat_text_safety_block() {
        // Blocked candidates come back without content at all.
        let json = r#"{
            "candidates": [
                {
                    "finishReason": "SAFETY",
                    "index": 0
                }
            ]
        }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let err = extract_chat_text(response).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_chat_text_api_error() {
        let json = r#"{ "error": { "message": "quota exceeded", "code": 429 } }"#;

        let response: ChatResponse = serde_json::from_str(json).unwrap();
        let err = extract_chat_text(response).unwrap_err();
        assert!(err.to_string().contains("quota exceeded"));
    }

    #[test]
    fn test_chat_text_no_candidates() {
        let response: ChatResponse = serde_json::from_str("{}").unwrap();
        assert!(extract_chat_text(response).is_err());
    }

    #[test]
    fn test_openai_response_parsing_success() {
        let json = r#"{
            "id": "chatcmpl-123",
            "object": "chat.completion",
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": "{\"scenes\": []}"
                },
                "finish_reason": "stop"
            }]
        }"#;

        let result: CompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            result.choices[0].message.content.as_deref(),
            Some("{\"scenes\": []}")
        );
    }

    #[test]
    fn test_openai_response_null_content() {
        let json = r#"{
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": null },
                "finish_reason": "stop"
            }]
        }"#;

        let result: CompletionResponse = serde_json::from_str(json).unwrap();
        assert!(result.choices[0].message.content.is_none());
    }
}
