use serde::{Deserialize, Serialize};

use super::parser::parse_fields_response;
use super::prompt::build_extraction_prompt;
use super::types::{ExtractedFields, FieldExtraction};
use super::{ExtractError, FieldExtractor};

/// Low temperature keeps extraction answers consistent across retries.
const EXTRACTION_TEMPERATURE: f32 = 0.1;
const EXTRACTION_MAX_TOKENS: u32 = 2000;

/// HTTP client for an OpenAI-compatible chat completions endpoint
/// (Qwen/DashScope compatible mode, or any drop-in equivalent).
pub struct ChatCompletionsClient {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl ChatCompletionsClient {
    pub fn new(base_url: &str, api_key: &str, model: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            model: model.to_string(),
            client,
            timeout_secs,
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
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
    content: String,
}

impl FieldExtractor for ChatCompletionsClient {
    fn extract_fields(&self, text: &str) -> Result<FieldExtraction, ExtractError> {
        let url = format!("{}/chat/completions", self.base_url);
        let prompt = build_extraction_prompt(text);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: &prompt,
            }],
            temperature: EXTRACTION_TEMPERATURE,
            max_tokens: EXTRACTION_MAX_TOKENS,
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractError::Connection(self.base_url.clone())
                } else if e.is_timeout() {
                    ExtractError::HttpClient(format!(
                        "Request timed out after {}s",
                        self.timeout_secs
                    ))
                } else {
                    ExtractError::HttpClient(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ExtractError::ApiStatus {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .map_err(|e| ExtractError::ResponseParsing(e.to_string()))?;
        let answer = parsed
            .choices
            .first()
            .map(|c| c.message.content.as_str())
            .ok_or_else(|| ExtractError::ResponseParsing("empty choices array".into()))?;

        // Malformed answer content is NOT an error: the parser falls back
        // to all-null fields and the stage completes.
        Ok(FieldExtraction {
            fields: parse_fields_response(answer),
            model_version: self.model.clone(),
        })
    }
}

/// Extractor used when no chat completions endpoint is configured. Every
/// attempt fails, which reverts the contract to `pending_ai` for a later
/// resubmission once the endpoint is set up.
pub struct UnavailableExtractor;

impl FieldExtractor for UnavailableExtractor {
    fn extract_fields(&self, _text: &str) -> Result<FieldExtraction, ExtractError> {
        Err(ExtractError::Connection(
            "chat completions endpoint not configured".into(),
        ))
    }
}

/// Mock field extractor for testing — returns configured fields or fails.
pub struct MockFieldExtractor {
    fields: ExtractedFields,
    model_version: String,
    fail: bool,
}

impl MockFieldExtractor {
    pub fn new(fields: ExtractedFields) -> Self {
        Self {
            fields,
            model_version: "mock-extractor".into(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fields: ExtractedFields::default(),
            model_version: "mock-extractor".into(),
            fail: true,
        }
    }
}

impl FieldExtractor for MockFieldExtractor {
    fn extract_fields(&self, _text: &str) -> Result<FieldExtraction, ExtractError> {
        if self.fail {
            return Err(ExtractError::Connection("mock endpoint down".into()));
        }
        Ok(FieldExtraction {
            fields: self.fields.clone(),
            model_version: self.model_version.clone(),
        })
    }
}
