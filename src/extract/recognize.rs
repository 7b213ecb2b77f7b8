use std::sync::Mutex;

use serde::Deserialize;

use super::types::FileKind;
use super::{ExtractError, TextRecognizer};

/// HTTP client for a standalone OCR service.
///
/// Posts the raw file bytes to `<base>/recognize?kind=<kind>` and expects a
/// JSON body with a `text` field back.
pub struct HttpOcrClient {
    base_url: String,
    client: reqwest::blocking::Client,
}

#[derive(Deserialize)]
struct RecognizeResponse {
    text: String,
}

impl HttpOcrClient {
    pub fn new(base_url: &str, timeout_secs: u64) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
        }
    }
}

impl TextRecognizer for HttpOcrClient {
    fn recognize(&self, bytes: &[u8], kind: FileKind) -> Result<String, ExtractError> {
        let url = format!("{}/recognize?kind={}", self.base_url, kind.as_str());

        let response = self
            .client
            .post(&url)
            .header("Content-Type", "application/octet-stream")
            .body(bytes.to_vec())
            .send()
            .map_err(|e| {
                if e.is_connect() {
                    ExtractError::Connection(self.base_url.clone())
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

        let parsed: RecognizeResponse = response
            .json()
            .map_err(|e| ExtractError::ResponseParsing(e.to_string()))?;
        Ok(parsed.text)
    }
}

/// Recognizer used when no OCR endpoint is configured. Every file fails
/// recognition, which the OCR stage turns into per-file placeholders rather
/// than a stage failure.
pub struct UnavailableRecognizer;

impl TextRecognizer for UnavailableRecognizer {
    fn recognize(&self, _bytes: &[u8], _kind: FileKind) -> Result<String, ExtractError> {
        Err(ExtractError::Recognition(
            "OCR endpoint not configured".into(),
        ))
    }
}

/// Scripted recognizer for tests: returns the queued results in call order,
/// then errors once the script is exhausted.
pub struct MockRecognizer {
    script: Mutex<Vec<Result<String, String>>>,
}

impl MockRecognizer {
    pub fn new(script: Vec<Result<String, String>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }

    /// Recognizer that answers the same text for every call.
    pub fn always(text: &str) -> Self {
        Self::new(vec![Ok(text.to_string()); 64])
    }
}

impl TextRecognizer for MockRecognizer {
    fn recognize(&self, _bytes: &[u8], _kind: FileKind) -> Result<String, ExtractError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return Err(ExtractError::Recognition("mock script exhausted".into()));
        }
        script.remove(0).map_err(ExtractError::Recognition)
    }
}
