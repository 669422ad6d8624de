use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::config::{GeminiSettings, mask_key};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Every way a chat answer can fail. Callers show the user a single
/// unavailability message and keep [`ChatError::detail`] for diagnostics.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error("GEMINI_API_KEY not configured on the server")]
    MissingApiKey,

    #[error("could not load events: {0}")]
    Events(String),

    #[error("Gemini call failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Gemini API returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Gemini returned no text")]
    EmptyResponse,
}

impl ChatError {
    /// The `Error:`-prefixed sentinel string shown next to the friendly message.
    pub fn detail(&self) -> String {
        format!("Error: {self}")
    }
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Minimal client for the Gemini `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(settings: &GeminiSettings) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;

        match &settings.api_key {
            Some(key) => info!("Gemini client ready (model: {}, key: {})", settings.model, mask_key(key)),
            None => info!("Gemini client has no API key; chat will report unavailable"),
        }

        Ok(Self {
            http,
            api_key: settings.api_key.clone(),
            model: settings.model.clone(),
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    pub async fn generate(&self, prompt: &str) -> Result<String, ChatError> {
        let api_key = self.api_key.as_deref().ok_or(ChatError::MissingApiKey)?;

        let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        debug!("Sending {} byte prompt to {}", prompt.len(), self.model);
        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Api { status, body });
        }

        let data: GenerateResponse = resp.json().await?;
        extract_text(data).ok_or(ChatError::EmptyResponse)
    }
}

fn extract_text(data: GenerateResponse) -> Option<String> {
    let content = data.candidates.into_iter().next()?.content?;
    let text: String = content.parts.into_iter().filter_map(|p| p.text).collect();
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Option<String> {
        extract_text(serde_json::from_str(json).unwrap())
    }

    #[test]
    fn first_candidate_parts_are_joined() {
        let json = r#"{"candidates":[
            {"content":{"parts":[{"text":"  The career fair "},{"text":"is on Friday.\n"}]}},
            {"content":{"parts":[{"text":"ignored"}]}}
        ]}"#;
        assert_eq!(parse(json).as_deref(), Some("The career fair is on Friday."));
    }

    #[test]
    fn blocked_or_empty_responses_have_no_text() {
        assert_eq!(parse(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"finishReason":"SAFETY"}]}"#), None);
        assert_eq!(parse(r#"{"candidates":[{"content":{"parts":[{"text":"   "}]}}]}"#), None);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let client = GeminiClient::new(&GeminiSettings::default()).unwrap();
        assert!(!client.is_configured());

        let err = client.generate("hello").await.unwrap_err();
        assert!(matches!(err, ChatError::MissingApiKey));
        assert!(err.detail().starts_with("Error: "));
    }
}
