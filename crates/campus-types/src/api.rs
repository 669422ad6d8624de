use serde::{Deserialize, Serialize};

// -- JWT Claims --

/// Claims carried by the `access_token` cookie. `sub` is the user's email.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}

// -- Auth forms --

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub email: String,
    pub password: String,
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
}

impl RegisterForm {
    /// Browsers submit an empty string for a blank optional input.
    pub fn full_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// OAuth2-style password form: the `username` field carries the email.
/// Extra fields such as `grant_type` or `scope` are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Subscriptions --

#[derive(Debug, Deserialize)]
pub struct SubscribeForm {
    pub email: String,
}

// -- Chat --

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ChatQuery {
    pub question: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AgentRequest {
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatResponse {
    pub response: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatErrorResponse {
    pub error: String,
    pub detail: String,
}

// -- Events --

#[derive(Debug, Default, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub interests: String,
}

// -- Debug --

#[derive(Debug, Serialize, Deserialize)]
pub struct GeminiStatus {
    pub gemini_present: bool,
    pub value_masked: Option<String>,
}
