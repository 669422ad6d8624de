use axum::{Json, extract::State};
use campus_types::api::GeminiStatus;

use crate::AppState;
use crate::config::mask_key;

/// GET /debug/gemini: whether a Gemini key is configured, masked.
pub async fn gemini_status(State(state): State<AppState>) -> Json<GeminiStatus> {
    let key = state.config.gemini.api_key.as_deref();
    Json(GeminiStatus {
        gemini_present: key.is_some(),
        value_masked: key.map(mask_key),
    })
}

/// GET /test-static
pub async fn test_static() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "message": "Static files should be accessible at /static/style.css"
    }))
}

/// GET /health
pub async fn health() -> &'static str {
    "ok"
}
