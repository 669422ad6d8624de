use axum::{
    Json,
    extract::{Form, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use campus_types::api::{AgentRequest, ChatErrorResponse, ChatForm, ChatQuery, ChatResponse};
use campus_types::models::{CurrentUser, EventCard};
use tracing::{error, warn};

use crate::AppState;
use crate::error::AppError;
use crate::events::today;
use crate::gemini::ChatError;
use crate::middleware::MaybeUser;
use crate::pages::{self, ChatView};

/// Shown on the chat page whenever an answer could not be produced.
pub const UNAVAILABLE_PAGE_MESSAGE: &str =
    "The AI assistant is not available right now. Please ensure GEMINI_API_KEY is configured.";

/// Returned by the JSON API whenever an answer could not be produced.
pub const UNAVAILABLE_API_MESSAGE: &str = "AI assistant unavailable. Please configure GEMINI_API_KEY.";

const HISTORY_LIMIT: u32 = 5;

const EMPTY_MESSAGE: &str = "Message must not be empty";

const SYSTEM_PROMPT: &str = "\
You are an AI assistant for a Campus Event Notifier system. Your role is to help students
discover and learn about upcoming campus events. You should be friendly, informative, and
engaging while providing accurate information about events.

When users ask about events, you should:
1. Provide specific details about event names, dates, locations, and descriptions
2. Help users find events based on their interests or time preferences
3. Suggest relevant events based on their queries
4. Be conversational and ask follow-up questions to better understand their needs

Always be helpful, accurate, and maintain a positive tone. If you don't have information
about a specific event, politely let them know and suggest alternatives.";

pub fn format_events_for_prompt(events: &[EventCard]) -> String {
    if events.is_empty() {
        return "No upcoming events found.".into();
    }

    let mut formatted = String::from("Here are the upcoming campus events:\n\n");
    for (i, event) in events.iter().enumerate() {
        formatted.push_str(&format!(
            "{}. **{}**\n   - Date: {}\n   - Location: {}\n   - Description: {}\n\n",
            i + 1,
            event.name,
            event.date,
            event.location,
            event.description,
        ));
    }
    formatted
}

pub fn build_prompt(events_context: &str, question: &str) -> String {
    format!(
        "{SYSTEM_PROMPT}

Current events information:
{events_context}

User question: {question}

Please provide a helpful, accurate response about the campus events based on the user's question.
If they're asking about specific types of events or time periods, help them find relevant information."
    )
}

/// Answers a question with the upcoming events as context.
pub async fn answer(state: &AppState, question: &str) -> Result<String, ChatError> {
    let events = state
        .events
        .upcoming(today(), state.config.chat_event_limit)
        .map_err(|e| ChatError::Events(format!("{:#}", e)))?;

    let prompt = build_prompt(&format_events_for_prompt(&events), question);
    state.gemini.generate(&prompt).await
}

fn require_message(message: &str) -> Result<&str, AppError> {
    let message = message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest(EMPTY_MESSAGE.into()));
    }
    Ok(message)
}

fn history(state: &AppState, user: Option<&CurrentUser>) -> Vec<(String, String)> {
    let Some(user) = user else {
        return vec![];
    };

    match state.db.recent_chat_messages(user.id, HISTORY_LIMIT) {
        Ok(rows) => rows.into_iter().map(|r| (r.message, r.response)).collect(),
        Err(e) => {
            warn!("Could not load chat history for user {}: {:#}", user.id, e);
            vec![]
        }
    }
}

// -- Handlers --

/// GET /chat
pub async fn chat_page(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Query(query): Query<ChatQuery>,
) -> Html<String> {
    let history = history(&state, user.as_ref());
    Html(pages::chat(&ChatView {
        user: user.as_ref(),
        initial_question: query.question.as_deref(),
        history: &history,
        ..ChatView::default()
    }))
}

/// POST /chat, the HTML form.
pub async fn chat_form(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<ChatForm>,
) -> Result<Response, AppError> {
    let message = match require_message(&form.message) {
        Ok(message) => message,
        Err(AppError::BadRequest(problem)) => {
            let history = history(&state, user.as_ref());
            let page = pages::chat(&ChatView {
                user: user.as_ref(),
                error: Some(&problem),
                history: &history,
                ..ChatView::default()
            });
            return Ok((StatusCode::BAD_REQUEST, Html(page)).into_response());
        }
        Err(e) => return Err(e),
    };

    let (ai_response, error_detail) = match answer(&state, message).await {
        Ok(reply) => {
            if let Some(user) = &user {
                if let Err(e) = state.db.insert_chat_message(user.id, message, &reply) {
                    error!("Failed to record chat message: {:#}", e);
                }
            }
            (reply, None)
        }
        Err(e) => {
            warn!("Chat unavailable: {}", e);
            (UNAVAILABLE_PAGE_MESSAGE.to_string(), Some(e.detail()))
        }
    };

    let history = history(&state, user.as_ref());
    Ok(Html(pages::chat(&ChatView {
        user: user.as_ref(),
        user_message: Some(message),
        ai_response: Some(&ai_response),
        error_detail: error_detail.as_deref(),
        history: &history,
        ..ChatView::default()
    }))
    .into_response())
}

/// POST /api/chat, for JavaScript clients.
pub async fn chat_api(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Form(form): Form<ChatForm>,
) -> Result<Response, AppError> {
    let message = require_message(&form.message)?;

    match answer(&state, message).await {
        Ok(reply) => {
            if let Some(user) = &user {
                if let Err(e) = state.db.insert_chat_message(user.id, message, &reply) {
                    error!("Failed to record chat message: {:#}", e);
                }
            }
            Ok(Json(ChatResponse { response: reply }).into_response())
        }
        Err(e) => {
            warn!("Chat unavailable: {}", e);
            Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ChatErrorResponse {
                    error: UNAVAILABLE_API_MESSAGE.into(),
                    detail: e.detail(),
                }),
            )
                .into_response())
        }
    }
}

/// POST /agent: the raw prompt with no event context. Failures come back
/// as the `Error:` sentinel in `response`.
pub async fn agent(State(state): State<AppState>, Json(req): Json<AgentRequest>) -> Json<ChatResponse> {
    let response = match state.gemini.generate(&req.prompt).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Agent call failed: {}", e);
            e.detail()
        }
    };
    Json(ChatResponse { response })
}
