pub mod auth;
pub mod cache;
pub mod chat;
pub mod config;
pub mod debug;
pub mod error;
pub mod events;
pub mod gemini;
pub mod middleware;
pub mod pages;
pub mod subscribe;

use std::sync::Arc;

use axum::{
    Router, middleware as axum_middleware,
    routing::{get, post},
};
use campus_db::Database;
use campus_notify::{Mailer, SubscriberStore};
use tower_http::services::ServeDir;

use crate::config::AppConfig;
use crate::events::EventCatalog;
use crate::gemini::GeminiClient;
use crate::middleware::require_auth;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub config: AppConfig,
    pub db: Arc<Database>,
    pub events: EventCatalog,
    pub gemini: GeminiClient,
    pub mailer: Arc<Mailer>,
    pub subscribers: Arc<SubscriberStore>,
}

impl AppStateInner {
    pub fn new(
        config: AppConfig,
        db: Arc<Database>,
        mailer: Arc<Mailer>,
        subscribers: Arc<SubscriberStore>,
    ) -> anyhow::Result<AppState> {
        let events = EventCatalog::new(db.clone(), config.events_cache_ttl);
        let gemini = GeminiClient::new(&config.gemini)?;

        Ok(Arc::new(Self {
            config,
            db,
            events,
            gemini,
            mailer,
            subscribers,
        }))
    }
}

/// Every route of the application. Cross-cutting layers (CORS, tracing) are
/// added by the binary.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/dashboard", get(pages::dashboard_page))
        .route_layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    let auth_routes = Router::new()
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/register", get(pages::register_page).post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/logout", get(auth::logout));

    let chat_routes = Router::new()
        .route("/chat", get(chat::chat_page).post(chat::chat_form))
        .route("/api/chat", post(chat::chat_api))
        .route("/agent", post(chat::agent));

    let debug_routes = Router::new()
        .route("/debug/gemini", get(debug::gemini_status))
        .route("/test-static", get(debug::test_static))
        .route("/health", get(debug::health));

    Router::new()
        .route("/", get(pages::home_page))
        .route("/api/events", get(events::list_events))
        .route("/api/events/suggestions", get(events::suggestions))
        .route("/subscribe", post(subscribe::subscribe))
        .merge(auth_routes)
        .merge(chat_routes)
        .merge(debug_routes)
        .merge(protected_routes)
        .nest_service("/static", ServeDir::new(&state.config.static_dir))
        .with_state(state)
}
