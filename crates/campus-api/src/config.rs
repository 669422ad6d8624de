use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use campus_notify::SmtpSettings;
use tracing::warn;

/// Placeholder JWT secrets that should never reach production.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "your-secret-key-here-change-in-production",
    "dummy_secret_key",
    "change-me",
];

#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            model: "gemini-2.5-flash".into(),
            base_url: "https://generativelanguage.googleapis.com/v1beta".into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub events_fixture: PathBuf,
    pub subscribers_path: PathBuf,
    pub static_dir: PathBuf,
    pub events_cache_ttl: Duration,
    pub reminder_cron: String,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    /// How many upcoming events the chatbot sees.
    pub chat_event_limit: u32,
    pub gemini: GeminiSettings,
    pub smtp: SmtpSettings,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8000,
            db_path: "campus_events.db".into(),
            events_fixture: "data/events.json".into(),
            subscribers_path: "subscribers.txt".into(),
            static_dir: "static".into(),
            events_cache_ttl: Duration::from_secs(300),
            reminder_cron: "0 0 9 * * *".into(),
            jwt_secret: PLACEHOLDER_SECRETS[0].into(),
            token_ttl: Duration::from_secs(30 * 60),
            chat_event_limit: 10,
            gemini: GeminiSettings::default(),
            smtp: SmtpSettings::default(),
        }
    }
}

impl AppConfig {
    /// Reads configuration from the process environment. Call after
    /// `dotenvy::dotenv()` so `.env` values are visible.
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let jwt_secret = var("SECRET_KEY").unwrap_or(defaults.jwt_secret);
        if PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            warn!("SECRET_KEY is unset or a placeholder; session tokens are forgeable");
        }

        let config = Self {
            host: var("CAMPUS_HOST").unwrap_or(defaults.host),
            port: parse_var("CAMPUS_PORT")?.unwrap_or(defaults.port),
            db_path: var("CAMPUS_DB_PATH").map(PathBuf::from).unwrap_or(defaults.db_path),
            events_fixture: var("CAMPUS_EVENTS_FIXTURE")
                .map(PathBuf::from)
                .unwrap_or(defaults.events_fixture),
            subscribers_path: var("CAMPUS_SUBSCRIBERS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.subscribers_path),
            static_dir: var("CAMPUS_STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            events_cache_ttl: parse_var("CAMPUS_EVENTS_CACHE_TTL_SECS")?
                .map(Duration::from_secs)
                .unwrap_or(defaults.events_cache_ttl),
            reminder_cron: var("CAMPUS_REMINDER_CRON").unwrap_or(defaults.reminder_cron),
            jwt_secret,
            token_ttl: parse_var("ACCESS_TOKEN_EXPIRE_MINUTES")?
                .map(|minutes: u64| Duration::from_secs(minutes * 60))
                .unwrap_or(defaults.token_ttl),
            chat_event_limit: defaults.chat_event_limit,
            gemini: GeminiSettings {
                api_key: std::env::var("GEMINI_API_KEY").ok().and_then(|raw| clean_api_key(&raw)),
                model: var("GEMINI_MODEL").unwrap_or(defaults.gemini.model),
                base_url: var("GEMINI_BASE_URL").unwrap_or(defaults.gemini.base_url),
            },
            smtp: SmtpSettings {
                host: var("SMTP_HOST").unwrap_or(defaults.smtp.host),
                port: parse_var("SMTP_PORT")?.unwrap_or(defaults.smtp.port),
                username: var("EMAIL_USERNAME"),
                password: var("EMAIL_PASSWORD"),
            },
        };

        Ok(config)
    }
}

/// Strips surrounding quotes and whitespace that often sneak into `.env`
/// files. A key that is empty afterwards counts as missing.
pub fn clean_api_key(raw: &str) -> Option<String> {
    let key = raw.trim().trim_matches(|c| c == '"' || c == '\'').trim();
    (!key.is_empty()).then(|| key.to_string())
}

/// First and last four characters of a key, or `****` for short keys.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".into()
    }
}

fn var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    var(name)
        .map(|raw| raw.trim().parse::<T>().with_context(|| format!("invalid {name}: {raw}")))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_key_quotes_and_whitespace_are_stripped() {
        assert_eq!(clean_api_key("  \"abc123\"\n").as_deref(), Some("abc123"));
        assert_eq!(clean_api_key("'abc123'").as_deref(), Some("abc123"));
        assert_eq!(clean_api_key("\"\""), None);
        assert_eq!(clean_api_key("   "), None);
    }

    #[test]
    fn keys_are_masked() {
        assert_eq!(mask_key("AIzaSyExample1234"), "AIza...1234");
        assert_eq!(mask_key("short"), "****");
        assert_eq!(mask_key("12345678"), "****");
    }

    #[test]
    fn defaults_match_documented_values() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8000);
        assert_eq!(config.events_cache_ttl, Duration::from_secs(300));
        assert_eq!(config.token_ttl, Duration::from_secs(1800));
        assert!(config.gemini.api_key.is_none());
    }
}
