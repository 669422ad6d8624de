//! Server-rendered HTML pages.
//!
//! Every value that did not come from this file goes through [`escape`].

use axum::{
    Extension,
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use campus_types::models::{CurrentUser, EventGroup};

use crate::AppState;
use crate::error::AppError;
use crate::events::group_by_category;
use crate::middleware::MaybeUser;

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// `302 Found`, which is what the login and register forms redirect with.
pub fn found(location: &'static str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

fn layout(title: &str, user: Option<&CurrentUser>, body: &str) -> String {
    let nav = match user {
        Some(user) => format!(
            r#"<a href="/dashboard">{}</a> <a href="/chat">Ask the assistant</a> <a href="/logout">Log out</a>"#,
            escape(user.display_name())
        ),
        None => r#"<a href="/chat">Ask the assistant</a> <a href="/login">Log in</a> <a href="/register">Register</a>"#
            .to_string(),
    };

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | Campus Events</title>
<link rel="stylesheet" href="/static/style.css">
</head>
<body>
<header><a class="brand" href="/">Campus Events</a><nav>{nav}</nav></header>
<main>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    )
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape(e)))
        .unwrap_or_default()
}

fn event_groups(groups: &[EventGroup]) -> String {
    if groups.is_empty() {
        return r#"<p class="empty">No events are scheduled yet.</p>"#.into();
    }

    let mut html = String::new();
    for group in groups {
        html.push_str(&format!(
            "<section class=\"category\">\n<h2>{}</h2>\n<ul class=\"events\">\n",
            escape(&group.label)
        ));
        for event in &group.events {
            html.push_str(&format!(
                "<li class=\"event\"><h3>{}</h3><p class=\"when\">{}</p><p class=\"where\">{}</p><p>{}</p></li>\n",
                escape(&event.name),
                escape(&event.display_date),
                escape(&event.location),
                escape(&event.description),
            ));
        }
        html.push_str("</ul>\n</section>\n");
    }
    html
}

pub fn home(groups: &[EventGroup], user: Option<&CurrentUser>) -> String {
    let body = format!(
        r#"<h1>Upcoming campus events</h1>
{events}
<section class="subscribe">
<h2>Never miss an event</h2>
<form method="post" action="/subscribe">
<input type="email" name="email" placeholder="you@campus.edu" required>
<button type="submit">Subscribe</button>
</form>
</section>"#,
        events = event_groups(groups),
    );
    layout("Home", user, &body)
}

pub fn login(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Log in</h1>
{error}
<form method="post" action="/auth/login">
<label>Email <input type="email" name="username" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account yet? <a href="/register">Register</a></p>"#,
        error = error_banner(error),
    );
    layout("Log in", None, &body)
}

pub fn register(error: Option<&str>) -> String {
    let body = format!(
        r#"<h1>Create an account</h1>
{error}
<form method="post" action="/auth/register">
<label>Email <input type="email" name="email" required></label>
<label>Username <input type="text" name="username" minlength="3" maxlength="32" required></label>
<label>Full name <input type="text" name="full_name"></label>
<label>Password <input type="password" name="password" minlength="8" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        error = error_banner(error),
    );
    layout("Register", None, &body)
}

pub fn dashboard(user: &CurrentUser, groups: &[EventGroup]) -> String {
    let body = format!(
        r#"<h1>Welcome back, {name}</h1>
<p>Signed in as {email}.</p>
{events}"#,
        name = escape(user.display_name()),
        email = escape(&user.email),
        events = event_groups(groups),
    );
    layout("Dashboard", Some(user), &body)
}

#[derive(Default)]
pub struct ChatView<'a> {
    pub user: Option<&'a CurrentUser>,
    pub initial_question: Option<&'a str>,
    pub user_message: Option<&'a str>,
    pub ai_response: Option<&'a str>,
    pub error_detail: Option<&'a str>,
    /// Problem with the submitted form itself.
    pub error: Option<&'a str>,
    /// Earlier (message, response) pairs, newest first.
    pub history: &'a [(String, String)],
}

pub fn chat(view: &ChatView<'_>) -> String {
    let mut body = String::from("<h1>Ask about campus events</h1>\n");
    body.push_str(&error_banner(view.error));

    if let (Some(message), Some(response)) = (view.user_message, view.ai_response) {
        body.push_str(&format!(
            "<div class=\"exchange\"><p class=\"you\">{}</p><p class=\"assistant\">{}</p></div>\n",
            escape(message),
            escape(response),
        ));
    }
    if let Some(detail) = view.error_detail {
        body.push_str(&format!("<p class=\"error-detail\"><small>{}</small></p>\n", escape(detail)));
    }

    body.push_str(&format!(
        r#"<form method="post" action="/chat">
<textarea name="message" rows="3" placeholder="What's happening this weekend?" required>{}</textarea>
<button type="submit">Ask</button>
</form>
"#,
        escape(view.initial_question.unwrap_or_default()),
    ));

    if !view.history.is_empty() {
        body.push_str("<section class=\"history\">\n<h2>Recent questions</h2>\n");
        for (message, response) in view.history {
            body.push_str(&format!(
                "<div class=\"exchange\"><p class=\"you\">{}</p><p class=\"assistant\">{}</p></div>\n",
                escape(message),
                escape(response),
            ));
        }
        body.push_str("</section>\n");
    } else if view.user.is_none() {
        body.push_str(r#"<p class="hint"><a href="/login">Log in</a> to keep a history of your questions.</p>"#);
    }

    layout("Chat", view.user, &body)
}

// -- Handlers --

/// GET /
pub async fn home_page(State(state): State<AppState>, MaybeUser(user): MaybeUser) -> Result<Html<String>, AppError> {
    let events = state.events.all()?;
    Ok(Html(home(&group_by_category(&events), user.as_ref())))
}

/// GET /login
pub async fn login_page() -> Html<String> {
    Html(login(None))
}

/// GET /register
pub async fn register_page() -> Html<String> {
    Html(register(None))
}

/// GET /dashboard, behind `require_auth`.
pub async fn dashboard_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, AppError> {
    let events = state.events.all()?;
    Ok(Html(dashboard(&user, &group_by_category(&events))))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> CurrentUser {
        CurrentUser {
            id: 1,
            email: "ada@campus.edu".into(),
            username: "ada".into(),
            full_name: Some("Ada <Lovelace>".into()),
        }
    }

    #[test]
    fn markup_is_escaped() {
        assert_eq!(escape(r#"<b>"Tom & Jerry's"</b>"#), "&lt;b&gt;&quot;Tom &amp; Jerry&#x27;s&quot;&lt;/b&gt;");
    }

    #[test]
    fn dashboard_greets_user_safely() {
        let html = dashboard(&user(), &[]);
        assert!(html.contains("Welcome back, Ada &lt;Lovelace&gt;"));
        assert!(html.contains("No events are scheduled yet."));
        assert!(html.contains(r#"href="/logout""#));
    }

    #[test]
    fn login_page_shows_error() {
        let html = login(Some("Incorrect email or password"));
        assert!(html.contains(r#"<p class="error">Incorrect email or password</p>"#));
        assert!(!login(None).contains(r#"class="error""#));
    }

    #[test]
    fn chat_page_prefills_question() {
        let html = chat(&ChatView {
            initial_question: Some("Any <concerts>?"),
            ..ChatView::default()
        });
        assert!(html.contains("Any &lt;concerts&gt;?</textarea>"));
        assert!(html.contains("to keep a history"));
        assert!(!html.contains(r#"class="error""#));
    }

    #[test]
    fn chat_page_shows_form_error() {
        let html = chat(&ChatView {
            error: Some("Message must not be empty"),
            ..ChatView::default()
        });
        assert!(html.contains(r#"<p class="error">Message must not be empty</p>"#));
    }
}
