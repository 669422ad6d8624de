use std::time::Duration;

use anyhow::anyhow;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::{SaltString, rand_core::OsRng}};
use axum::{
    extract::{Form, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use jsonwebtoken::{EncodingKey, Header, encode};
use tracing::info;

use campus_db::Database;
use campus_db::models::UserRow;
use campus_db::queries::is_constraint_violation;
use campus_notify::{is_valid_address, messages};
use campus_types::api::{Claims, LoginForm, RegisterForm};

use crate::AppState;
use crate::error::AppError;
use crate::middleware::ACCESS_TOKEN_COOKIE;
use crate::pages;

const LOGIN_FAILED: &str = "Incorrect email or password";

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Registers a new user and returns its id.
///
/// Validation problems and duplicates come back as `AppError::BadRequest`
/// carrying the message to show on the form.
pub fn create_user(
    db: &Database,
    email: &str,
    password: &str,
    username: &str,
    full_name: Option<&str>,
) -> Result<i64, AppError> {
    let email = email.trim();
    let username = username.trim();

    if !is_valid_address(email) {
        return Err(AppError::BadRequest("Please enter a valid email address".into()));
    }
    if username.chars().count() < 3 || username.chars().count() > 32 {
        return Err(AppError::BadRequest("Username must be between 3 and 32 characters".into()));
    }
    if password.chars().count() < 8 {
        return Err(AppError::BadRequest("Password must be at least 8 characters".into()));
    }

    if let Some(message) = duplicate_field(db, email, username)? {
        return Err(AppError::BadRequest(message.into()));
    }

    let password_hash = hash_password(password)?;
    let id = db
        .create_user(email, username, &password_hash, full_name)
        .map_err(|e| registration_conflict(db, email, username, e))?;

    info!("Registered user {} ({})", username, email);
    Ok(id)
}

fn duplicate_field(db: &Database, email: &str, username: &str) -> anyhow::Result<Option<&'static str>> {
    if db.get_user_by_email(email)?.is_some() {
        return Ok(Some("Email already registered"));
    }
    if db.get_user_by_username(username)?.is_some() {
        return Ok(Some("Username already taken"));
    }
    Ok(None)
}

/// A concurrent registration can win the race between the duplicate check
/// and the insert. Its UNIQUE violation is reported like the up-front check.
fn registration_conflict(db: &Database, email: &str, username: &str, err: anyhow::Error) -> AppError {
    if !is_constraint_violation(&err) {
        return err.into();
    }
    match duplicate_field(db, email, username) {
        Ok(Some(message)) => AppError::BadRequest(message.into()),
        Ok(None) => err.into(),
        Err(lookup) => lookup.into(),
    }
}

/// `None` for an unknown email or a wrong password.
pub fn authenticate_user(db: &Database, email: &str, password: &str) -> anyhow::Result<Option<UserRow>> {
    let Some(user) = db.get_user_by_email(email.trim())? else {
        return Ok(None);
    };

    if !verify_password(password, &user.hashed_password) {
        return Ok(None);
    }

    Ok(Some(user))
}

pub fn create_token(secret: &str, email: &str, ttl: Duration) -> anyhow::Result<String> {
    let claims = Claims {
        sub: email.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::from_std(ttl)?).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

fn session_cookie(token: &str) -> Cookie<'static> {
    Cookie::build((ACCESS_TOKEN_COOKIE, format!("Bearer {token}")))
        .http_only(true)
        .path("/")
        .build()
}

// -- Handlers --

/// POST /auth/login and POST /login
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let Some(user) = authenticate_user(&state.db, &form.username, &form.password)? else {
        info!("Failed login for {}", form.username.trim());
        return Ok((StatusCode::UNAUTHORIZED, Html(pages::login(Some(LOGIN_FAILED)))).into_response());
    };

    let token = create_token(&state.config.jwt_secret, &user.email, state.config.token_ttl)?;
    info!("User {} logged in", user.username);

    Ok((jar.add(session_cookie(&token)), pages::found("/dashboard")).into_response())
}

/// POST /auth/register and POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, AppError> {
    match create_user(&state.db, &form.email, &form.password, &form.username, form.full_name()) {
        Ok(_) => {}
        Err(AppError::BadRequest(message)) => {
            return Ok((StatusCode::BAD_REQUEST, Html(pages::register(Some(&message)))).into_response());
        }
        Err(e) => return Err(e),
    }

    state.mailer.send(form.email.trim(), &messages::welcome_registered()).await;

    Ok(pages::found("/login"))
}

/// GET /logout
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build(ACCESS_TOKEN_COOKIE).path("/"));
    (jar, Redirect::to("/"))
}
