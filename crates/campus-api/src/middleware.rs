use std::convert::Infallible;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{HeaderMap, header, request::Parts},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use campus_types::models::CurrentUser;
use jsonwebtoken::{DecodingKey, Validation, decode};
use tracing::debug;

use campus_types::api::Claims;

use crate::AppState;
use crate::error::AppError;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

/// Token from the `access_token` cookie (`Bearer <jwt>`), falling back to
/// the `Authorization` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let jar = CookieJar::from_headers(headers);
    if let Some(cookie) = jar.get(ACCESS_TOKEN_COOKIE) {
        let value = cookie.value().trim_matches('"');
        let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
}

pub fn decode_token(secret: &str, token: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| debug!("Rejected token: {}", e))
    .ok()
}

/// Resolve the signed-in, active user behind a request.
pub fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<CurrentUser, AppError> {
    let token = bearer_token(headers).ok_or(AppError::Unauthorized)?;
    let claims = decode_token(&state.config.jwt_secret, &token).ok_or(AppError::Unauthorized)?;

    let user = state
        .db
        .get_user_by_email(&claims.sub)?
        .ok_or(AppError::Unauthorized)?;

    if !user.is_active {
        return Err(AppError::InactiveUser);
    }

    Ok(user.to_current_user())
}

/// Rejects requests without a valid session and exposes the user to the
/// handler as `Extension<CurrentUser>`.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = resolve_user(&state, req.headers())?;
    req.extensions_mut().insert(user);
    Ok(next.run(req).await)
}

/// The signed-in user if there is one. Never rejects.
pub struct MaybeUser(pub Option<CurrentUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(MaybeUser(resolve_user(state, &parts.headers).ok()))
    }
}
