use axum::{
    extract::{Form, State},
    response::Redirect,
};
use campus_notify::{is_valid_address, messages};
use campus_types::api::SubscribeForm;
use tracing::debug;

use crate::AppState;
use crate::error::AppError;

/// POST /subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    Form(form): Form<SubscribeForm>,
) -> Result<Redirect, AppError> {
    let email = form.email.trim();
    if !is_valid_address(email) {
        return Err(AppError::BadRequest("Please enter a valid email address".into()));
    }

    if state.subscribers.add(email).await? {
        state.mailer.send(email, &messages::welcome_subscriber()).await;
    } else {
        debug!("{} is already subscribed", email);
    }

    Ok(Redirect::to("/"))
}
