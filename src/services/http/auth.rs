use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::oneshot;

use super::{ask, error_response, AppState};
use crate::models::telegram::TelegramIdentity;
use crate::models::users::NewUserProfile;
use crate::services::auth::AuthRequest;
use crate::services::ServiceError;

#[derive(Deserialize)]
pub struct LoginRequest {
    pub mobile: String,
    pub pin: String,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(flatten)]
    pub profile: NewUserProfile,
    pub otp: String,
    pub pin: String,
    pub confirm_pin: String,
}

#[derive(Deserialize)]
pub struct ChangePinRequest {
    pub current_pin: String,
    pub new_pin: String,
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> impl IntoResponse {
    match ask(&state.auth_channel, |response| AuthRequest::Login {
        mobile: req.mobile,
        pin: req.pin,
        response,
    })
    .await
    {
        Ok(user) => (StatusCode::OK, Json(json!(user))),
        Err(e) => error_response(e),
    }
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> impl IntoResponse {
    match ask(&state.auth_channel, |response| AuthRequest::Register {
        profile: req.profile,
        otp: req.otp,
        pin: req.pin,
        confirm_pin: req.confirm_pin,
        response,
    })
    .await
    {
        Ok(user) => (StatusCode::CREATED, Json(json!(user))),
        Err(e) => error_response(e),
    }
}

/// Embedded-host auto-login. Failures along the way are swallowed by design,
/// so the only visible outcomes are a user or an empty session.
pub async fn telegram_login(
    State(state): State<AppState>,
    Json(identity): Json<TelegramIdentity>,
) -> impl IntoResponse {
    let (response_tx, response_rx) = oneshot::channel();
    let sent = state
        .auth_channel
        .send(AuthRequest::TelegramLogin {
            identity,
            response: response_tx,
        })
        .await;
    if let Err(e) = sent {
        return error_response(ServiceError::Communication(
            "http".to_string(),
            e.to_string(),
        ));
    }

    match response_rx.await {
        Ok(Some(user)) => (StatusCode::OK, Json(json!(user))),
        Ok(None) => (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "description": "Auto-login unavailable" })),
        ),
        Err(e) => error_response(ServiceError::Communication(
            "http".to_string(),
            e.to_string(),
        )),
    }
}

pub async fn logout(State(state): State<AppState>) -> impl IntoResponse {
    state.session.set_user(None);
    StatusCode::NO_CONTENT
}

pub async fn session(State(state): State<AppState>) -> impl IntoResponse {
    let current = state.session.current();
    Json(json!({
        "user": current.user,
        "is_admin": current.is_admin,
    }))
}

pub async fn change_pin(
    State(state): State<AppState>,
    Json(req): Json<ChangePinRequest>,
) -> impl IntoResponse {
    let mobile = match state.session.current().user {
        Some(user) => user.mobile,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "description": "Not logged in" })),
            )
        }
    };

    match ask(&state.auth_channel, |response| AuthRequest::ChangePin {
        mobile,
        current_pin: req.current_pin,
        new_pin: req.new_pin,
        response,
    })
    .await
    {
        Ok(user) => (StatusCode::OK, Json(json!(user))),
        Err(e) => error_response(e),
    }
}
