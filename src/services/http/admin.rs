use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;

use super::{ask, error_response, AppState};
use crate::models::app_settings::{AppSettings, PaymentNumbers};
use crate::models::packages::NewPackage;
use crate::models::transactions::TransactionStatus;
use crate::services::auth::AuthRequest;
use crate::services::catalog::CatalogRequest;
use crate::services::transactions::TransactionServiceRequest;
use crate::services::users::UserRequest;

#[derive(Deserialize)]
pub struct AdminLoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ListUsersQuery {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct SetBalanceRequest {
    pub amount: f64,
}

#[derive(Deserialize)]
pub struct SetBlockedRequest {
    pub blocked: bool,
}

#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: TransactionStatus,
}

fn require_admin(state: &AppState) -> Result<(), (StatusCode, Json<serde_json::Value>)> {
    if state.session.current().is_admin {
        Ok(())
    } else {
        Err((
            StatusCode::UNAUTHORIZED,
            Json(json!({ "description": "Admin login required" })),
        ))
    }
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<AdminLoginRequest>,
) -> impl IntoResponse {
    match ask(&state.auth_channel, |response| AuthRequest::AdminLogin {
        username: req.username,
        password: req.password,
        response,
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "is_admin": true }))),
        Err(e) => error_response(e),
    }
}

pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.user_channel, |response| UserRequest::ListUsers {
        search: query.search,
        response,
    })
    .await
    {
        Ok(users) => (StatusCode::OK, Json(json!(users))),
        Err(e) => error_response(e),
    }
}

pub async fn set_balance(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(req): Json<SetBalanceRequest>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.user_channel, |response| UserRequest::SetBalance {
        mobile,
        amount: req.amount,
        response,
    })
    .await
    {
        Ok(user) => (StatusCode::OK, Json(json!(user))),
        Err(e) => error_response(e),
    }
}

pub async fn set_blocked(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
    Json(req): Json<SetBlockedRequest>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.user_channel, |response| UserRequest::SetBlocked {
        mobile,
        blocked: req.blocked,
        response,
    })
    .await
    {
        Ok(user) => (StatusCode::OK, Json(json!(user))),
        Err(e) => error_response(e),
    }
}

pub async fn delete_user(
    State(state): State<AppState>,
    Path(mobile): Path<String>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.user_channel, |response| UserRequest::DeleteUser {
        mobile,
        response,
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))),
        Err(e) => error_response(e),
    }
}

pub async fn list_transactions(State(state): State<AppState>) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.transaction_channel, |response| {
        TransactionServiceRequest::ListAll { response }
    })
    .await
    {
        Ok(transactions) => (StatusCode::OK, Json(json!(transactions))),
        Err(e) => error_response(e),
    }
}

pub async fn update_transaction_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.transaction_channel, |response| {
        TransactionServiceRequest::UpdateStatus {
            id,
            status: req.status,
            response,
        }
    })
    .await
    {
        Ok(transaction) => (StatusCode::OK, Json(json!(transaction))),
        Err(e) => error_response(e),
    }
}

pub async fn add_package(
    State(state): State<AppState>,
    Json(package): Json<NewPackage>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::AddPackage { package, response }
    })
    .await
    {
        Ok(created) => (StatusCode::CREATED, Json(json!(created))),
        Err(e) => error_response(e),
    }
}

pub async fn delete_package(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::DeletePackage { id, response }
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "deleted": true }))),
        Err(e) => error_response(e),
    }
}

pub async fn save_app_settings(
    State(state): State<AppState>,
    Json(settings): Json<AppSettings>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::SaveAppSettings { settings, response }
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "saved": true }))),
        Err(e) => error_response(e),
    }
}

pub async fn save_payment_numbers(
    State(state): State<AppState>,
    Json(numbers): Json<PaymentNumbers>,
) -> impl IntoResponse {
    if let Err(denied) = require_admin(&state) {
        return denied;
    }
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::SavePaymentNumbers { numbers, response }
    })
    .await
    {
        Ok(()) => (StatusCode::OK, Json(json!({ "saved": true }))),
        Err(e) => error_response(e),
    }
}
