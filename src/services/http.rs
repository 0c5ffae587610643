use axum::{
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde_json::json;
use tokio::sync::{mpsc, oneshot};
use tower_http::trace::TraceLayer;

use super::auth::AuthRequest;
use super::catalog::CatalogRequest;
use super::transactions::TransactionServiceRequest;
use super::users::UserRequest;
use super::ServiceError;
use crate::session::SessionStore;

mod admin;
mod auth;
mod requests;

#[derive(Clone)]
pub struct AppState {
    pub auth_channel: mpsc::Sender<AuthRequest>,
    pub user_channel: mpsc::Sender<UserRequest>,
    pub transaction_channel: mpsc::Sender<TransactionServiceRequest>,
    pub catalog_channel: mpsc::Sender<CatalogRequest>,
    pub session: SessionStore,
}

/// One request/response round-trip over a service channel.
pub(crate) async fn ask<Req, T>(
    channel: &mpsc::Sender<Req>,
    build: impl FnOnce(oneshot::Sender<Result<T, ServiceError>>) -> Req,
) -> Result<T, ServiceError> {
    let (response_tx, response_rx) = oneshot::channel();
    channel
        .send(build(response_tx))
        .await
        .map_err(|e| ServiceError::Communication("http".to_string(), e.to_string()))?;
    response_rx
        .await
        .map_err(|e| ServiceError::Communication("http".to_string(), e.to_string()))?
}

pub(crate) fn error_response(error: ServiceError) -> (StatusCode, Json<serde_json::Value>) {
    let status = match &error {
        ServiceError::NotFound => StatusCode::NOT_FOUND,
        ServiceError::InvalidCredential => StatusCode::UNAUTHORIZED,
        ServiceError::Blocked => StatusCode::FORBIDDEN,
        ServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Database(_) | ServiceError::Communication(_, _) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    (status, Json(json!({ "description": error.to_string() })))
}

pub async fn start_http_server(bind: &str, state: AppState) -> Result<(), anyhow::Error> {
    let app = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/register", post(auth::register))
        .route("/auth/telegram", post(auth::telegram_login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/pin", put(auth::change_pin))
        .route("/session", get(auth::session))
        .route("/requests/add-money", post(requests::add_money))
        .route("/requests/service-order", post(requests::service_order))
        .route("/transactions", get(requests::list_transactions))
        .route("/packages", get(requests::list_packages))
        .route("/payment-numbers", get(requests::payment_numbers))
        .route("/app-settings", get(requests::app_settings))
        .route("/admin/login", post(admin::login))
        .route("/admin/users", get(admin::list_users))
        .route("/admin/users/{mobile}/balance", put(admin::set_balance))
        .route("/admin/users/{mobile}/block", put(admin::set_blocked))
        .route("/admin/users/{mobile}", delete(admin::delete_user))
        .route("/admin/transactions", get(admin::list_transactions))
        .route(
            "/admin/transactions/{id}/status",
            put(admin::update_transaction_status),
        )
        .route("/admin/packages", post(admin::add_package))
        .route("/admin/packages/{id}", delete(admin::delete_package))
        .route("/admin/settings", put(admin::save_app_settings))
        .route("/admin/payment-numbers", put(admin::save_payment_numbers))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(bind).await?;
    log::info!("Listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
