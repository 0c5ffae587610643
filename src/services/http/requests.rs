use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use super::{ask, error_response, AppState};
use crate::models::transactions::{NewAddMoney, NewServiceOrder};
use crate::services::catalog::CatalogRequest;
use crate::services::transactions::TransactionServiceRequest;

/// Submission is open to sessionless callers; the transaction service tags
/// those records as guest instead of rejecting them.
pub async fn add_money(
    State(state): State<AppState>,
    Json(req): Json<NewAddMoney>,
) -> impl IntoResponse {
    let user = state.session.current().user;
    match ask(&state.transaction_channel, |response| {
        TransactionServiceRequest::SubmitAddMoney {
            user,
            request: req,
            response,
        }
    })
    .await
    {
        Ok(transaction) => (StatusCode::CREATED, Json(json!(transaction))),
        Err(e) => error_response(e),
    }
}

pub async fn service_order(
    State(state): State<AppState>,
    Json(req): Json<NewServiceOrder>,
) -> impl IntoResponse {
    let user = state.session.current().user;
    match ask(&state.transaction_channel, |response| {
        TransactionServiceRequest::SubmitServiceOrder {
            user,
            request: req,
            response,
        }
    })
    .await
    {
        Ok(transaction) => (StatusCode::CREATED, Json(json!(transaction))),
        Err(e) => error_response(e),
    }
}

pub async fn list_transactions(State(state): State<AppState>) -> impl IntoResponse {
    let user = match state.session.current().user {
        Some(user) => user,
        None => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "description": "Not logged in" })),
            )
        }
    };

    match ask(&state.transaction_channel, |response| {
        TransactionServiceRequest::ListForUser {
            user_id: user.id,
            response,
        }
    })
    .await
    {
        Ok(transactions) => (StatusCode::OK, Json(json!(transactions))),
        Err(e) => error_response(e),
    }
}

pub async fn list_packages(State(state): State<AppState>) -> impl IntoResponse {
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::ListPackages { response }
    })
    .await
    {
        Ok(packages) => (StatusCode::OK, Json(json!(packages))),
        Err(e) => error_response(e),
    }
}

pub async fn payment_numbers(State(state): State<AppState>) -> impl IntoResponse {
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::GetPaymentNumbers { response }
    })
    .await
    {
        Ok(numbers) => (StatusCode::OK, Json(json!(numbers))),
        Err(e) => error_response(e),
    }
}

pub async fn app_settings(State(state): State<AppState>) -> impl IntoResponse {
    match ask(&state.catalog_channel, |response| {
        CatalogRequest::GetAppSettings { response }
    })
    .await
    {
        Ok(settings) => (StatusCode::OK, Json(json!(settings))),
        Err(e) => error_response(e),
    }
}
