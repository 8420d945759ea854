//! The payment gateway's external HTTP API: `POST /payments` and
//! `GET /payments/{id}`, per the two endpoints the payment gateway exposes.

mod payments;
mod types;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use moneta_gate::{store::Store, wallet::Wallet, GatewayError};
use serde_json::json;
use thiserror::Error;

use super::state::AppState;
use crate::decimal::DecimalError;

/// Assemble the router for the payment API, bound to `state`.
pub(crate) fn router<W, S>(state: AppState<W, S>) -> Router
where
    W: Wallet + 'static,
    S: Store + 'static,
{
    Router::new()
        .route("/payments", post(payments::create_payment::<W, S>))
        .route("/payments/:id", get(payments::get_payment::<W, S>))
        .with_state(state)
}

/// An error that can be sent back over the API to the client.
#[derive(Error, Debug)]
pub(crate) enum ApiError {
    /// The `amount` field was not a well-formed decimal string.
    #[error("invalid amount: {0}")]
    InvalidAmount(#[from] DecimalError),
    /// The `{id}` path segment was not a well-formed UUID.
    #[error("invalid payment id: {0}")]
    InvalidId(#[from] uuid::Error),
    /// The request was rejected, or could not be served, by the gateway.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::InvalidAmount(_) | ApiError::InvalidId(_) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(
                GatewayError::InvalidAmount { .. }
                | GatewayError::InvalidPriority(_)
                | GatewayError::InvalidAddress(_),
            ) => StatusCode::BAD_REQUEST,
            ApiError::Gateway(GatewayError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Gateway(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{self}");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
