//! Handlers for `POST /payments` and `GET /payments/{id}`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use moneta_gate::{intake::PaymentRequest, store::Store, wallet::Wallet};

use super::{
    types::{parse_id, CreatePaymentRequest, PaymentResponse},
    ApiError,
};
use crate::{decimal, server::state::AppState};

/// `POST /payments`: validate and durably record a new payment.
pub(crate) async fn create_payment<W, S>(
    State(state): State<AppState<W, S>>,
    Json(request): Json<CreatePaymentRequest>,
) -> Result<(StatusCode, Json<PaymentResponse>), ApiError>
where
    W: Wallet,
    S: Store,
{
    let amount = decimal::to_units(&request.amount)?;
    let payment = state
        .gateway
        .receive(PaymentRequest {
            address: request.address,
            amount,
            priority: request.priority,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentResponse::from(&payment))))
}

/// `GET /payments/{id}`: idempotent read of a payment by id.
pub(crate) async fn get_payment<W, S>(
    State(state): State<AppState<W, S>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentResponse>, ApiError>
where
    W: Wallet,
    S: Store,
{
    let id = parse_id(&id)?;
    let payment = state.gateway.get(id).await?;
    Ok(Json(PaymentResponse::from(&payment)))
}
