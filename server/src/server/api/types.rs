//! JSON wire types for the payment HTTP API.
//!
//! The operator's fee address is never serialized; everything else on
//! [`moneta_gate::Payment`] that is safe to expose is flattened into one
//! response shape.

use chrono::{DateTime, Utc};
use moneta_gate::{
    payment::{Payment, Status},
    Id,
};
use serde::{Deserialize, Serialize};

use crate::decimal;

/// Body of `POST /payments`.
#[derive(Deserialize, Debug)]
pub(crate) struct CreatePaymentRequest {
    /// The business's destination address for the beneficiary leg.
    pub(crate) address: String,
    /// Requested amount, as a decimal string.
    pub(crate) amount: String,
    /// Requested transfer priority. Defaults to `"medium"` if omitted.
    #[serde(default = "default_priority")]
    pub(crate) priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

/// The JSON shape returned by both `POST /payments` and `GET /payments/{id}`.
#[derive(Serialize, Debug)]
pub(crate) struct PaymentResponse {
    id: String,
    amount: String,
    expiration: String,
    #[serde(rename = "paymentAddress")]
    payment_address: String,
    fee: FeeResponse,
    beneficiary: BeneficiaryResponse,
}

#[derive(Serialize, Debug)]
struct FeeResponse {
    status: Status,
    percentage: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    payed: String,
}

#[derive(Serialize, Debug)]
struct BeneficiaryResponse {
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    payed: String,
}

impl From<&Payment> for PaymentResponse {
    fn from(payment: &Payment) -> Self {
        PaymentResponse {
            id: payment.id.to_string(),
            amount: decimal::to_decimal_string(payment.amount),
            expiration: DateTime::<Utc>::from(payment.expiration).to_rfc3339(),
            payment_address: payment.receiver.address.clone(),
            fee: FeeResponse {
                status: payment.fee.status,
                percentage: payment.fee.percentage,
                error: payment.fee.error.clone(),
                payed: decimal::to_decimal_string(payment.fee.payed),
            },
            beneficiary: BeneficiaryResponse {
                status: payment.beneficiary.status,
                error: payment.beneficiary.error.clone(),
                payed: decimal::to_decimal_string(payment.beneficiary.payed),
            },
        }
    }
}

/// Parse a path segment as a payment [`Id`].
pub(crate) fn parse_id(raw: &str) -> Result<Id, uuid::Error> {
    raw.parse()
}
