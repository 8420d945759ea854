//! Payment intake: validates a new payment intent and durably records it.

use std::{
    str::FromStr,
    time::{Duration, SystemTime},
};

use log::info;

use crate::{
    error::GatewayError,
    payment::{Beneficiary, Fee, Id, Payment, Priority, Receiver, Status},
    store::{pending_key, Store},
    wallet::Wallet,
};

/// Operator policy applied to every intake request.
#[derive(Clone, Debug)]
pub struct IntakePolicy {
    /// Inclusive lower bound on the requested amount.
    pub min_amount: u64,
    /// Inclusive upper bound on the requested amount.
    pub max_amount: u64,
    /// How long a payment waits for funds before expiring.
    pub receive_timeout: Duration,
    /// Percentage of the received amount retained as fee.
    pub fee_percentage: u64,
    /// The operator's payout address for the fee leg.
    pub beneficiary_address_for_fee: String,
    /// Deadline applied to wallet calls made during intake.
    pub wallet_deadline: Duration,
}

/// Caller-supplied payment request.
#[derive(Clone, Debug)]
pub struct PaymentRequest {
    /// The business's destination address for the beneficiary leg.
    pub address: String,
    /// Expected minimum inbound amount, in the wallet's smallest unit.
    pub amount: u64,
    /// Requested transfer priority, as supplied by the caller (`"low"`,
    /// `"medium"`, or `"high"`).
    pub priority: String,
}

/// Validates and records new payments.
#[derive(Clone)]
pub struct Intake<W, S> {
    wallet: W,
    store: S,
    policy: IntakePolicy,
}

impl<W: Wallet, S: Store> Intake<W, S> {
    /// Construct an intake handler bound to a wallet, store, and policy.
    pub fn new(wallet: W, store: S, policy: IntakePolicy) -> Self {
        Intake { wallet, store, policy }
    }

    /// Validate `request` and, on success, durably record a new payment.
    ///
    /// `Wallet.new_address` is called before the store transaction is
    /// opened: if the subsequent commit fails, the allocated address is
    /// leaked but otherwise harmless, since it is never referenced by any
    /// persisted record.
    pub async fn receive(&self, request: PaymentRequest) -> Result<Payment, GatewayError> {
        if request.amount < self.policy.min_amount || request.amount > self.policy.max_amount {
            return Err(GatewayError::InvalidAmount {
                amount: request.amount,
                min: self.policy.min_amount,
                max: self.policy.max_amount,
            });
        }
        let priority = Priority::from_str(&request.priority)
            .map_err(|_| GatewayError::InvalidPriority(request.priority.clone()))?;
        if !self
            .wallet
            .validate_address(&request.address, self.policy.wallet_deadline)
            .await?
        {
            return Err(GatewayError::InvalidAddress(request.address));
        }

        let id = Id::new();
        let endpoint = self
            .wallet
            .new_address(&id.to_string(), self.policy.wallet_deadline)
            .await?;

        let payment = Payment {
            id,
            priority,
            amount: request.amount,
            expiration: SystemTime::now() + self.policy.receive_timeout,
            receiver: Receiver {
                address: endpoint.address,
                index: endpoint.index,
            },
            fee: Fee {
                status: Status::Pending,
                error: None,
                percentage: self.policy.fee_percentage,
                address: self.policy.beneficiary_address_for_fee.clone(),
                payed: 0,
                transaction: None,
            },
            beneficiary: Beneficiary {
                status: Status::Pending,
                error: None,
                address: request.address,
                payed: 0,
                transaction: None,
            },
        };

        let stored = payment.clone();
        self.store
            .update(move |txn| {
                txn.put_payment(&stored)?;
                txn.set(&pending_key(stored.id), &stored.id.as_bytes())
            })
            .await?;

        info!("created payment {id} for endpoint index {}", payment.receiver.index);
        Ok(payment)
    }
}
