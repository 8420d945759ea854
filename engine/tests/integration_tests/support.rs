//! Shared fixtures for the scenario and invariant tests.

use std::time::Duration;

use moneta_gate::{
    intake::{Intake, IntakePolicy, PaymentRequest},
    payment::Payment,
    payout::PayoutContext,
    store::memory_store::MemoryStore,
    wallet::mock::MockWallet,
};

pub const OPERATOR_ADDRESS: &str = "operator-address";

/// A policy wide enough that only the scenario under test constrains
/// behavior.
pub fn permissive_policy(fee_percentage: u64, receive_timeout: Duration) -> IntakePolicy {
    IntakePolicy {
        min_amount: 1,
        max_amount: 1_000_000_000_000_000,
        receive_timeout,
        fee_percentage,
        beneficiary_address_for_fee: OPERATOR_ADDRESS.to_string(),
        wallet_deadline: Duration::from_secs(1),
    }
}

pub fn payout_ctx() -> PayoutContext {
    PayoutContext {
        wallet_deadline: Duration::from_secs(1),
    }
}

/// Build an `Intake` over a fresh mock wallet and in-memory store, then
/// record one payment through it. Returns the wallet, store, and recorded
/// payment so the caller can drive the wallet's balance and run `payout`.
pub async fn intake_one(
    policy: IntakePolicy,
    amount: u64,
    beneficiary_address: &str,
) -> (MockWallet, MemoryStore, Payment) {
    let wallet = MockWallet::new();
    let store = MemoryStore::new();
    let intake = Intake::new(wallet.clone(), store.clone(), policy);
    let payment = intake
        .receive(PaymentRequest {
            address: beneficiary_address.to_string(),
            amount,
            priority: "medium".to_string(),
        })
        .await
        .expect("intake rejected a well-formed request");
    (wallet, store, payment)
}
