//! Ready-made [`moneta_gate`] fixtures for exercising the payment gateway
//! without a real `monero-wallet-rpc` daemon or persistent store.

use std::time::Duration;

use moneta_gate::{driver::Gateway, intake::IntakePolicy, store::memory_store::MemoryStore, wallet::mock::MockWallet};

use crate::OPERATOR_ADDRESS;

/// A permissive intake policy suitable for most tests: wide amount bounds, a
/// one hour receive timeout, and a 10% fee routed to [`OPERATOR_ADDRESS`].
#[must_use]
pub fn sample_policy() -> IntakePolicy {
    IntakePolicy {
        min_amount: 1,
        max_amount: 1_000_000_000_000_000,
        receive_timeout: Duration::from_secs(3600),
        fee_percentage: 10,
        beneficiary_address_for_fee: OPERATOR_ADDRESS.to_string(),
        wallet_deadline: Duration::from_secs(1),
    }
}

/// A gateway backed by [`MockWallet`] and an in-memory store, using
/// [`sample_policy`] and a fast scanning interval. Does not start the
/// scanning loop; call [`Gateway::run`] for that.
#[must_use]
pub fn mock_gateway() -> Gateway<MockWallet, MemoryStore> {
    Gateway::builder(MockWallet::new(), MemoryStore::new())
        .policy(sample_policy())
        .process_interval(Duration::from_millis(20))
        .build()
}
