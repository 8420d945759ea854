//! Explicit assertions for the invariants enumerated in spec.md §8
//! (I1-I7), each isolated to the one property it names rather than folded
//! into a scenario test.

use std::time::Duration;

use moneta_gate::{
    payment::Status,
    payout::{process_beneficiary, process_fee},
    store::Store,
};

use crate::support::{intake_one, payout_ctx, permissive_policy};

/// (I1) A `/pending/<id>` entry exists iff the beneficiary leg is pending.
#[tokio::test]
async fn i1_pending_index_matches_beneficiary_pending_status() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    let pending = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
    assert_eq!(pending.len(), 1);
    let fresh = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert_eq!(fresh.beneficiary.status, Status::Pending);

    wallet.deposit(payment.receiver.index, 1_000_000_000);
    wallet.confirm(payment.receiver.index);
    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();

    let pending = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
    assert!(pending.is_empty());
    let settled = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert_ne!(settled.beneficiary.status, Status::Pending);
}

/// (I2) A `/fee/<id>` entry exists iff the beneficiary leg has settled
/// (completed or partially-completed) and the fee leg is still pending.
#[tokio::test]
async fn i2_fee_index_matches_settled_beneficiary_and_pending_fee() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert!(fee_entries.is_empty(), "fee index must not exist before beneficiary settles");

    wallet.deposit(payment.receiver.index, 1_000_000_000);
    wallet.confirm(payment.receiver.index);
    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();

    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert_eq!(fee_entries.len(), 1);
    let settled = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert!(matches!(
        settled.beneficiary.status,
        Status::Completed | Status::PartiallyCompleted
    ));
    assert_eq!(settled.fee.status, Status::Pending);

    process_fee(&wallet, &store, payment.id, payout_ctx()).await.unwrap();
    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert!(fee_entries.is_empty(), "fee index must be cleared once the fee leg settles");
}

/// (I3) A non-empty beneficiary transaction id implies the beneficiary leg
/// is no longer pending.
#[tokio::test]
async fn i3_beneficiary_transaction_implies_not_pending() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    wallet.deposit(payment.receiver.index, 1_000_000_000);
    wallet.confirm(payment.receiver.index);
    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();

    let settled = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert!(settled.beneficiary.transaction.is_some());
    assert_ne!(settled.beneficiary.status, Status::Pending);
}

/// (I4) The fee leg is never committed (i.e. its `/fee/` index entry never
/// appears) before the beneficiary leg has committed its own settlement.
#[tokio::test]
async fn i4_fee_leg_never_precedes_beneficiary_commit() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    // Funds are visible to the wallet, but the beneficiary leg has not been
    // processed yet: the fee index must still be absent.
    wallet.deposit(payment.receiver.index, 1_000_000_000);
    wallet.confirm(payment.receiver.index);
    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert!(fee_entries.is_empty());

    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();

    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert_eq!(fee_entries.len(), 1, "fee index appears only after the beneficiary commit");
}

/// (I5) Idempotence at rest: repeated `Process` passes with no intervening
/// on-chain change leave the stored record byte-identical.
#[tokio::test]
async fn i5_repeated_processing_without_chain_change_is_idempotent() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;
    // No deposit: the beneficiary leg can only wait.

    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();
    let after_first = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();

    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();
    let after_second = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();

    assert_eq!(after_first, after_second);
    assert_eq!(after_first.beneficiary.status, Status::Pending);
}

/// (I6) Once the beneficiary leg is `expired`, no further `Process` call
/// moves it to any other state.
#[tokio::test]
async fn i6_expired_beneficiary_status_is_permanent() {
    let policy = permissive_policy(10, Duration::from_millis(1));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;
    // No deposit at all: expiration with zero balance clears both legs.
    tokio::time::sleep(Duration::from_millis(20)).await;

    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();
    let expired = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert_eq!(expired.beneficiary.status, Status::Expired);

    // A deposit arriving after expiration must not resurrect the leg: the
    // guard in `process_beneficiary` short-circuits on any terminal status
    // before ever consulting the wallet balance.
    wallet.deposit(payment.receiver.index, 1_000_000_000);
    wallet.confirm(payment.receiver.index);
    process_beneficiary(&wallet, &store, payment.id, payout_ctx()).await.unwrap();

    let still_expired = store.view(move |txn| txn.get_payment(payment.id)).await.unwrap().unwrap();
    assert_eq!(still_expired.beneficiary.status, Status::Expired);
}

/// (I7) Receiver addresses are unique across payments within one wallet's
/// lifetime.
#[tokio::test]
async fn i7_receiver_addresses_are_unique_per_wallet() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, first) = intake_one(policy, 1_000_000_000, "business-a").await;

    let intake = moneta_gate::intake::Intake::new(wallet.clone(), store.clone(), policy);
    let second = intake
        .receive(moneta_gate::intake::PaymentRequest {
            address: "business-b".to_string(),
            amount: 1_000_000_000,
            priority: "medium".to_string(),
        })
        .await
        .unwrap();

    assert_ne!(first.receiver.address, second.receiver.address);
    assert_ne!(first.receiver.index, second.receiver.index);
}
