//! The concrete end-to-end scenarios from spec.md §8 not already covered by
//! `moneta_gate::payout`'s own unit tests (scenarios 1, 4, and 5 live there;
//! scenarios 2 and 3 are black-box here since they only need the public
//! `Intake`/`payout` surface).

use std::time::Duration;

use moneta_gate::{payment::Status, payout::process_beneficiary, store::Store};

use crate::support::{intake_one, payout_ctx, permissive_policy};

/// Scenario 2: overpayment. `UnlockedBalance >= Amount` completes the leg
/// even though twice the requested amount arrived, and the fee is cut from
/// what actually arrived, not from the requested amount.
#[tokio::test]
async fn overpayment_completes_on_full_amount_received() {
    let policy = permissive_policy(10, Duration::from_secs(3600));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    wallet.deposit(payment.receiver.index, 2_000_000_000);
    wallet.confirm(payment.receiver.index);

    process_beneficiary(&wallet, &store, payment.id, payout_ctx())
        .await
        .unwrap();

    let updated = store
        .view(move |txn| txn.get_payment(payment.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.beneficiary.status, Status::Completed);
    assert_eq!(updated.beneficiary.payed, 1_800_000_000);

    let fee_entries = store.view(|txn| txn.iterate_prefix(b"/fee/")).await.unwrap();
    assert_eq!(fee_entries.len(), 1);
}

/// Scenario 3: partial pay after expiration. Only half the requested
/// amount ever arrives; once the payment expires the scanner settles the
/// beneficiary leg for whatever unlocked balance exists instead of waiting
/// forever.
#[tokio::test]
async fn partial_payment_after_expiration_settles_for_received_amount() {
    let policy = permissive_policy(10, Duration::from_millis(1));
    let (wallet, store, payment) = intake_one(policy, 1_000_000_000, "business").await;

    wallet.deposit(payment.receiver.index, 500_000_000);
    wallet.confirm(payment.receiver.index);

    // Let the payment's `Timeout=1ms` elapse.
    tokio::time::sleep(Duration::from_millis(20)).await;

    process_beneficiary(&wallet, &store, payment.id, payout_ctx())
        .await
        .unwrap();

    let updated = store
        .view(move |txn| txn.get_payment(payment.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.beneficiary.status, Status::PartiallyCompleted);
    assert_eq!(updated.beneficiary.payed, 450_000_000);

    let pending_entries = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
    assert!(pending_entries.is_empty());
}
