//! The per-entry payout decision procedure: whether to wait, whether to
//! pay, and how to transition a payment's beneficiary or fee leg.
//!
//! These functions are invoked once per scanned entry by
//! [`crate::scanner`]. Each commits its own short `Update` transaction after
//! the wallet call returns; no store transaction is ever held open across an
//! RPC.

use std::time::{Duration, SystemTime};

use log::{debug, warn};

use crate::{
    payment::{Id, Payment, Status},
    store::{fee_key, pending_key, Store, StoreError},
    wallet::{Index, PayoutRequest, TxStatus, Wallet, WalletError},
};

/// Per-process-tick parameters the payout logic needs but the payment
/// record does not carry.
#[derive(Clone, Copy, Debug)]
pub struct PayoutContext {
    /// Deadline applied to every wallet call this leg issues.
    pub wallet_deadline: Duration,
}

/// Process one entry from the `/pending/` (beneficiary) index.
///
/// Returns `Ok(())` on wait, successful transition, or any outcome recorded
/// to the store; returns `Err` only for a store failure, which the caller
/// logs and retries next interval.
pub async fn process_beneficiary<W, S>(
    wallet: &W,
    store: &S,
    id: Id,
    ctx: PayoutContext,
) -> Result<(), StoreError>
where
    W: Wallet,
    S: Store,
{
    let Some(payment) = store.view(move |txn| txn.get_payment(id)).await? else {
        warn!("pending index referenced missing payment {id}");
        return Ok(());
    };
    if payment.beneficiary.status.is_terminal() {
        return Ok(());
    }

    if let Err(e) = wallet.sync(false, ctx.wallet_deadline).await {
        debug!("beneficiary scan of {id}: sync failed: {e}");
        return Ok(());
    }
    let address = match wallet.address(payment.receiver.index, ctx.wallet_deadline).await {
        Ok(address) => address,
        Err(e) => {
            debug!("beneficiary scan of {id}: balance read failed: {e}");
            return Ok(());
        }
    };

    let now = SystemTime::now();

    if address.has_locked_funds() {
        return Ok(());
    }
    if now < payment.expiration && address.unlocked_balance < payment.amount {
        return Ok(());
    }
    if address.unlocked_balance == 0 && payment.is_expired(now) {
        return expire(store, payment).await;
    }

    pay_beneficiary(wallet, store, payment, address.unlocked_balance, ctx).await
}

async fn expire<S: Store>(store: &S, mut payment: Payment) -> Result<(), StoreError> {
    let id = payment.id;
    payment.beneficiary.status = Status::Expired;
    payment.fee.status = Status::Expired;
    store
        .update(move |txn| {
            txn.put_payment(&payment)?;
            txn.delete(&pending_key(id))
        })
        .await
}

async fn pay_beneficiary<W, S>(
    wallet: &W,
    store: &S,
    mut payment: Payment,
    unlocked_balance: u64,
    ctx: PayoutContext,
) -> Result<(), StoreError>
where
    W: Wallet,
    S: Store,
{
    let id = payment.id;

    if let Some(outcome) =
        resolve_in_flight(wallet, payment.receiver.index, &payment.beneficiary.transaction, ctx).await
    {
        match outcome {
            InFlight::StillPending => return Ok(()),
            InFlight::Failed => payment.beneficiary.transaction = None,
        }
    }

    let fee_cut = unlocked_balance * payment.fee.percentage / 100;
    let to_beneficiary = unlocked_balance - fee_cut;
    let request = PayoutRequest {
        source_index: payment.receiver.index,
        destination: payment.beneficiary.address.clone(),
        priority: payment.priority,
        unlock_time: 0,
    };

    match wallet.transfer(&request, to_beneficiary, ctx.wallet_deadline).await {
        Err(e) => {
            payment.beneficiary.status = Status::Error;
            payment.beneficiary.error = Some(e.to_string());
            store.update(move |txn| txn.put_payment(&payment)).await
        }
        Ok(result) => {
            payment.beneficiary.payed = result.amount;
            payment.beneficiary.transaction = Some(result.tx_id);
            payment.beneficiary.error = None;
            payment.beneficiary.status = if unlocked_balance >= payment.amount {
                Status::Completed
            } else {
                Status::PartiallyCompleted
            };
            store
                .update(move |txn| {
                    txn.put_payment(&payment)?;
                    txn.set(&fee_key(id), &id.as_bytes())?;
                    txn.delete(&pending_key(id))
                })
                .await
        }
    }
}

/// Process one entry from the `/fee/` index.
pub async fn process_fee<W, S>(wallet: &W, store: &S, id: Id, ctx: PayoutContext) -> Result<(), StoreError>
where
    W: Wallet,
    S: Store,
{
    let Some(mut payment) = store.view(move |txn| txn.get_payment(id)).await? else {
        warn!("fee index referenced missing payment {id}");
        return Ok(());
    };
    if payment.fee.status.is_terminal() {
        return Ok(());
    }

    if let Err(e) = wallet.sync(false, ctx.wallet_deadline).await {
        debug!("fee scan of {id}: sync failed: {e}");
        return Ok(());
    }
    let address = match wallet.address(payment.receiver.index, ctx.wallet_deadline).await {
        Ok(address) => address,
        Err(e) => {
            debug!("fee scan of {id}: balance read failed: {e}");
            return Ok(());
        }
    };

    if address.balance == 0 {
        payment.fee.status = Status::Completed;
        payment.fee.payed = 0;
        return store
            .update(move |txn| {
                txn.put_payment(&payment)?;
                txn.delete(&fee_key(id))
            })
            .await;
    }
    if address.has_locked_funds() {
        return Ok(());
    }

    if let Some(outcome) =
        resolve_in_flight(wallet, payment.receiver.index, &payment.fee.transaction, ctx).await
    {
        match outcome {
            InFlight::StillPending => return Ok(()),
            InFlight::Failed => payment.fee.transaction = None,
        }
    }

    let request = PayoutRequest {
        source_index: payment.receiver.index,
        destination: payment.fee.address.clone(),
        priority: payment.priority,
        unlock_time: 0,
    };
    match wallet.sweep_all(&request, ctx.wallet_deadline).await {
        Err(e) => {
            payment.fee.status = Status::Error;
            payment.fee.error = Some(e.to_string());
            store.update(move |txn| txn.put_payment(&payment)).await
        }
        Ok(result) => {
            payment.fee.payed = result.amount;
            payment.fee.transaction = Some(result.tx_id);
            payment.fee.error = None;
            payment.fee.status = Status::Completed;
            store
                .update(move |txn| {
                    txn.put_payment(&payment)?;
                    txn.delete(&fee_key(id))
                })
                .await
        }
    }
}

enum InFlight {
    StillPending,
    Failed,
}

/// Guard against re-issuing `transfer`/`sweep_all` while a previous call's
/// `TxId` is still outstanding, per the wallet capability's non-idempotency
/// contract.
async fn resolve_in_flight<W: Wallet>(
    wallet: &W,
    source_index: Index,
    transaction: &Option<String>,
    ctx: PayoutContext,
) -> Option<InFlight> {
    let tx_id = transaction.as_ref()?;
    match wallet.transaction(source_index, tx_id, ctx.wallet_deadline).await {
        Ok(info) => match info.status {
            TxStatus::Pending => Some(InFlight::StillPending),
            TxStatus::Completed => Some(InFlight::Failed),
            TxStatus::Failed => Some(InFlight::Failed),
        },
        Err(WalletError::UnknownTransaction(_)) => Some(InFlight::Failed),
        Err(_) => Some(InFlight::StillPending),
    }
}
