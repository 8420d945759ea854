//! The wallet capability: the abstract surface over a custodial Monero
//! wallet that the rest of the engine is written against.
//!
//! Two adapters satisfy [`Wallet`]: [`rpc::RpcWallet`] talks to a real
//! `monero-wallet-rpc` over JSON-RPC, and [`mock::MockWallet`] is a
//! deterministic in-memory stand-in used by tests and by
//! `testing-support`. The engine holds exactly one, chosen at startup, and
//! is otherwise oblivious to which one it has.

pub mod mock;
pub mod rpc;

use std::{future::Future, time::Duration};

use thiserror::Error;

use crate::payment::Priority;

/// The wallet's internal handle for a receiving endpoint. Monotonically
/// increasing within one wallet's lifetime; never reused.
pub type Index = u64;

/// A freshly allocated receiving endpoint.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct NewAddress {
    /// The endpoint's address string.
    pub address: String,
    /// The endpoint's wallet handle.
    pub index: Index,
}

/// An endpoint's current balance.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AddressInfo {
    /// The endpoint's wallet handle.
    pub index: Index,
    /// Confirmed total balance, in the wallet's smallest unit.
    pub balance: u64,
    /// Spendable balance, in the wallet's smallest unit. Always `<= balance`.
    pub unlocked_balance: u64,
}

impl AddressInfo {
    /// Whether any part of this balance has not yet cleared.
    #[must_use]
    pub fn has_locked_funds(&self) -> bool {
        self.balance > self.unlocked_balance
    }
}

/// The outcome of a [`Wallet::transfer`] or [`Wallet::sweep_all`] call.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransferResult {
    /// The wallet's transaction id for the submitted transfer.
    pub tx_id: String,
    /// The endpoint the funds were drawn from.
    pub source_index: Index,
    /// The amount that left `source_index`, in the wallet's smallest unit.
    pub amount: u64,
    /// The network fee paid, in the wallet's smallest unit.
    pub fee: u64,
}

/// A transaction's on-chain status, as last observed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TxStatus {
    /// Broadcast but not yet confirmed.
    Pending,
    /// Confirmed.
    Completed,
    /// Dropped from the pool, or otherwise will never confirm.
    Failed,
}

/// A previously submitted transaction, as last observed by the wallet.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct TransactionInfo {
    /// The endpoint the transaction was associated with.
    pub address: String,
    /// The amount transferred, in the wallet's smallest unit.
    pub amount: u64,
    /// The destination address.
    pub destination: String,
    /// The transaction's current status.
    pub status: TxStatus,
}

/// Parameters for [`Wallet::transfer`] and [`Wallet::sweep_all`].
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct PayoutRequest {
    /// The endpoint funds are drawn from.
    pub source_index: Index,
    /// The destination address.
    pub destination: String,
    /// Transfer priority (ignored by `sweep_all`'s amount selection, still
    /// forwarded to the wallet).
    pub priority: Priority,
    /// Minimum number of blocks before the output is spendable again. The
    /// engine always passes `0`.
    pub unlock_time: u64,
}

/// The capability set a custodial Monero wallet must provide.
///
/// Mirrors a real `monero-wallet-rpc` closely enough that [`rpc::RpcWallet`]
/// is a thin translation layer, while staying abstract enough that
/// [`mock::MockWallet`] can satisfy it entirely in memory.
///
/// Every mutating call and `sync` is expected to be internally serialised by
/// the implementor; callers never need to hold an external lock.
pub trait Wallet: Clone + Send + Sync {
    /// Block until the wallet has caught up with the network. `full`
    /// requests a rescan from genesis; otherwise resumes from the last
    /// checkpoint. Callers must call this before any balance read that must
    /// reflect recent chain state.
    fn sync(&self, full: bool, deadline: Duration) -> impl Future<Output = Result<(), WalletError>> + Send;

    /// Allocate a fresh receiving endpoint labelled `label`.
    fn new_address(
        &self,
        label: &str,
        deadline: Duration,
    ) -> impl Future<Output = Result<NewAddress, WalletError>> + Send;

    /// Read an endpoint's current balance.
    fn address(
        &self,
        index: Index,
        deadline: Duration,
    ) -> impl Future<Output = Result<AddressInfo, WalletError>> + Send;

    /// Pure predicate over wire-format address validity.
    fn validate_address(
        &self,
        address: &str,
        deadline: Duration,
    ) -> impl Future<Output = Result<bool, WalletError>> + Send;

    /// Transfer `amount` from `request.source_index` to `request.destination`.
    /// Fails if unlocked funds are insufficient or `amount` is zero.
    fn transfer(
        &self,
        request: &PayoutRequest,
        amount: u64,
        deadline: Duration,
    ) -> impl Future<Output = Result<TransferResult, WalletError>> + Send;

    /// Transfer the entire unlocked balance of `request.source_index` to
    /// `request.destination`. Fails if that balance is zero.
    fn sweep_all(
        &self,
        request: &PayoutRequest,
        deadline: Duration,
    ) -> impl Future<Output = Result<TransferResult, WalletError>> + Send;

    /// Look up a previously submitted transaction's current status.
    fn transaction(
        &self,
        source_index: Index,
        tx_id: &str,
        deadline: Duration,
    ) -> impl Future<Output = Result<TransactionInfo, WalletError>> + Send;
}

/// An error originating from the wallet capability.
#[derive(Error, Debug)]
pub enum WalletError {
    /// The call did not complete before its deadline.
    #[error("wallet call timed out")]
    Timeout,
    /// The address failed wire-format validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// `transfer` or `sweep_all` was asked to move zero, or more than the
    /// unlocked balance permits.
    #[error("insufficient unlocked balance")]
    InsufficientBalance,
    /// The underlying RPC transport failed.
    #[error("RPC request failed: {0}")]
    Rpc(String),
    /// The RPC endpoint returned malformed or unexpected data.
    #[error("malformed RPC response: {0}")]
    MalformedResponse(String),
    /// No such transaction is known to the wallet.
    #[error("unknown transaction: {0}")]
    UnknownTransaction(String),
}
