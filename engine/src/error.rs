use thiserror::Error;

use crate::{store::StoreError, wallet::WalletError};

/// The engine's top level error type.
///
/// Validation errors are surfaced verbatim to callers (see
/// [`crate::intake::Intake::receive`]); the rest originate from the wallet
/// adapter or the payment store and are retried by the scanner on the next
/// tick rather than propagated to a client.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// Amount fell outside the operator-configured `[min, max]` bounds.
    #[error("amount {amount} is outside the allowed range [{min}, {max}]")]
    InvalidAmount {
        /// Amount that was rejected.
        amount: u64,
        /// Configured minimum.
        min: u64,
        /// Configured maximum.
        max: u64,
    },
    /// Priority string did not match `low`, `medium`, or `high`.
    #[error("invalid priority: {0}")]
    InvalidPriority(String),
    /// Destination address failed wallet validation.
    #[error("invalid address: {0}")]
    InvalidAddress(String),
    /// No payment exists with the requested id.
    #[error("payment not found")]
    NotFound,
    /// An error from the wallet capability.
    #[error("wallet error: {0}")]
    Wallet(#[from] WalletError),
    /// An error from the payment store.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    /// The scanning driver is already running.
    #[error("gateway is already running")]
    AlreadyRunning,
    /// The scanning driver could not be stopped because the stop signal
    /// could not be sent.
    #[error("gateway could not be stopped: {0}")]
    StopSignal(String),
    /// A scanner task exited with a panic or was cancelled.
    #[error("scanner task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}
