//! The payment store: a transactional ordered KV holding the canonical
//! payment records and their two secondary indexes.
//!
//! Three keyspaces share one store: `/payment/<uuid>` (canonical record,
//! JSON-encoded), `/pending/<uuid>` (pending-beneficiary index, raw UUID
//! bytes), and `/fee/<uuid>` (pending-fee index, raw UUID bytes). The index
//! entries carry no information beyond the id; their only purpose is
//! ordered iteration by a scanner.

pub mod memory_store;
#[cfg(feature = "sled")]
pub mod sled_store;

use std::future::Future;

use thiserror::Error;

use crate::payment::{Id, Payment};

const PAYMENT_PREFIX: &str = "/payment/";
/// Key prefix iterated by the beneficiary scanner.
pub const PENDING_PREFIX: &str = "/pending/";
/// Key prefix iterated by the fee scanner.
pub const FEE_PREFIX: &str = "/fee/";

/// The key under which a payment's canonical record is stored.
#[must_use]
pub fn payment_key(id: Id) -> Vec<u8> {
    format!("{PAYMENT_PREFIX}{id}").into_bytes()
}

/// The key under which `id`'s pending-beneficiary index entry is stored.
#[must_use]
pub fn pending_key(id: Id) -> Vec<u8> {
    format!("{PENDING_PREFIX}{id}").into_bytes()
}

/// The key under which `id`'s pending-fee index entry is stored.
#[must_use]
pub fn fee_key(id: Id) -> Vec<u8> {
    format!("{FEE_PREFIX}{id}").into_bytes()
}

/// A handle to one read or read-write pass over the store, scoped to the
/// lifetime of a single [`Store::view`] or [`Store::update`] call.
///
/// Implementations provide snapshot isolation: an [`Txn::iterate_prefix`]
/// call observes a consistent view for the duration of the scan even as
/// concurrent transactions commit elsewhere.
pub trait Txn {
    /// Read the value at `key`, if present.
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;
    /// Write `value` at `key`, replacing any existing value.
    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError>;
    /// Remove the value at `key`, if present.
    fn delete(&self, key: &[u8]) -> Result<(), StoreError>;
    /// Ordered iteration over every key beginning with `prefix`.
    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError>;

    /// Read and deserialize the canonical record for `id`.
    fn get_payment(&self, id: Id) -> Result<Option<Payment>, StoreError> {
        self.get(&payment_key(id))?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(StoreError::Decode))
            .transpose()
    }

    /// Serialize and write the canonical record for `payment.id`.
    fn put_payment(&self, payment: &Payment) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(payment).map_err(StoreError::Encode)?;
        self.set(&payment_key(payment.id), &bytes)
    }
}

/// A transactional ordered KV store.
pub trait Store: Clone + Send + Sync {
    /// Run `f` against a read-only snapshot.
    fn view<F, T>(&self, f: F) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send;

    /// Run `f` against a read-write transaction, committed atomically if `f`
    /// returns `Ok`, rolled back otherwise.
    fn update<F, T>(&self, f: F) -> impl Future<Output = Result<T, StoreError>> + Send
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send;
}

/// An error originating from the payment store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The underlying database reported a failure.
    #[error("database error: {0}")]
    Database(String),
    /// A payment record could not be decoded.
    #[error("failed to decode payment record: {0}")]
    Decode(serde_json::Error),
    /// A payment record could not be encoded.
    #[error("failed to encode payment record: {0}")]
    Encode(serde_json::Error),
    /// A secondary index entry did not carry a well-formed 16-byte UUID.
    #[error("corrupt index entry: expected 16 bytes, got {0}")]
    CorruptIndexEntry(usize),
}
