//! The production store: a single [`sled`] tree holding all three
//! keyspaces, since they are distinguished only by key prefix.

use std::cell::Cell;

use sled::transaction::{ConflictableTransactionError, TransactionError, TransactionalTree};

use super::{Store, StoreError, Txn};

/// A [`sled`]-backed store.
///
/// `sled` is still pre-1.0; callers should treat data loss on crash as a
/// known risk, same as the rest of the ecosystem that builds on it.
#[derive(Clone)]
pub struct SledStore {
    tree: sled::Tree,
}

impl SledStore {
    /// Open (or create) a sled database at `path`, using the given tree
    /// name for all three keyspaces.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened at `path`.
    pub fn new(path: &str, tree_name: &str) -> Result<Self, StoreError> {
        let db = sled::Config::default()
            .path(path)
            .open()
            .map_err(|e| StoreError::Database(e.to_string()))?;
        let tree = db
            .open_tree(tree_name)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(SledStore { tree })
    }
}

struct SledTxn<'a> {
    tx: &'a TransactionalTree,
}

impl Txn for SledTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tx
            .get(key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|ivec| ivec.to_vec()))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tx
            .insert(key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.tx
            .remove(key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        // `TransactionalTree` has no range scan: the production driver only
        // ever scans from a `view` (read-only, non-transactional) pass, so
        // this path is exercised only by `update` closures that happen to
        // also iterate, which the engine does not currently do.
        let _ = prefix;
        Err(StoreError::Database(
            "iterate_prefix is not supported inside a sled update transaction".to_string(),
        ))
    }
}

struct SledViewTxn<'a> {
    tree: &'a sled::Tree,
}

impl Txn for SledViewTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self
            .tree
            .get(key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|ivec| ivec.to_vec()))
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.tree
            .insert(key, value)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.tree
            .remove(key)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        self.tree
            .scan_prefix(prefix)
            .map(|entry| {
                let (k, v) = entry.map_err(|e| StoreError::Database(e.to_string()))?;
                Ok((k.to_vec(), v.to_vec()))
            })
            .collect()
    }
}

impl Store for SledStore {
    async fn view<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send,
    {
        // A snapshot read needs no transaction: `sled::Tree` reads already
        // observe a consistent point-in-time view, and `scan_prefix` holds
        // no lock that would block concurrent writers.
        let txn = SledViewTxn { tree: &self.tree };
        f(&txn)
    }

    async fn update<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send,
    {
        // `Tree::transaction` takes a `Fn`, re-invoking it on conflict, but
        // the engine's callers only ever need to run once: there is never
        // more than one writer racing the same key inside a single `update`
        // call. Stash `f` behind a `Cell` so the closure type-checks as
        // `Fn`, and take it out on the (only expected) call.
        let f = Cell::new(Some(f));
        let result: Result<T, TransactionError<StoreError>> = self.tree.transaction(move |tx| {
            let txn = SledTxn { tx };
            let f = f.take().expect("sled retried an update transaction closure");
            f(&txn).map_err(ConflictableTransactionError::Abort)
        });
        result.map_err(|e| match e {
            TransactionError::Abort(inner) => inner,
            TransactionError::Storage(e) => StoreError::Database(e.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::Builder;

    use super::*;
    use crate::{
        payment::{Beneficiary, Fee, Id, Payment, Priority, Receiver},
        store::pending_key,
    };

    fn new_temp_dir() -> String {
        Builder::new()
            .prefix("moneta_gate_test_db_")
            .rand_bytes(16)
            .tempdir()
            .expect("failed to create temp dir")
            .path()
            .to_str()
            .expect("non-utf8 temp dir path")
            .to_string()
    }

    fn dummy_payment(id: Id) -> Payment {
        Payment {
            id,
            priority: Priority::Medium,
            amount: 1_000,
            expiration: std::time::SystemTime::now(),
            receiver: Receiver {
                address: "receiver".to_string(),
                index: 0,
            },
            fee: Fee {
                percentage: 10,
                address: "operator".to_string(),
                ..Default::default()
            },
            beneficiary: Beneficiary {
                address: "business".to_string(),
                ..Default::default()
            },
        }
    }

    #[tokio::test]
    async fn put_and_get_payment_round_trips() {
        let store = SledStore::new(&new_temp_dir(), "payments").unwrap();
        let id = Id::new();
        let payment = dummy_payment(id);
        let stored = payment.clone();
        store
            .update(move |txn| {
                txn.put_payment(&stored)?;
                txn.set(&pending_key(id), &id.as_bytes())
            })
            .await
            .unwrap();

        let fetched = store.view(move |txn| txn.get_payment(id)).await.unwrap();
        assert_eq!(fetched, Some(payment));

        let pending = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
        assert_eq!(pending.len(), 1);
    }

    #[tokio::test]
    async fn update_rolls_back_on_error() {
        let store = SledStore::new(&new_temp_dir(), "payments").unwrap();
        let id = Id::new();
        let result: Result<(), StoreError> = store
            .update(move |txn| {
                txn.set(&pending_key(id), &id.as_bytes())?;
                Err(StoreError::CorruptIndexEntry(0))
            })
            .await;
        assert!(result.is_err());

        let pending = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
        assert!(pending.is_empty());
    }

    #[tokio::test]
    async fn reopening_the_same_path_preserves_data() {
        let path = new_temp_dir();
        let id = Id::new();
        {
            let store = SledStore::new(&path, "payments").unwrap();
            let payment = dummy_payment(id);
            store.update(move |txn| txn.put_payment(&payment)).await.unwrap();
        }
        let reopened = SledStore::new(&path, "payments").unwrap();
        let fetched = reopened.view(move |txn| txn.get_payment(id)).await.unwrap();
        assert!(fetched.is_some());
    }
}
