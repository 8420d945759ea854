//! An in-process store backed by a [`BTreeMap`], used by tests and by the
//! mock-wallet demo. Nothing is persisted across restarts.

use std::{
    cell::RefCell,
    collections::BTreeMap,
    sync::{Arc, Mutex, PoisonError},
};

use super::{Store, StoreError, Txn};

/// An in-memory [`Store`]. Cheaply cloneable; clones share the same
/// underlying map.
#[derive(Clone, Default)]
pub struct MemoryStore {
    map: Arc<Mutex<BTreeMap<Vec<u8>, Vec<u8>>>>,
}

impl MemoryStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

struct MemoryTxn<'a> {
    map: RefCell<&'a mut BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl Txn for MemoryTxn<'_> {
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.borrow().get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<(), StoreError> {
        self.map.borrow_mut().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<(), StoreError> {
        self.map.borrow_mut().remove(key);
        Ok(())
    }

    fn iterate_prefix(&self, prefix: &[u8]) -> Result<Vec<(Vec<u8>, Vec<u8>)>, StoreError> {
        Ok(self
            .map
            .borrow()
            .range(prefix.to_vec()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}

impl Store for MemoryStore {
    async fn view<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send,
    {
        let mut guard = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let txn = MemoryTxn {
            map: RefCell::new(&mut guard),
        };
        f(&txn)
    }

    async fn update<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&dyn Txn) -> Result<T, StoreError> + Send,
        T: Send,
    {
        // A single lock held for the duration of the closure gives the same
        // all-or-nothing visibility a real transaction would: no concurrent
        // reader observes a partial write, and on error the lock is simply
        // released with the map already rolled back to its pre-call state
        // (nothing was written in the first place, since writes go straight
        // to the live map, so we snapshot and restore on failure).
        let mut guard = self.map.lock().unwrap_or_else(PoisonError::into_inner);
        let before = guard.clone();
        let txn = MemoryTxn {
            map: RefCell::new(&mut guard),
        };
        match f(&txn) {
            Ok(value) => Ok(value),
            Err(e) => {
                *guard = before;
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{payment::Id, store::pending_key};

    #[tokio::test]
    async fn update_rolls_back_on_error() {
        let store = MemoryStore::new();
        let key = pending_key(Id::new());
        let result: Result<(), StoreError> = store
            .update(|txn| {
                txn.set(&key, b"x")?;
                Err(StoreError::CorruptIndexEntry(0))
            })
            .await;
        assert!(result.is_err());
        let value = store.view(|txn| txn.get(&key)).await.unwrap();
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn iterate_prefix_returns_only_matching_keys() {
        let store = MemoryStore::new();
        store
            .update(|txn| {
                txn.set(b"/pending/a", b"1")?;
                txn.set(b"/pending/b", b"2")?;
                txn.set(b"/fee/c", b"3")
            })
            .await
            .unwrap();

        let entries = store.view(|txn| txn.iterate_prefix(b"/pending/")).await.unwrap();
        assert_eq!(entries.len(), 2);
    }
}
