//! The two index scanners: periodic passes over `/pending/` and `/fee/`
//! that dispatch each entry to a bounded worker pool.
//!
//! Both scanners share one implementation, parameterized by [`IndexKind`],
//! since they differ only in which prefix they iterate and which payout
//! step they invoke per entry.

use std::sync::Arc;

use log::{debug, error, trace};
use tokio::sync::{mpsc, Semaphore};

use crate::{
    payment::Id,
    payout::{self, PayoutContext},
    store::{Store, StoreError},
    wallet::Wallet,
};

/// Which secondary index a [`Scanner`] iterates.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum IndexKind {
    /// The `/pending/` (beneficiary) index.
    Pending,
    /// The `/fee/` index.
    Fee,
}

impl IndexKind {
    fn prefix(self) -> &'static [u8] {
        match self {
            IndexKind::Pending => pending_key_prefix(),
            IndexKind::Fee => fee_key_prefix(),
        }
    }
}

fn pending_key_prefix() -> &'static [u8] {
    const PREFIX: &str = crate::store::PENDING_PREFIX;
    PREFIX.as_bytes()
}

fn fee_key_prefix() -> &'static [u8] {
    const PREFIX: &str = crate::store::FEE_PREFIX;
    PREFIX.as_bytes()
}

/// A periodic scanner over one secondary index.
pub struct Scanner<W, S> {
    kind: IndexKind,
    wallet: W,
    store: S,
    max_concurrent_jobs: usize,
    payout_ctx: PayoutContext,
}

impl<W, S> Scanner<W, S>
where
    W: Wallet + 'static,
    S: Store + 'static,
{
    /// Construct a scanner for `kind`, bounding concurrent workers at
    /// `max_concurrent_jobs`.
    pub fn new(kind: IndexKind, wallet: W, store: S, max_concurrent_jobs: usize, payout_ctx: PayoutContext) -> Self {
        Scanner {
            kind,
            wallet,
            store,
            max_concurrent_jobs,
            payout_ctx,
        }
    }

    /// Run one scan pass to completion: stream every id currently in the
    /// index, dispatch each to a worker bounded by the job semaphore, and
    /// wait for all workers to finish. Returns the number of entries
    /// processed.
    pub async fn scan(&self) -> Result<usize, StoreError> {
        let prefix = self.kind.prefix().to_vec();
        let entries = self.store.view(move |txn| txn.iterate_prefix(&prefix)).await?;

        let ids = entries
            .into_iter()
            .map(|(_, value)| decode_id(&value))
            .collect::<Result<Vec<_>, _>>()?;

        trace!("{:?} scan found {} entries", self.kind, ids.len());

        let (tx, mut rx) = mpsc::channel::<Id>(self.max_concurrent_jobs.max(1));
        let producer = {
            let tx = tx.clone();
            async move {
                for id in ids {
                    if tx.send(id).await.is_err() {
                        break;
                    }
                }
            }
        };
        drop(tx);

        let semaphore = Arc::new(Semaphore::new(self.max_concurrent_jobs.max(1)));
        let mut processed = 0usize;
        let mut workers = Vec::new();

        let consumer = async {
            while let Some(id) = rx.recv().await {
                let permit = semaphore.clone().acquire_owned().await.expect("semaphore never closed");
                let wallet = self.wallet.clone();
                let store = self.store.clone();
                let kind = self.kind;
                let ctx = self.payout_ctx;
                workers.push(tokio::spawn(async move {
                    let _permit = permit;
                    let result = match kind {
                        IndexKind::Pending => payout::process_beneficiary(&wallet, &store, id, ctx).await,
                        IndexKind::Fee => payout::process_fee(&wallet, &store, id, ctx).await,
                    };
                    if let Err(e) = result {
                        error!("{kind:?} scan worker for payment {id} failed: {e}");
                    } else {
                        debug!("{kind:?} scan worker for payment {id} completed");
                    }
                }));
                processed += 1;
            }
        };

        tokio::join!(producer, consumer);
        for worker in workers {
            worker.await.map_err(|e| StoreError::Database(e.to_string()))?;
        }

        Ok(processed)
    }
}

fn decode_id(bytes: &[u8]) -> Result<Id, StoreError> {
    let array: [u8; 16] = bytes
        .try_into()
        .map_err(|_| StoreError::CorruptIndexEntry(bytes.len()))?;
    Ok(Id::from_bytes(array))
}
