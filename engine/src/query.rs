//! Payment query: an idempotent read by id.

use crate::{error::GatewayError, payment::{Id, Payment}, store::Store};

/// Reads payments by id. Never mutates.
#[derive(Clone)]
pub struct Query<S> {
    store: S,
}

impl<S: Store> Query<S> {
    /// Construct a query handler bound to a store.
    pub fn new(store: S) -> Self {
        Query { store }
    }

    /// Look up a payment by id.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] if no payment exists with that id.
    pub async fn get(&self, id: Id) -> Result<Payment, GatewayError> {
        self.store
            .view(move |txn| txn.get_payment(id))
            .await?
            .ok_or(GatewayError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use crate::{intake::{Intake, IntakePolicy, PaymentRequest}, store::memory_store::MemoryStore, wallet::mock::MockWallet};
    use std::time::Duration;

    use super::*;

    #[tokio::test]
    async fn get_returns_not_found_for_unknown_id() {
        let query = Query::new(MemoryStore::new());
        let err = query.get(Id::new()).await.unwrap_err();
        assert!(matches!(err, GatewayError::NotFound));
    }

    #[tokio::test]
    async fn get_returns_what_was_received() {
        let store = MemoryStore::new();
        let intake = Intake::new(
            MockWallet::new(),
            store.clone(),
            IntakePolicy {
                min_amount: 1,
                max_amount: 1_000_000_000_000_000,
                receive_timeout: Duration::from_secs(3600),
                fee_percentage: 10,
                beneficiary_address_for_fee: "operator".to_string(),
                wallet_deadline: Duration::from_secs(1),
            },
        );
        let created = intake
            .receive(PaymentRequest {
                address: "business".to_string(),
                amount: 1_000,
                priority: "low".to_string(),
            })
            .await
            .unwrap();

        let query = Query::new(store);
        let fetched = query.get(created.id).await.unwrap();
        assert_eq!(fetched, created);
    }
}
