//! A deterministic in-memory wallet used by tests and by the
//! `testing-support` crate's fixtures.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use uuid::Uuid;

use super::{
    AddressInfo, Index, NewAddress, PayoutRequest, TransactionInfo, TransferResult, TxStatus,
    Wallet, WalletError,
};

#[derive(Debug, Clone, Default)]
struct Account {
    address: String,
    balance: u64,
    unlocked_balance: u64,
}

#[derive(Debug, Default)]
struct State {
    next_index: Index,
    accounts: HashMap<Index, Account>,
    transactions: HashMap<String, TransactionInfo>,
}

/// An in-memory wallet with no network dependency.
///
/// Balances are entirely driven by [`MockWallet::deposit`] and
/// [`MockWallet::confirm`]: nothing arrives on its own, so tests control
/// exactly when and how much "chain" activity a payment observes.
#[derive(Debug, Clone, Default)]
pub struct MockWallet {
    state: Arc<Mutex<State>>,
}

impl MockWallet {
    /// A fresh wallet with no allocated endpoints.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `index` with `amount` of unconfirmed ("locked") funds.
    pub fn deposit(&self, index: Index, amount: u64) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let account = state.accounts.entry(index).or_default();
        account.balance += amount;
    }

    /// Move all of `index`'s pending balance into its unlocked balance, as
    /// if it had accrued enough confirmations.
    pub fn confirm(&self, index: Index) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(account) = state.accounts.get_mut(&index) {
            account.unlocked_balance = account.balance;
        }
    }
}

impl Wallet for MockWallet {
    async fn sync(&self, _full: bool, _deadline: Duration) -> Result<(), WalletError> {
        Ok(())
    }

    async fn new_address(
        &self,
        label: &str,
        _deadline: Duration,
    ) -> Result<NewAddress, WalletError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let index = state.next_index;
        state.next_index += 1;
        let address = format!("mock:{label}:{index}");
        state.accounts.insert(
            index,
            Account {
                address: address.clone(),
                balance: 0,
                unlocked_balance: 0,
            },
        );
        Ok(NewAddress { address, index })
    }

    async fn address(
        &self,
        index: Index,
        _deadline: Duration,
    ) -> Result<AddressInfo, WalletError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let account = state
            .accounts
            .get(&index)
            .ok_or_else(|| WalletError::Rpc(format!("unknown endpoint {index}")))?;
        Ok(AddressInfo {
            index,
            balance: account.balance,
            unlocked_balance: account.unlocked_balance,
        })
    }

    async fn validate_address(
        &self,
        address: &str,
        _deadline: Duration,
    ) -> Result<bool, WalletError> {
        Ok(!address.is_empty() && address != "invalid")
    }

    async fn transfer(
        &self,
        request: &PayoutRequest,
        amount: u64,
        _deadline: Duration,
    ) -> Result<TransferResult, WalletError> {
        if amount == 0 {
            return Err(WalletError::InsufficientBalance);
        }
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let account = state
            .accounts
            .get_mut(&request.source_index)
            .ok_or_else(|| WalletError::Rpc(format!("unknown endpoint {}", request.source_index)))?;
        if amount > account.unlocked_balance {
            return Err(WalletError::InsufficientBalance);
        }
        account.unlocked_balance -= amount;
        account.balance -= amount;
        let tx_id = Uuid::new_v4().to_string();
        let result = TransferResult {
            tx_id: tx_id.clone(),
            source_index: request.source_index,
            amount,
            fee: 0,
        };
        state.transactions.insert(
            tx_id,
            TransactionInfo {
                address: account.address.clone(),
                amount,
                destination: request.destination.clone(),
                status: TxStatus::Completed,
            },
        );
        Ok(result)
    }

    async fn sweep_all(
        &self,
        request: &PayoutRequest,
        _deadline: Duration,
    ) -> Result<TransferResult, WalletError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let account = state
            .accounts
            .get_mut(&request.source_index)
            .ok_or_else(|| WalletError::Rpc(format!("unknown endpoint {}", request.source_index)))?;
        let amount = account.unlocked_balance;
        if amount == 0 {
            return Err(WalletError::InsufficientBalance);
        }
        account.unlocked_balance = 0;
        account.balance -= amount;
        let tx_id = Uuid::new_v4().to_string();
        let result = TransferResult {
            tx_id: tx_id.clone(),
            source_index: request.source_index,
            amount,
            fee: 0,
        };
        state.transactions.insert(
            tx_id,
            TransactionInfo {
                address: account.address.clone(),
                amount,
                destination: request.destination.clone(),
                status: TxStatus::Completed,
            },
        );
        Ok(result)
    }

    async fn transaction(
        &self,
        _source_index: Index,
        tx_id: &str,
        _deadline: Duration,
    ) -> Result<TransactionInfo, WalletError> {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        state
            .transactions
            .get(tx_id)
            .cloned()
            .ok_or_else(|| WalletError::UnknownTransaction(tx_id.to_string()))
    }
}
