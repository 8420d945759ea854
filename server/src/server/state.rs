use moneta_gate::{driver::Gateway, store::Store, wallet::Wallet};

/// Shared application state: a handle to the running payment gateway.
pub(crate) struct AppState<W: Wallet, S: Store> {
    pub(crate) gateway: Gateway<W, S>,
}

impl<W: Wallet, S: Store> Clone for AppState<W, S> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<W: Wallet, S: Store> AppState<W, S> {
    pub(crate) fn new(gateway: Gateway<W, S>) -> Self {
        Self { gateway }
    }
}
