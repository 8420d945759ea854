use std::env::{self, VarError};

use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};

use super::ConfigError;

#[derive(Deserialize, Serialize, Clone, Debug, Default)]
#[serde(rename_all = "kebab-case")]
pub struct WalletConfig {
    /// Wallet file to open on the remote `monero-wallet-rpc`.
    pub filename: String,
    /// Password unlocking `filename`. For best security, this should be set
    /// via the `WALLET_PASSWORD` environment variable.
    #[serde(default, skip_serializing)]
    pub password: Option<Secret<String>>,
    /// Base URL of the `monero-wallet-rpc` endpoint.
    pub rpc_url: String,
    /// HTTP basic auth username for the RPC endpoint, if it requires one.
    #[serde(default)]
    pub rpc_username: Option<String>,
    /// HTTP basic auth password for the RPC endpoint. For best security,
    /// this should be set via the `WALLET_RPC_PASSWORD` environment
    /// variable.
    #[serde(default, skip_serializing)]
    pub rpc_password: Option<Secret<String>>,
}

impl WalletConfig {
    pub(super) fn apply_env_overrides(mut self) -> Result<Self, ConfigError> {
        match env::var("WALLET_PASSWORD") {
            Ok(password) => self.password = Some(Secret::new(password)),
            Err(VarError::NotPresent) => {}
            Err(e) => return Err(e)?,
        }
        match env::var("WALLET_RPC_PASSWORD") {
            Ok(password) => self.rpc_password = Some(Secret::new(password)),
            Err(VarError::NotPresent) => {}
            Err(e) => return Err(e)?,
        }
        Ok(self)
    }

    pub(super) fn validate(&self) {
        assert!(!self.filename.is_empty(), "please configure wallet.filename");
        assert!(!self.rpc_url.is_empty(), "please configure wallet.rpc-url");
        self.rpc_url
            .parse::<hyper::Uri>()
            .expect("wallet.rpc-url must be a valid URL");
    }
}

impl PartialEq for WalletConfig {
    fn eq(&self, other: &Self) -> bool {
        let passwords_match = match (self.password.as_ref(), other.password.as_ref()) {
            (Some(a), Some(b)) => a.expose_secret() == b.expose_secret(),
            (None, None) => true,
            _ => false,
        };
        let rpc_passwords_match = match (self.rpc_password.as_ref(), other.rpc_password.as_ref()) {
            (Some(a), Some(b)) => a.expose_secret() == b.expose_secret(),
            (None, None) => true,
            _ => false,
        };
        self.filename == other.filename
            && passwords_match
            && self.rpc_url == other.rpc_url
            && self.rpc_username == other.rpc_username
            && rpc_passwords_match
    }
}
