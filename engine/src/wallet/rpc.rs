//! The real wallet adapter: a `monero-wallet-rpc` client over JSON-RPC.

use std::{
    sync::Arc,
    time::Duration,
};

use backoff::ExponentialBackoffBuilder;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{http::StatusCode, Method, Request, Uri};
use hyper_rustls::{HttpsConnector, HttpsConnectorBuilder};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client as HttpClient},
    rt::TokioExecutor,
};
use log::{debug, trace};
use serde_json::{json, Value};
use tokio::sync::Mutex as AsyncMutex;
use tokio::time::timeout;

use super::{
    AddressInfo, Index, NewAddress, PayoutRequest, TransactionInfo, TransferResult, TxStatus,
    Wallet, WalletError,
};

/// A `monero-wallet-rpc` client.
///
/// Every call takes `self.lock`: the upstream RPC server is not safe for
/// concurrent use by a single open wallet, so all access (including
/// `sync`) is serialised through one exclusive section.
#[derive(Debug, Clone)]
pub struct RpcWallet {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    client: HttpClient<HttpsConnector<HttpConnector>, Full<Bytes>>,
    url: Uri,
    username: Option<String>,
    password: Option<String>,
    lock: AsyncMutex<()>,
}

impl RpcWallet {
    /// Returns a wallet adapter pointing at the given `monero-wallet-rpc`
    /// endpoint.
    #[must_use]
    pub fn new(url: Uri, username: Option<String>, password: Option<String>) -> Self {
        let mut hyper_connector = HttpConnector::new();
        hyper_connector.enforce_http(false);
        hyper_connector.set_keepalive(Some(Duration::from_secs(25)));
        let rustls_connector = HttpsConnectorBuilder::new()
            .with_webpki_roots()
            .https_or_http()
            .enable_http1()
            .enable_http2()
            .wrap_connector(hyper_connector);
        let client = HttpClient::builder(TokioExecutor::new()).build(rustls_connector);

        RpcWallet {
            inner: Arc::new(Inner {
                client,
                url,
                username,
                password,
                lock: AsyncMutex::new(()),
            }),
        }
    }

    async fn call(&self, method: &str, params: Value, deadline: Duration) -> Result<Value, WalletError> {
        let _guard = self.inner.lock.lock().await;
        let body = json!({
            "jsonrpc": "2.0",
            "id": "0",
            "method": method,
            "params": params,
        })
        .to_string();

        trace!("wallet-rpc call: {method}");
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri(self.inner.url.clone().to_string() + "/json_rpc")
            .header("Content-Type", "application/json");
        if let (Some(user), Some(pass)) = (&self.inner.username, &self.inner.password) {
            let credentials = base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                format!("{user}:{pass}"),
            );
            builder = builder.header("Authorization", format!("Basic {credentials}"));
        }
        let req = builder
            .body(Full::new(body.into()))
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        let response = timeout(deadline, self.inner.client.request(req))
            .await
            .map_err(|_| WalletError::Timeout)?
            .map_err(|e| WalletError::Rpc(e.to_string()))?;

        if response.status() != StatusCode::OK {
            debug!("wallet-rpc {method} returned status {}", response.status());
        }

        let (_parts, body) = response.into_parts();
        let bytes = body
            .collect()
            .await
            .map_err(|e| WalletError::Rpc(e.to_string()))?
            .to_bytes();
        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| WalletError::MalformedResponse(e.to_string()))?;

        if let Some(error) = value.get("error") {
            return Err(WalletError::Rpc(error.to_string()));
        }
        value
            .get("result")
            .cloned()
            .ok_or_else(|| WalletError::MalformedResponse("missing \"result\"".to_string()))
    }

    fn field_u64(value: &Value, field: &str) -> Result<u64, WalletError> {
        value
            .get(field)
            .and_then(Value::as_u64)
            .ok_or_else(|| WalletError::MalformedResponse(format!("missing \"{field}\"")))
    }

    fn field_str<'a>(value: &'a Value, field: &str) -> Result<&'a str, WalletError> {
        value
            .get(field)
            .and_then(Value::as_str)
            .ok_or_else(|| WalletError::MalformedResponse(format!("missing \"{field}\"")))
    }

    /// Open `filename` on the remote `monero-wallet-rpc`, unlocking it with
    /// `password`. Must be called once before any other [`Wallet`] method if
    /// the RPC server was started without `--wallet-file`.
    ///
    /// # Errors
    ///
    /// Returns an error if the wallet file cannot be opened (wrong password,
    /// missing file, RPC unreachable).
    pub async fn open_wallet(
        &self,
        filename: &str,
        password: &str,
        deadline: Duration,
    ) -> Result<(), WalletError> {
        self.call(
            "open_wallet",
            json!({ "filename": filename, "password": password }),
            deadline,
        )
        .await?;
        Ok(())
    }
}

impl Wallet for RpcWallet {
    async fn sync(&self, full: bool, deadline: Duration) -> Result<(), WalletError> {
        let params = if full {
            json!({ "refresh_type": "full" })
        } else {
            json!({})
        };
        // A full rescan can legitimately take longer than one RPC round trip
        // while the daemon catches up; retry transient failures until the
        // caller's deadline is exhausted rather than failing on the first.
        let policy = ExponentialBackoffBuilder::default()
            .with_max_elapsed_time(Some(deadline))
            .build();
        backoff::future::retry(policy, || async {
            self.call("refresh", params.clone(), deadline)
                .await
                .map_err(|e| match e {
                    WalletError::Timeout => backoff::Error::permanent(e),
                    other => backoff::Error::transient(other),
                })
        })
        .await?;
        Ok(())
    }

    async fn new_address(&self, label: &str, deadline: Duration) -> Result<NewAddress, WalletError> {
        let result = self
            .call("create_address", json!({ "account_index": 0, "label": label }), deadline)
            .await?;
        Ok(NewAddress {
            address: Self::field_str(&result, "address")?.to_string(),
            index: Self::field_u64(&result, "address_index")?,
        })
    }

    async fn address(&self, index: Index, deadline: Duration) -> Result<AddressInfo, WalletError> {
        let result = self
            .call(
                "get_balance",
                json!({ "account_index": 0, "address_indices": [index] }),
                deadline,
            )
            .await?;
        let per_subaddress = result
            .get("per_subaddress")
            .and_then(Value::as_array)
            .ok_or_else(|| WalletError::MalformedResponse("missing \"per_subaddress\"".to_string()))?;
        let entry = per_subaddress
            .iter()
            .find(|entry| entry.get("address_index").and_then(Value::as_u64) == Some(index))
            .ok_or_else(|| WalletError::Rpc(format!("unknown endpoint {index}")))?;
        Ok(AddressInfo {
            index,
            balance: Self::field_u64(entry, "balance")?,
            unlocked_balance: Self::field_u64(entry, "unlocked_balance")?,
        })
    }

    async fn validate_address(&self, address: &str, deadline: Duration) -> Result<bool, WalletError> {
        let result = self
            .call("validate_address", json!({ "address": address }), deadline)
            .await?;
        Ok(result.get("valid").and_then(Value::as_bool).unwrap_or(false))
    }

    async fn transfer(
        &self,
        request: &PayoutRequest,
        amount: u64,
        deadline: Duration,
    ) -> Result<TransferResult, WalletError> {
        if amount == 0 {
            return Err(WalletError::InsufficientBalance);
        }
        let result = self
            .call(
                "transfer",
                json!({
                    "destinations": [{ "amount": amount, "address": request.destination }],
                    "account_index": 0,
                    "subaddr_indices": [request.source_index],
                    "priority": priority_index(request.priority),
                    "unlock_time": request.unlock_time,
                    "get_tx_key": false,
                }),
                deadline,
            )
            .await
            .map_err(|e| match e {
                WalletError::Rpc(ref message) if message.contains("not enough") => {
                    WalletError::InsufficientBalance
                }
                other => other,
            })?;
        Ok(TransferResult {
            tx_id: Self::field_str(&result, "tx_hash")?.to_string(),
            source_index: request.source_index,
            amount: Self::field_u64(&result, "amount").unwrap_or(amount),
            fee: Self::field_u64(&result, "fee").unwrap_or(0),
        })
    }

    async fn sweep_all(
        &self,
        request: &PayoutRequest,
        deadline: Duration,
    ) -> Result<TransferResult, WalletError> {
        let result = self
            .call(
                "sweep_all",
                json!({
                    "address": request.destination,
                    "account_index": 0,
                    "subaddr_indices": [request.source_index],
                    "priority": priority_index(request.priority),
                    "unlock_time": request.unlock_time,
                }),
                deadline,
            )
            .await?;
        let tx_hashes = result
            .get("tx_hash_list")
            .and_then(Value::as_array)
            .ok_or_else(|| WalletError::MalformedResponse("missing \"tx_hash_list\"".to_string()))?;
        let amounts = result.get("amount_list").and_then(Value::as_array);
        let fees = result.get("fee_list").and_then(Value::as_array);
        let tx_id = tx_hashes
            .first()
            .and_then(Value::as_str)
            .ok_or(WalletError::InsufficientBalance)?
            .to_string();
        let amount = amounts
            .and_then(|a| a.first())
            .and_then(Value::as_u64)
            .unwrap_or(0);
        let fee = fees.and_then(|f| f.first()).and_then(Value::as_u64).unwrap_or(0);
        if amount == 0 {
            return Err(WalletError::InsufficientBalance);
        }
        Ok(TransferResult {
            tx_id,
            source_index: request.source_index,
            amount,
            fee,
        })
    }

    async fn transaction(
        &self,
        source_index: Index,
        tx_id: &str,
        deadline: Duration,
    ) -> Result<TransactionInfo, WalletError> {
        let result = self
            .call(
                "get_transfer_by_txid",
                json!({ "txid": tx_id, "account_index": 0 }),
                deadline,
            )
            .await?;
        let transfer = result
            .get("transfer")
            .ok_or_else(|| WalletError::UnknownTransaction(tx_id.to_string()))?;
        let confirmations = transfer.get("confirmations").and_then(Value::as_u64).unwrap_or(0);
        let status = if transfer.get("double_spend_seen").and_then(Value::as_bool) == Some(true) {
            TxStatus::Failed
        } else if confirmations > 0 {
            TxStatus::Completed
        } else {
            TxStatus::Pending
        };
        Ok(TransactionInfo {
            address: format!("subaddress:{source_index}"),
            amount: transfer.get("amount").and_then(Value::as_u64).unwrap_or(0),
            destination: Self::field_str(transfer, "address").unwrap_or_default().to_string(),
            status,
        })
    }
}

fn priority_index(priority: crate::payment::Priority) -> u8 {
    match priority {
        crate::payment::Priority::Low => 1,
        crate::payment::Priority::Medium => 2,
        crate::payment::Priority::High => 3,
    }
}
