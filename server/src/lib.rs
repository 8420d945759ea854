//! # `moneta-gate-server`: a standalone Monero payment gateway.
//!
//! `moneta-gate-server` is a batteries-included payment gateway built around
//! the general purpose `moneta-gate` engine: it loads YAML configuration,
//! opens a `monero-wallet-rpc` connection and a `sled` payment store, starts
//! the scanning loop, and serves the two-endpoint HTTP API.
//!
//! This library is intended for use by the `moneta-gate-server` binary, and
//! is not intended to be used on its own.

#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(clippy::cargo)]
#![allow(clippy::module_name_repetitions)]

mod config;
mod decimal;
pub mod logging;
pub mod server;

use std::time::Duration;

use log::info;
use moneta_gate::{driver::Gateway, intake::IntakePolicy, store::sled_store::SledStore, wallet::rpc::RpcWallet};
use secrecy::ExposeSecret;

use crate::{
    config::Config,
    logging::{init_logger, set_verbosity},
};

/// Deadline applied to wallet calls issued outside of the scanning loop
/// (intake's `validate_address`/`new_address`, and wallet/store startup).
const WALLET_DEADLINE: Duration = Duration::from_secs(120);

/// Start a standalone payment gateway: load config, build and run the
/// gateway, and serve the HTTP API until shutdown.
pub async fn entrypoint() {
    init_logger();
    let config = load_config();
    set_verbosity(config.logging);

    let gateway = build_gateway(&config).await;
    info!("payment gateway created");

    gateway.run().await.expect("failed to start scanning loop");
    info!("payment gateway scanning loop running");

    run_server(&config, gateway).await;
}

/// Loads config.
///
/// # Panics
///
/// Panics if the config could not be read or validated.
#[must_use]
pub fn load_config() -> Config {
    let path = Config::get_path();
    let config = Config::read(&path).expect("failed to read config");
    config.validate();

    config
}

/// Build a payment gateway from provided config: opens the sled payment
/// store and the `monero-wallet-rpc` connection, then constructs the
/// gateway with the configured intake policy. Does not start the scanning
/// loop; call [`Gateway::run`] for that.
///
/// # Panics
///
/// Panics if the payment store or wallet could not be opened.
pub async fn build_gateway(config: &Config) -> Gateway<RpcWallet, SledStore> {
    std::fs::create_dir_all(&config.database_path).expect("failed to create DB dir");
    let db_path = config
        .database_path
        .canonicalize()
        .expect("could not determine absolute database path")
        .join("database");
    let db_path_str = db_path.to_str().expect("failed to cast DB path to string");
    let store = SledStore::new(db_path_str, "payments").expect("failed to open payment store");

    let wallet = RpcWallet::new(
        config
            .wallet
            .rpc_url
            .parse()
            .expect("wallet.rpc-url must be a valid URL"),
        config.wallet.rpc_username.clone(),
        config
            .wallet
            .rpc_password
            .as_ref()
            .map(|p| p.expose_secret().clone()),
    );
    let password = config
        .wallet
        .password
        .as_ref()
        .map(|p| p.expose_secret().clone())
        .unwrap_or_default();
    wallet
        .open_wallet(&config.wallet.filename, &password, WALLET_DEADLINE)
        .await
        .expect("failed to open wallet");

    let min_amount = decimal::to_units(&config.min_amount).expect("min-amount must be a valid decimal");
    let max_amount = decimal::to_units(&config.max_amount).expect("max-amount must be a valid decimal");

    Gateway::builder(wallet, store)
        .policy(IntakePolicy {
            min_amount,
            max_amount,
            receive_timeout: config.receive_timeout(),
            fee_percentage: config.fee_percentage,
            beneficiary_address_for_fee: config.beneficiary_address.clone(),
            wallet_deadline: WALLET_DEADLINE,
        })
        .process_interval(config.process_interval())
        .build()
}

/// Start the HTTP server, serving until shutdown.
///
/// # Panics
///
/// Panics if the server could not be bound or encounters an unrecoverable
/// error while running.
pub async fn run_server(config: &Config, gateway: Gateway<RpcWallet, SledStore>) {
    server::serve(config.listen_address, gateway)
        .await
        .expect("failed to run HTTP server");
}
