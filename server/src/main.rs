//! # `moneta-gate-server`: a Monero payment gateway.
//! `moneta-gate-server` is a batteries-included payment gateway built around
//! the `moneta-gate` engine library.
//!
//! If your application requires more flexibility than `moneta-gate-server`
//! offers, consider depending on [`moneta_gate`] directly.

#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![warn(clippy::cargo)]
#![allow(clippy::module_name_repetitions)]

use moneta_gate_server::entrypoint;

#[tokio::main]
async fn main() {
    entrypoint().await;
}
