//! # `moneta-gate`: a custodial Monero payment gateway engine
//!
//! This crate is the payment lifecycle engine behind a Monero payment
//! gateway: a persistent payment state machine keyed by UUID, a two-phase
//! payout pipeline (beneficiary leg, then fee leg) driven by periodic
//! scanners over secondary indexes, and the wallet abstraction that lets a
//! mock and a real `monero-wallet-rpc` plug in interchangeably.
//!
//! ## Key pieces
//! * [`wallet`] — the capability a custodial wallet must provide.
//! * [`store`] — the transactional KV holding payment records and indexes.
//! * [`payment`] — the payment aggregate, its legs, and their statuses.
//! * [`intake`] / [`query`] — create and read payments.
//! * [`scanner`] / [`payout`] — the periodic workers that move payments
//!   through their lifecycle.
//! * [`driver`] — wires the above into one [`driver::Gateway`] handle.
//!
//! ## Example
//! ```
//! use moneta_gate::{
//!     driver::Gateway,
//!     intake::{IntakePolicy, PaymentRequest},
//!     store::memory_store::MemoryStore,
//!     wallet::mock::MockWallet,
//! };
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let gateway = Gateway::builder(MockWallet::new(), MemoryStore::new())
//!     .policy(IntakePolicy {
//!         min_amount: 1,
//!         max_amount: 1_000_000_000_000_000,
//!         receive_timeout: Duration::from_secs(24 * 3600),
//!         fee_percentage: 10,
//!         beneficiary_address_for_fee: "operator-address".to_string(),
//!         wallet_deadline: Duration::from_secs(30),
//!     })
//!     .build();
//!
//! let payment = gateway
//!     .receive(PaymentRequest {
//!         address: "business-address".to_string(),
//!         amount: 1_000_000_000,
//!         priority: "medium".to_string(),
//!     })
//!     .await?;
//! println!("created payment {}", payment.id);
//! # Ok(())
//! # }
//! ```

pub mod driver;
pub mod error;
pub mod intake;
pub mod payment;
pub mod payout;
pub mod query;
pub mod scanner;
pub mod store;
pub mod wallet;

pub use error::GatewayError;
pub use payment::{Id, Payment};
