#![allow(missing_docs)]
#![allow(clippy::missing_panics_doc)]

mod fixtures;

pub use fixtures::{mock_gateway, sample_policy};
use tempfile::Builder;
use tracing_subscriber::{filter::LevelFilter, prelude::*, EnvFilter};

/// A placeholder customer-facing address, distinct from [`OPERATOR_ADDRESS`],
/// for use as a payment's receiving address in tests that don't exercise
/// real subaddress derivation.
pub const CUSTOMER_ADDRESS: &str =
    "4613YiHLM6JMH4zejMB2zJY5TwQCxL8p65ufw8kBP5yxX9itmuGLqp1dS4tkVoTxjyH3aYhYNrtGHbQzJQP5bFus3KHVdmf";
/// A placeholder beneficiary address for the fee leg, distinct from
/// [`CUSTOMER_ADDRESS`].
pub const OPERATOR_ADDRESS: &str =
    "888tNkZrPN6JsEgekjMnABU4TBzc2Dt29EPAvkRxbANsAnjyPbb3iQ1YBRk1UXcdRsiKc9dhwMVgN5S9cQUiyoogDavup3H";

/// Creates a fresh, uniquely-named temporary directory path, for tests that
/// need a backing directory for a [`moneta_gate::store::sled_store::SledStore`].
///
/// # Panics
///
/// Panics if a temporary directory could not be created.
#[must_use]
pub fn new_temp_dir() -> String {
    Builder::new()
        .prefix("temp_db_")
        .rand_bytes(16)
        .tempdir()
        .expect("failed to generate temporary directory")
        .path()
        .to_str()
        .expect("failed to get temporary directory path")
        .to_string()
}

/// Initialize the logging implementation.
pub fn init_logger() {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::DEBUG.into())
        .from_env_lossy();
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_test_writer()
        .with_filter(filter);
    let _ = tracing_subscriber::registry().with(fmt_layer).try_init();
}
