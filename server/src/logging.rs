//! Logging utilities for `moneta-gate-server`.

use log::LevelFilter;

use crate::config::LoggingConfig;

/// Initialize the logging implementation. Defaults to `Trace` verbosity for
/// `moneta_gate` and this crate, `Warn` for dependencies.
pub fn init_logger() {
    env_logger::builder()
        .filter_level(LevelFilter::Warn)
        .filter_module("moneta_gate", LevelFilter::Trace)
        .filter_module("moneta_gate_server", LevelFilter::Trace)
        .init();
}

/// Set verbosity to one of:
/// * Trace
/// * Debug
/// * Info
/// * Error
/// * Warn
pub fn set_verbosity(config: LoggingConfig) {
    log::set_max_level(config.verbosity);
}
