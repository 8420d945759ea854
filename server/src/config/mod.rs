mod logging;
mod wallet;

use std::{
    env::VarError,
    fs::File,
    io,
    io::{ErrorKind as IoErrorKind, Write},
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use clap::{Arg, ArgAction, Command};
use dotenv::dotenv;
use log::info;
pub(crate) use logging::LoggingConfig;
use serde::{Deserialize, Serialize};
use serde_yaml::Error as YamlError;
use thiserror::Error;
pub(crate) use wallet::WalletConfig;

use crate::decimal;

/// `moneta-gate-server` configuration.
#[derive(Deserialize, Serialize, PartialEq, Debug, Clone)]
pub struct Config {
    /// Interval, in seconds, between scanning passes.
    #[serde(rename = "processInterval")]
    pub process_interval: u64,
    /// Address the HTTP API listens on.
    #[serde(rename = "listen-address")]
    pub listen_address: SocketAddr,
    /// Directory the payment store's sled database is opened in.
    #[serde(rename = "database-path")]
    pub database_path: PathBuf,
    /// Inclusive lower bound on a payment's requested amount, as a decimal
    /// string.
    #[serde(rename = "min-amount")]
    pub min_amount: String,
    /// Inclusive upper bound on a payment's requested amount, as a decimal
    /// string.
    #[serde(rename = "max-amount")]
    pub max_amount: String,
    /// Seconds a payment waits for funds before expiring.
    #[serde(rename = "receive-timeout")]
    pub receive_timeout: u64,
    /// Percentage of each payment's received amount retained as fee.
    #[serde(rename = "fee-percentage")]
    pub fee_percentage: u64,
    /// The operator's payout address for the fee leg. Never exposed over
    /// the HTTP API.
    #[serde(rename = "beneficiary-address")]
    pub beneficiary_address: String,
    /// `monero-wallet-rpc` connection settings.
    pub wallet: WalletConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Default configuration file path.
    pub const DEFAULT_PATH: &'static str = "moneta-gate.yaml";

    /// Get config file path from CLI argument, env variable, or default (in
    /// that order).
    #[allow(clippy::missing_panics_doc)]
    #[must_use]
    pub fn get_path() -> PathBuf {
        let cli_matches = Command::new("moneta-gate-server")
            .arg(
                Arg::new("config-file")
                    .short('f')
                    .long("config-file")
                    .action(ArgAction::Set)
                    .value_name("FILE")
                    .env("CONFIG_FILE")
                    .default_value(Self::DEFAULT_PATH)
                    .help("Specifies the config file to use. Defaults to ./moneta-gate.yaml"),
            )
            .get_matches();

        // This `unwrap` is safe because args with a default never return `None`.
        PathBuf::from(cli_matches.get_one::<String>("config-file").unwrap())
    }

    /// Creates config from file. If the file is not found, creates it and
    /// populates it from defaults.
    fn from_file(path: &PathBuf) -> Result<Config, ConfigError> {
        let config_file = match File::open(path) {
            Ok(f) => f,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                info!(
                    "Config file {} not found. Creating it from defaults.",
                    path.display()
                );
                let mut f = File::create(path)?;
                let config = Config::default();
                f.write_all(serde_yaml::to_string(&config)?.as_bytes())?;
                return Ok(config);
            }
            Err(e) => return Err(e)?,
        };

        Ok(serde_yaml::from_reader(config_file)?)
    }

    fn apply_env_overrides(mut self) -> Result<Config, ConfigError> {
        // Read from dotenv file if real environment variables are not set.
        dotenv().ok();

        self.wallet = self.wallet.apply_env_overrides()?;

        Ok(self)
    }

    /// Validates configuration, panicking if it is invalid.
    pub fn validate(&self) {
        self.wallet.validate();
        assert!(
            !self.beneficiary_address.is_empty(),
            "please configure beneficiary-address"
        );
        assert!(
            self.fee_percentage <= 100,
            "fee-percentage must be between 0 and 100"
        );
        decimal::to_units(&self.min_amount).expect("min-amount must be a valid decimal");
        decimal::to_units(&self.max_amount).expect("max-amount must be a valid decimal");
    }

    /// Read config and apply environment overrides.
    pub(crate) fn read(path: &PathBuf) -> Result<Config, ConfigError> {
        Self::from_file(path)?.apply_env_overrides()
    }

    /// The scan interval as a [`Duration`].
    #[must_use]
    pub fn process_interval(&self) -> Duration {
        Duration::from_secs(self.process_interval)
    }

    /// The receive timeout as a [`Duration`].
    #[must_use]
    pub fn receive_timeout(&self) -> Duration {
        Duration::from_secs(self.receive_timeout)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            process_interval: 60,
            listen_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            database_path: PathBuf::from("moneta-gate-db/"),
            min_amount: "0.000001".to_string(),
            max_amount: "1000".to_string(),
            receive_timeout: 24 * 3600,
            fee_percentage: 1,
            beneficiary_address: String::new(),
            wallet: WalletConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[derive(Error, Debug)]
pub(crate) enum ConfigError {
    #[error("Failed to read config value from environment: {0}")]
    Env(#[from] VarError),
    #[error("Failed to read/write config file: {0}")]
    Io(#[from] io::Error),
    #[error("Error (de)serializing config file: {0}")]
    Yaml(#[from] YamlError),
}
