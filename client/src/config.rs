//! Configuration module for the TaskLedger client.
//!
//! This module handles parsing configuration from environment variables.
//!
//! # Environment Variables
//!
//! | Variable | Required | Default | Description |
//! |----------|----------|---------|-------------|
//! | `TASKLEDGER_RPC_URL` | Yes | - | Ledger JSON-RPC endpoint (e.g., `https://rpc.taskledger.dev`) |
//! | `TASKLEDGER_CONTRACT_ADDRESS` | No* | - | Task contract address (`0x` + 40 hex chars) |
//! | `TASKLEDGER_WALLET_DIR` | No | `~/.taskledger` | Directory containing `key.priv` and `key.pub` |
//! | `TASKLEDGER_CONFIRM_TIMEOUT_SECS` | No | 60 | Max seconds to wait for a transaction confirmation |
//! | `TASKLEDGER_CONFIRM_POLL_MS` | No | 500 | Milliseconds between receipt polls |
//!
//! *The contract address is kept as an unvalidated optional string here:
//! its absence or a malformed value is surfaced when the contract binding
//! is constructed, not at startup.
//!
//! # Example
//!
//! ```no_run
//! use taskledger_client::config::Config;
//!
//! let config = Config::from_env().expect("Failed to load configuration");
//! println!("RPC URL: {}", config.rpc_url);
//! ```

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;
use thiserror::Error;

/// Default confirmation timeout in seconds.
const DEFAULT_CONFIRM_TIMEOUT_SECS: u64 = 60;

/// Default receipt poll interval in milliseconds.
const DEFAULT_CONFIRM_POLL_MS: u64 = 500;

/// Default wallet directory name relative to home.
const DEFAULT_WALLET_DIR: &str = ".taskledger";

/// Errors that can occur during configuration parsing.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable has an invalid value.
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Failed to determine home directory.
    #[error("failed to determine home directory")]
    NoHomeDirectory,
}

/// Configuration for the TaskLedger client.
#[derive(Debug, Clone)]
pub struct Config {
    /// Ledger JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Raw contract address string, if configured.
    ///
    /// Validated lazily by the contract binding so that a missing or
    /// malformed address is reported as a binding failure.
    pub contract_address: Option<String>,

    /// Path to the directory containing the wallet keypair.
    pub wallet_dir: PathBuf,

    /// Maximum time to wait for a submitted write to be confirmed.
    pub confirm_timeout_secs: u64,

    /// Interval between transaction receipt polls.
    pub confirm_poll_ms: u64,
}

impl Config {
    /// Creates a new `Config` by parsing environment variables.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if:
    /// - `TASKLEDGER_RPC_URL` is not set
    /// - A numeric variable is set but cannot be parsed as a positive integer
    /// - The home directory cannot be determined (needed for the default
    ///   wallet path)
    pub fn from_env() -> Result<Self, ConfigError> {
        let base_dirs = BaseDirs::new().ok_or(ConfigError::NoHomeDirectory)?;
        let home_dir = base_dirs.home_dir();

        // Required: TASKLEDGER_RPC_URL
        let rpc_url = env::var("TASKLEDGER_RPC_URL")
            .map_err(|_| ConfigError::MissingEnvVar("TASKLEDGER_RPC_URL".to_string()))?;

        // Optional: TASKLEDGER_CONTRACT_ADDRESS (validated at binding time)
        let contract_address = env::var("TASKLEDGER_CONTRACT_ADDRESS").ok();

        // Optional: TASKLEDGER_WALLET_DIR (default: ~/.taskledger)
        let wallet_dir = env::var("TASKLEDGER_WALLET_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| home_dir.join(DEFAULT_WALLET_DIR));

        let confirm_timeout_secs = parse_positive_u64(
            "TASKLEDGER_CONFIRM_TIMEOUT_SECS",
            DEFAULT_CONFIRM_TIMEOUT_SECS,
        )?;

        let confirm_poll_ms =
            parse_positive_u64("TASKLEDGER_CONFIRM_POLL_MS", DEFAULT_CONFIRM_POLL_MS)?;

        Ok(Self {
            rpc_url,
            contract_address,
            wallet_dir,
            confirm_timeout_secs,
            confirm_poll_ms,
        })
    }
}

/// Parses an optional positive integer environment variable.
fn parse_positive_u64(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(val) => {
            let parsed = val.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected positive integer, got '{val}'"),
            })?;
            if parsed == 0 {
                return Err(ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: "value must be greater than 0".to_string(),
                });
            }
            Ok(parsed)
        }
        Err(_) => Ok(default),
    }
}
