//! Wallet provider binding and ledger RPC transport.
//!
//! The provider wraps the wallet-capable execution context the client runs
//! in: a local wallet keystore plus a ledger JSON-RPC endpoint. Detection
//! runs once, at application construction, and the result is cached for the
//! process lifetime. When no wallet context exists the client reports a
//! "no wallet provider" condition instead of failing later.
//!
//! The transport is JSON-RPC 2.0 over HTTP with:
//!
//! - Connection pooling via reqwest
//! - A per-request timeout
//! - Typed mapping of HTTP and remote RPC failures

use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::Config;
use crate::types::Address;
use crate::wallet::{Wallet, WalletError};

/// HTTP request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Errors that can occur during ledger RPC calls.
#[derive(Error, Debug)]
pub enum RpcError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Endpoint returned a non-success HTTP status.
    #[error("endpoint error: {status} - {message}")]
    Status { status: u16, message: String },

    /// The ledger returned a JSON-RPC error object.
    #[error("remote error {code}: {message}")]
    Remote { code: i64, message: String },

    /// JSON serialization or deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: Uuid,
    method: &'a str,
    params: Value,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// JSON-RPC 2.0 response envelope.
#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorObject>,
}

/// HTTP JSON-RPC client for the ledger endpoint.
#[derive(Debug, Clone)]
pub struct RpcClient {
    http: Client,
    url: String,
}

impl RpcClient {
    /// Creates a new client for the given endpoint URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(10)
            .build()
            .expect("failed to create HTTP client");

        Self {
            http,
            url: url.into(),
        }
    }

    /// Sends a single JSON-RPC request and returns its result value.
    ///
    /// A `null` or absent result is returned as `Value::Null`; a JSON-RPC
    /// error object is mapped to [`RpcError::Remote`].
    ///
    /// # Errors
    ///
    /// Returns `RpcError` if the request fails at the HTTP layer, the
    /// endpoint answers with a non-success status, or the ledger reports an
    /// error.
    pub async fn request(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let envelope = RpcRequest {
            jsonrpc: "2.0",
            id: Uuid::new_v4(),
            method,
            params,
        };

        debug!(url = %self.url, method, "Sending RPC request");

        let response = self.http.post(&self.url).json(&envelope).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RpcError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: RpcResponse = response.json().await?;
        if let Some(err) = parsed.error {
            return Err(RpcError::Remote {
                code: err.code,
                message: err.message,
            });
        }

        Ok(parsed.result.unwrap_or(Value::Null))
    }
}

/// The wallet provider capability.
///
/// Binds the wallet keystore directory to the ledger RPC endpoint. A
/// `Provider` existing means a wallet-capable context was detected; its
/// absence means no session or contract operation is possible.
#[derive(Debug, Clone)]
pub struct Provider {
    wallet_dir: PathBuf,
    rpc: RpcClient,
}

impl Provider {
    /// Creates a provider without running detection.
    ///
    /// Callers normally use [`Provider::detect`]; this constructor exists
    /// for wiring up a provider over a known wallet directory.
    #[must_use]
    pub fn new(wallet_dir: PathBuf, rpc_url: impl Into<String>) -> Self {
        Self {
            wallet_dir,
            rpc: RpcClient::new(rpc_url),
        }
    }

    /// Detects whether a wallet-capable execution context is available.
    ///
    /// Returns `None` when no key material exists, after reporting the
    /// condition. Intended to run once per process; the caller caches the
    /// result.
    #[must_use]
    pub fn detect(config: &Config) -> Option<Self> {
        if Wallet::available(&config.wallet_dir) {
            debug!(wallet_dir = %config.wallet_dir.display(), "Wallet provider detected");
            Some(Self::new(config.wallet_dir.clone(), config.rpc_url.clone()))
        } else {
            error!(
                wallet_dir = %config.wallet_dir.display(),
                "No wallet provider detected; run 'taskledger init' to create one"
            );
            None
        }
    }

    /// Requests account access from the wallet.
    ///
    /// Returns the ordered addresses the wallet controls, or an empty list
    /// when the keystore holds no keys.
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if key material exists but cannot be loaded.
    pub fn request_accounts(&self) -> Result<Vec<Address>, WalletError> {
        if !Wallet::available(&self.wallet_dir) {
            return Ok(Vec::new());
        }

        let (wallet, source) = Wallet::load_with_fallback(&self.wallet_dir)?;
        let address = wallet.address();
        info!(%address, ?source, "Account access granted");
        Ok(vec![address])
    }

    /// Produces the signing capability used to authorize writes.
    ///
    /// # Errors
    ///
    /// Returns `WalletError` if the key material cannot be loaded.
    pub fn signer(&self) -> Result<Wallet, WalletError> {
        let (wallet, _) = Wallet::load_with_fallback(&self.wallet_dir)?;
        Ok(wallet)
    }

    /// Returns the ledger RPC client.
    #[must_use]
    pub fn rpc(&self) -> &RpcClient {
        &self.rpc
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    fn test_config(wallet_dir: PathBuf) -> Config {
        Config {
            rpc_url: "http://localhost:0".to_string(),
            contract_address: None,
            wallet_dir,
            confirm_timeout_secs: 1,
            confirm_poll_ms: 10,
        }
    }

    #[test]
    #[serial]
    fn detect_returns_none_without_key_material() {
        std::env::remove_var("TASKLEDGER_PRIVATE_KEY");
        let dir = TempDir::new().unwrap();

        assert!(Provider::detect(&test_config(dir.path().to_path_buf())).is_none());
    }

    #[test]
    #[serial]
    fn detect_finds_wallet_key_file() {
        std::env::remove_var("TASKLEDGER_PRIVATE_KEY");
        let dir = TempDir::new().unwrap();
        Wallet::generate().save(dir.path()).unwrap();

        assert!(Provider::detect(&test_config(dir.path().to_path_buf())).is_some());
    }

    #[test]
    #[serial]
    fn request_accounts_empty_without_keys() {
        std::env::remove_var("TASKLEDGER_PRIVATE_KEY");
        let dir = TempDir::new().unwrap();
        let provider = Provider::new(dir.path().to_path_buf(), "http://localhost:0");

        let accounts = provider.request_accounts().unwrap();
        assert!(accounts.is_empty());
    }

    #[test]
    #[serial]
    fn request_accounts_returns_wallet_address() {
        std::env::remove_var("TASKLEDGER_PRIVATE_KEY");
        let dir = TempDir::new().unwrap();
        let wallet = Wallet::generate();
        wallet.save(dir.path()).unwrap();

        let provider = Provider::new(dir.path().to_path_buf(), "http://localhost:0");
        let accounts = provider.request_accounts().unwrap();

        assert_eq!(accounts, vec![wallet.address()]);
    }

    #[test]
    #[serial]
    fn signer_matches_requested_account() {
        std::env::remove_var("TASKLEDGER_PRIVATE_KEY");
        let dir = TempDir::new().unwrap();
        Wallet::generate().save(dir.path()).unwrap();

        let provider = Provider::new(dir.path().to_path_buf(), "http://localhost:0");
        let accounts = provider.request_accounts().unwrap();
        let signer = provider.signer().unwrap();

        assert_eq!(accounts[0], signer.address());
    }
}
