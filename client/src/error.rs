//! Error types for the TaskLedger client.
//!
//! This module defines the crate-level error type aggregating the failure
//! modes of every client operation. Each failure is caught at its origin,
//! reported through a typed result, and leaves prior state untouched; no
//! error is fatal to a running client.

use thiserror::Error;

use crate::config::ConfigError;
use crate::contract::{BindingError, ConfirmationError};
use crate::provider::RpcError;
use crate::wallet::WalletError;

/// Errors that can occur during client operations.
///
/// This is the primary error type for the client crate. Variants map to the
/// stages of the wallet-connection and contract-interaction pipeline: every
/// operation fails in exactly one of these ways, and a failed operation
/// never leaves partial state behind.
#[derive(Error, Debug)]
pub enum ClientError {
    /// No wallet-capable execution context was detected.
    ///
    /// Surfaced by `connect` when provider detection found no wallet
    /// keystore. No session or contract operation is possible until a
    /// wallet exists.
    #[error("no wallet provider detected")]
    CapabilityUnavailable,

    /// Account authorization was rejected or failed.
    ///
    /// The session remains disconnected; no partial session state is kept.
    #[error("wallet authorization failed: {0}")]
    Authorization(#[from] WalletError),

    /// A contract handle could not be constructed.
    ///
    /// Covers a missing or malformed contract address, an interface schema
    /// that does not expose the required operations, and signer loading
    /// failures. No handle is produced.
    #[error("contract binding failed: {0}")]
    Binding(#[from] BindingError),

    /// The remote task read failed.
    ///
    /// The previous local task list is left unchanged.
    #[error("task fetch failed: {0}")]
    Fetch(#[source] RpcError),

    /// A write call was rejected before confirmation.
    #[error("submission failed: {0}")]
    Submission(#[source] RpcError),

    /// A submitted write reverted, or was not confirmed in time.
    ///
    /// The write must be treated as not applied; local state is unchanged.
    #[error("confirmation failed: {0}")]
    Confirmation(#[from] ConfirmationError),

    /// Configuration-related error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// A specialized `Result` type for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;
