//! TaskLedger Client - wallet-connected task ledger client.
//!
//! This crate provides the wallet-connection and contract-interaction state
//! machine for a task list whose authoritative state lives in a remote
//! ledger-backed contract.
//!
//! # Overview
//!
//! The client detects a wallet-capable execution context once at startup,
//! establishes an authorized session with it, binds a callable handle to
//! the task contract, and keeps a local read-only projection of the remote
//! task collection. Writes (add, complete, delete) are signed, submitted,
//! and only treated as applied once the ledger confirms them, after which
//! the whole local list is re-fetched. The list is never patched in place
//! and never updated optimistically, so it can be stale but never
//! partially diverged from remote truth.
//!
//! # Modules
//!
//! - [`app`]: Application state machine orchestrating all components
//! - [`config`]: Configuration from environment variables
//! - [`contract`]: Contract binding, interface schema, and confirmation
//! - [`error`]: Error types for client operations
//! - [`provider`]: Wallet provider detection and ledger RPC transport
//! - [`session`]: Wallet session management
//! - [`tasks`]: Task records and remote synchronization
//! - [`types`]: Addresses, transaction hashes, and receipts
//! - [`wallet`]: Ed25519 keystore and write authorization

pub mod app;
pub mod config;
pub mod contract;
pub mod error;
pub mod provider;
pub mod session;
pub mod tasks;
pub mod types;
pub mod wallet;

pub use app::{App, AppState};
pub use config::Config;
pub use contract::{
    BindingError, ConfirmationError, ContractHandle, InterfaceSpec, MethodSpec,
    PendingTransaction, TASK_INTERFACE,
};
pub use error::{ClientError, Result};
pub use provider::{Provider, RpcClient, RpcError};
pub use session::Session;
pub use tasks::{fetch_tasks, Task};
pub use types::{Address, AddressParseError, Receipt, TxHash, TxStatus};
pub use wallet::{KeySource, Wallet, WalletError};
