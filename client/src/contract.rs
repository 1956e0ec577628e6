//! Contract binding and write confirmation.
//!
//! A [`ContractHandle`] is a callable capability bound to a contract
//! address, an interface schema, and the signing capability of an active
//! session. It is a derived value: it exists only while a session is
//! connected, and is rebuilt from scratch whenever a session is
//! (re)established. Each handle carries a generation token so that results
//! from a handle that has since been invalidated can be recognized as stale
//! and discarded.
//!
//! Writes return a [`PendingTransaction`]: the write is not durable until
//! [`PendingTransaction::wait`] observes a confirmed receipt. An absent
//! receipt past the configured timeout is a terminal confirmation failure,
//! not an indefinite wait.

use std::time::Duration;

use serde_json::{json, Value};
use thiserror::Error;
use tokio::time::{sleep, Instant};
use tracing::{debug, info};

use crate::config::Config;
use crate::provider::{Provider, RpcClient, RpcError};
use crate::session::Session;
use crate::types::{Address, AddressParseError, Receipt, TxHash, TxStatus};
use crate::wallet::{Wallet, WalletError};

/// Descriptor for one contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSpec {
    /// Wire-level method name.
    pub name: &'static str,
    /// Whether the method mutates contract state (write vs read).
    pub mutates: bool,
    /// Number of arguments the method takes.
    pub arity: usize,
}

/// An ABI-equivalent description of a contract interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceSpec {
    /// The methods the contract exposes.
    pub methods: &'static [MethodSpec],
}

impl InterfaceSpec {
    /// Looks up a method descriptor by name.
    #[must_use]
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods.iter().find(|m| m.name == name)
    }
}

/// Interface of the task ledger contract: one read returning the full
/// ordered task collection, three writes.
pub static TASK_INTERFACE: InterfaceSpec = InterfaceSpec {
    methods: &[
        MethodSpec {
            name: "getTasks",
            mutates: false,
            arity: 0,
        },
        MethodSpec {
            name: "addTask",
            mutates: true,
            arity: 1,
        },
        MethodSpec {
            name: "completeTask",
            mutates: true,
            arity: 1,
        },
        MethodSpec {
            name: "deleteTask",
            mutates: true,
            arity: 1,
        },
    ],
};

/// Methods the client requires the bound interface to expose.
const REQUIRED_METHODS: [MethodSpec; 4] = [
    MethodSpec {
        name: "getTasks",
        mutates: false,
        arity: 0,
    },
    MethodSpec {
        name: "addTask",
        mutates: true,
        arity: 1,
    },
    MethodSpec {
        name: "completeTask",
        mutates: true,
        arity: 1,
    },
    MethodSpec {
        name: "deleteTask",
        mutates: true,
        arity: 1,
    },
];

/// Errors that can occur while constructing a contract handle.
#[derive(Error, Debug)]
pub enum BindingError {
    /// No contract address was configured.
    #[error("no contract address configured")]
    MissingAddress,

    /// The configured contract address is not a valid ledger address.
    #[error("malformed contract address: {0}")]
    MalformedAddress(#[from] AddressParseError),

    /// The interface schema does not expose a required method with the
    /// expected shape.
    #[error("interface schema mismatch on method: {0}")]
    SchemaMismatch(&'static str),

    /// The session's signing capability could not be obtained.
    #[error("signer unavailable: {0}")]
    Signer(#[from] WalletError),
}

/// Errors that can occur while waiting for a confirmation.
#[derive(Error, Debug)]
pub enum ConfirmationError {
    /// The ledger finalized the transaction as rolled back.
    #[error("transaction {hash} reverted")]
    Reverted { hash: TxHash },

    /// No receipt appeared within the configured timeout. The write must
    /// be treated as not applied.
    #[error("transaction {hash} still unconfirmed after {waited_secs}s")]
    TimedOut { hash: TxHash, waited_secs: u64 },

    /// The receipt lookup itself failed.
    #[error("receipt lookup failed: {0}")]
    Receipt(#[from] RpcError),
}

/// A callable capability bound to the task contract.
///
/// Read calls go straight to the ledger; write calls are signed with the
/// session's wallet and produce a [`PendingTransaction`].
#[derive(Debug, Clone)]
pub struct ContractHandle {
    address: Address,
    interface: &'static InterfaceSpec,
    signer: Wallet,
    account: Address,
    rpc: RpcClient,
    generation: u64,
    confirm_timeout: Duration,
    confirm_poll: Duration,
}

impl ContractHandle {
    /// Constructs a handle from an active session.
    ///
    /// Validates the configured contract address, checks that `interface`
    /// exposes every operation the client requires, and obtains the signing
    /// capability from the provider. Idempotent: binding again simply
    /// produces a fresh handle under a new generation.
    ///
    /// # Errors
    ///
    /// Returns `BindingError` if the address is missing or malformed, the
    /// schema lacks a required method, or the signer cannot be loaded. No
    /// handle is produced on failure.
    pub fn bind(
        provider: &Provider,
        session: &Session,
        config: &Config,
        interface: &'static InterfaceSpec,
        generation: u64,
    ) -> Result<Self, BindingError> {
        let raw = config
            .contract_address
            .as_deref()
            .ok_or(BindingError::MissingAddress)?;
        let address = Address::parse(raw)?;

        for required in &REQUIRED_METHODS {
            match interface.method(required.name) {
                Some(found) if found == required => {}
                _ => return Err(BindingError::SchemaMismatch(required.name)),
            }
        }

        let signer = provider.signer()?;
        let account = session.primary_account().clone();

        info!(contract = %address, %account, generation, "Contract handle bound");

        Ok(Self {
            address,
            interface,
            signer,
            account,
            rpc: provider.rpc().clone(),
            generation,
            confirm_timeout: Duration::from_secs(config.confirm_timeout_secs),
            confirm_poll: Duration::from_millis(config.confirm_poll_ms),
        })
    }

    /// Returns the generation token this handle was bound under.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns the bound contract address.
    #[must_use]
    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Returns the interface schema the handle was bound against.
    #[must_use]
    pub fn interface(&self) -> &'static InterfaceSpec {
        self.interface
    }

    /// Invokes a read-only contract method.
    async fn call(&self, method: &str, args: Vec<Value>) -> Result<Value, RpcError> {
        self.rpc
            .request(
                "ledger_call",
                json!({ "to": self.address, "method": method, "args": args }),
            )
            .await
    }

    /// Submits a signed write call, returning its pending transaction.
    async fn submit(&self, method: &str, args: Vec<Value>) -> Result<PendingTransaction, RpcError> {
        let call = json!({ "to": self.address, "method": method, "args": args });
        let signature = self.signer.sign(&serde_json::to_vec(&call)?);

        let result = self
            .rpc
            .request(
                "ledger_submit",
                json!({
                    "to": self.address,
                    "method": method,
                    "args": args,
                    "from": self.account,
                    "signature": signature,
                }),
            )
            .await?;

        let hash: TxHash = serde_json::from_value(result)?;
        info!(%hash, method, "Write submitted");

        Ok(PendingTransaction {
            hash,
            rpc: self.rpc.clone(),
            timeout: self.confirm_timeout,
            poll: self.confirm_poll,
        })
    }

    /// Reads the full ordered task collection as raw wire records.
    pub async fn get_tasks(&self) -> Result<Value, RpcError> {
        self.call("getTasks", Vec::new()).await
    }

    /// Submits an `addTask` write.
    pub async fn add_task(&self, text: &str) -> Result<PendingTransaction, RpcError> {
        self.submit("addTask", vec![json!(text)]).await
    }

    /// Submits a `completeTask` write for the task at `index`.
    pub async fn complete_task(&self, index: usize) -> Result<PendingTransaction, RpcError> {
        self.submit("completeTask", vec![json!(index)]).await
    }

    /// Submits a `deleteTask` write for the task at `index`.
    pub async fn delete_task(&self, index: usize) -> Result<PendingTransaction, RpcError> {
        self.submit("deleteTask", vec![json!(index)]).await
    }
}

/// A submitted write awaiting ledger finalization.
#[must_use = "a submitted write is not durable until wait() observes its confirmation"]
#[derive(Debug)]
pub struct PendingTransaction {
    hash: TxHash,
    rpc: RpcClient,
    timeout: Duration,
    poll: Duration,
}

impl PendingTransaction {
    /// Returns the pending transaction hash.
    #[must_use]
    pub fn hash(&self) -> &TxHash {
        &self.hash
    }

    /// Suspends until the ledger finalizes the transaction.
    ///
    /// Polls the receipt endpoint at the configured interval. Resolves with
    /// the receipt once the transaction is confirmed.
    ///
    /// # Errors
    ///
    /// Returns `ConfirmationError` if the transaction reverted, no receipt
    /// appeared before the timeout, or a receipt lookup failed.
    pub async fn wait(self) -> Result<Receipt, ConfirmationError> {
        let deadline = Instant::now() + self.timeout;

        loop {
            let result = self
                .rpc
                .request("ledger_receipt", json!({ "hash": self.hash }))
                .await?;

            if !result.is_null() {
                let receipt: Receipt =
                    serde_json::from_value(result).map_err(RpcError::Json)?;
                return match receipt.status {
                    TxStatus::Confirmed => {
                        info!(
                            hash = %self.hash,
                            block = receipt.block_number,
                            "Transaction confirmed"
                        );
                        Ok(receipt)
                    }
                    TxStatus::Reverted => Err(ConfirmationError::Reverted {
                        hash: self.hash.clone(),
                    }),
                };
            }

            if Instant::now() + self.poll > deadline {
                return Err(ConfirmationError::TimedOut {
                    hash: self.hash.clone(),
                    waited_secs: self.timeout.as_secs(),
                });
            }

            debug!(hash = %self.hash, "Receipt pending; polling again");
            sleep(self.poll).await;
        }
    }
}
