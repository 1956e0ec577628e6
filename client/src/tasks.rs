//! Task records and remote synchronization.
//!
//! The authoritative task collection lives in the contract; the local list
//! is a read-only projection rebuilt wholesale on every fetch. Partial
//! patching is never performed, so the local list can be stale but never
//! partially diverged from remote truth.

use serde::{Deserialize, Serialize};

use crate::contract::ContractHandle;
use crate::provider::RpcError;

/// A task as projected into the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// The task description.
    pub text: String,

    /// Whether the task has been completed.
    pub completed: bool,
}

/// Fetches the remote task collection and maps it into local records.
///
/// Remote records arrive as ordered `[text, completed]` pairs; order is
/// preserved, since mutation operations address tasks by position.
///
/// # Errors
///
/// Returns `RpcError` if the read call fails or the response does not
/// decode as task records. The caller keeps its previous list in that case.
pub async fn fetch_tasks(handle: &ContractHandle) -> Result<Vec<Task>, RpcError> {
    let raw = handle.get_tasks().await?;
    let records: Vec<(String, bool)> = serde_json::from_value(raw)?;

    Ok(records
        .into_iter()
        .map(|(text, completed)| Task { text, completed })
        .collect())
}
