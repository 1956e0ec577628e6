//! Application state machine.
//!
//! [`App`] owns the entire client state: the cached provider detection
//! result, the wallet session, the contract handle derived from it, the
//! local task projection, and the draft text for a new task. Presentation
//! code reads snapshots and invokes the documented operations; it never
//! mutates state directly.
//!
//! State transitions are expressed as pure functions on [`AppState`] that
//! produce a whole new snapshot, which the `App` then installs. Derived
//! values are recomputed explicitly and sequentially: the contract handle
//! is rebound immediately after a session connects, and the task list is
//! re-fetched immediately after a successful binding or mutation.
//!
//! Invariants:
//!
//! - A contract handle is only ever present while a session is connected.
//! - The task list is only ever replaced in full, never merged or patched.
//! - A failed operation leaves every piece of prior state untouched.

use tracing::{debug, info, warn};

use crate::config::Config;
use crate::contract::{ContractHandle, TASK_INTERFACE};
use crate::error::{ClientError, Result};
use crate::provider::Provider;
use crate::session::Session;
use crate::tasks::{self, Task};
use crate::types::Address;

/// Snapshot of the client state visible to the presentation layer.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    session: Option<Session>,
    handle: Option<ContractHandle>,
    tasks: Vec<Task>,
    draft: String,
    generation: u64,
}

impl AppState {
    /// The terminal logged-out snapshot: disconnected, no handle, empty
    /// task list. The generation is advanced so in-flight results bound to
    /// the previous handle are recognized as stale.
    fn logged_out(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Transition into the connected state under a new generation.
    ///
    /// The previous handle (if any) is dropped: it is a derived value and
    /// must be rebound for the new session. Tasks and draft carry over.
    fn connected(&self, session: Session, generation: u64) -> Self {
        Self {
            session: Some(session),
            handle: None,
            tasks: self.tasks.clone(),
            draft: self.draft.clone(),
            generation,
        }
    }

    /// Transition installing a freshly bound contract handle.
    fn bound(&self, handle: ContractHandle) -> Self {
        Self {
            generation: handle.generation(),
            handle: Some(handle),
            session: self.session.clone(),
            tasks: self.tasks.clone(),
            draft: self.draft.clone(),
        }
    }

    /// Transition replacing the task list wholesale.
    fn synchronized(&self, tasks: Vec<Task>) -> Self {
        Self {
            tasks,
            session: self.session.clone(),
            handle: self.handle.clone(),
            draft: self.draft.clone(),
            generation: self.generation,
        }
    }

    /// Transition replacing the draft text.
    fn with_draft(&self, draft: String) -> Self {
        Self {
            draft,
            session: self.session.clone(),
            handle: self.handle.clone(),
            tasks: self.tasks.clone(),
            generation: self.generation,
        }
    }

    /// Returns true while a session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the connected session's accounts, empty when disconnected.
    #[must_use]
    pub fn accounts(&self) -> &[Address] {
        self.session.as_ref().map_or(&[], Session::accounts)
    }

    /// Returns the last-synchronized task projection.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Returns the in-progress new-task text.
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }
}

/// The TaskLedger client application.
pub struct App {
    config: Config,
    provider: Option<Provider>,
    state: AppState,
}

impl App {
    /// Creates an application, running wallet provider detection once.
    ///
    /// The detection result is cached for the lifetime of the `App`; when
    /// no provider is found, session and contract operations report
    /// [`ClientError::CapabilityUnavailable`] or no-op rather than panic.
    #[must_use]
    pub fn new(config: Config) -> Self {
        let provider = Provider::detect(&config);
        Self::with_provider(config, provider)
    }

    /// Creates an application over an explicit provider detection result.
    #[must_use]
    pub fn with_provider(config: Config, provider: Option<Provider>) -> Self {
        Self {
            config,
            provider,
            state: AppState::default(),
        }
    }

    /// Returns whether a wallet provider was detected.
    #[must_use]
    pub fn provider_available(&self) -> bool {
        self.provider.is_some()
    }

    /// Returns the current state snapshot.
    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Returns true while a session is connected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.state.is_connected()
    }

    /// Returns the last-synchronized task projection.
    #[must_use]
    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    /// Returns the in-progress new-task text.
    #[must_use]
    pub fn draft(&self) -> &str {
        self.state.draft()
    }

    /// Replaces the draft text for the next `add_task`.
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.state = self.state.with_draft(text.into());
    }

    /// Requests account access and establishes a session.
    ///
    /// On success the contract handle is rebound and the task list
    /// synchronized, in that order. A wallet that grants zero accounts
    /// leaves the client disconnected without an error.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` if no provider was detected, authorization
    /// fails, binding fails (the session stays connected, with no handle),
    /// or the initial synchronization fails (the session and handle stay).
    pub async fn connect(&mut self) -> Result<()> {
        let provider = self
            .provider
            .clone()
            .ok_or(ClientError::CapabilityUnavailable)?;

        let Some(session) = Session::establish(&provider)? else {
            return Ok(());
        };

        let generation = self.state.generation + 1;
        let bound = ContractHandle::bind(
            &provider,
            &session,
            &self.config,
            &TASK_INTERFACE,
            generation,
        );

        self.state = self.state.connected(session, generation);

        match bound {
            Ok(handle) => {
                self.state = self.state.bound(handle);
                self.refresh_tasks().await
            }
            Err(e) => {
                warn!(error = %e, "Contract binding failed; no handle produced");
                Err(e.into())
            }
        }
    }

    /// Tears down the session: disconnects, drops the contract handle, and
    /// empties the local task list.
    ///
    /// Idempotent and purely local: wallet permissions are not revoked and
    /// nothing is sent to the ledger.
    pub fn logout(&mut self) {
        self.state = AppState::logged_out(self.state.generation + 1);
        info!("Logged out; local session state cleared");
    }

    /// Fetches the remote task collection and replaces the local list.
    ///
    /// Without a contract handle this is a no-op, not an error. A result
    /// that arrives after the handle it was fetched under has been
    /// invalidated or rebound is discarded as stale.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Fetch`] on a remote read failure; the
    /// previous task list is kept.
    pub async fn refresh_tasks(&mut self) -> Result<()> {
        let Some(handle) = self.state.handle.clone() else {
            debug!("No contract handle; skipping task fetch");
            return Ok(());
        };

        match tasks::fetch_tasks(&handle).await {
            Ok(fetched) => {
                if self.state.generation == handle.generation() {
                    self.state = self.state.synchronized(fetched);
                } else {
                    debug!(
                        stale = handle.generation(),
                        current = self.state.generation,
                        "Discarding stale fetch result"
                    );
                }
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Task fetch failed; keeping previous list");
                Err(ClientError::Fetch(e))
            }
        }
    }

    /// Adds a task with the current draft text.
    ///
    /// Submits the write, waits for its confirmation, then resynchronizes.
    /// The draft is cleared only after all three steps succeed. The local
    /// list is never updated optimistically.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on submission, confirmation, or resync
    /// failure; the task list and draft are left untouched.
    pub async fn add_task(&mut self) -> Result<()> {
        let Some(handle) = self.state.handle.clone() else {
            debug!("No contract handle; ignoring add");
            return Ok(());
        };

        let text = self.state.draft.clone();
        let pending = handle
            .add_task(&text)
            .await
            .map_err(ClientError::Submission)?;
        let receipt = pending.wait().await?;

        debug!(block = receipt.block_number, "addTask durable; resynchronizing");
        self.refresh_tasks().await?;
        self.state = self.state.with_draft(String::new());
        Ok(())
    }

    /// Marks the task at `index` completed.
    ///
    /// `index` refers to a position in the last-synchronized task order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on submission, confirmation, or resync
    /// failure; the task list is left untouched.
    pub async fn complete_task(&mut self, index: usize) -> Result<()> {
        let Some(handle) = self.state.handle.clone() else {
            debug!("No contract handle; ignoring complete");
            return Ok(());
        };

        let pending = handle
            .complete_task(index)
            .await
            .map_err(ClientError::Submission)?;
        pending.wait().await?;

        self.refresh_tasks().await
    }

    /// Deletes the task at `index`.
    ///
    /// `index` refers to a position in the last-synchronized task order.
    ///
    /// # Errors
    ///
    /// Returns `ClientError` on submission, confirmation, or resync
    /// failure; the task list is left untouched.
    pub async fn delete_task(&mut self, index: usize) -> Result<()> {
        let Some(handle) = self.state.handle.clone() else {
            debug!("No contract handle; ignoring delete");
            return Ok(());
        };

        let pending = handle
            .delete_task(index)
            .await
            .map_err(ClientError::Submission)?;
        pending.wait().await?;

        self.refresh_tasks().await
    }
}
