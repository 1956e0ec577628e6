//! Integration tests for the mutation pipeline.
//!
//! Each write follows the same protocol: submit, wait for the ledger's
//! confirmation, then resynchronize the whole task list. These tests
//! verify the durability boundary: a write that was not confirmed leaves
//! the local projection and the draft exactly as they were.

use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use taskledger_client::app::App;
use taskledger_client::config::Config;
use taskledger_client::contract::ConfirmationError;
use taskledger_client::error::ClientError;
use taskledger_client::provider::Provider;
use taskledger_client::tasks::Task;
use taskledger_client::wallet::Wallet;

const CONTRACT: &str = "0x00112233445566778899aabbccddeeff00112233";

// =============================================================================
// Test Helpers
// =============================================================================

/// Builds a JSON-RPC success response around `result`.
fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "jsonrpc": "2.0",
        "id": "00000000-0000-0000-0000-000000000000",
        "result": result,
    }))
}

/// A receipt with the given terminal status.
fn receipt(status: &str) -> Value {
    json!({
        "status": status,
        "blockNumber": 7,
        "confirmedAt": "2026-01-01T00:00:00Z",
    })
}

/// Creates a wallet-backed app wired to the mock server with fast
/// confirmation timing.
fn create_test_app(server_uri: &str, wallet_dir: &TempDir) -> App {
    Wallet::generate().save(wallet_dir.path()).unwrap();

    let config = Config {
        rpc_url: server_uri.to_string(),
        contract_address: Some(CONTRACT.to_string()),
        wallet_dir: wallet_dir.path().to_path_buf(),
        confirm_timeout_secs: 1,
        confirm_poll_ms: 25,
    };
    let provider = Provider::new(wallet_dir.path().to_path_buf(), server_uri);
    App::with_provider(config, Some(provider))
}

/// Mounts a `getTasks` read returning the given records.
async fn mount_get_tasks(server: &MockServer, records: Value, times: Option<u64>) {
    let mock = Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "ledger_call",
            "params": { "method": "getTasks" }
        })))
        .respond_with(rpc_result(records));

    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

/// Mounts a submit for the given contract method returning a tx hash.
async fn mount_submit(server: &MockServer, contract_method: &str, hash: &str) {
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "method": "ledger_submit",
            "params": { "method": contract_method }
        })))
        .respond_with(rpc_result(json!(hash)))
        .mount(server)
        .await;
}

/// Mounts the receipt lookup with a fixed response.
async fn mount_receipt(server: &MockServer, result: Value, times: Option<u64>) {
    let mock = Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "ledger_receipt" })))
        .respond_with(rpc_result(result));

    match times {
        Some(n) => mock.up_to_n_times(n).mount(server).await,
        None => mock.mount(server).await,
    }
}

// =============================================================================
// Successful mutations
// =============================================================================

/// Connect with one account, add "buy milk", wait for its confirmation,
/// and observe the resynchronized projection.
#[tokio::test]
async fn confirmed_add_resynchronizes_and_clears_draft() {
    let server = MockServer::start().await;

    // Empty collection at connect time, one task after the mutation.
    mount_get_tasks(&server, json!([]), Some(1)).await;
    mount_get_tasks(&server, json!([["buy milk", false]]), None).await;
    mount_submit(&server, "addTask", "0xaaa111").await;
    mount_receipt(&server, receipt("confirmed"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();
    assert!(app.tasks().is_empty());

    app.set_draft("buy milk");
    app.add_task().await.unwrap();

    assert_eq!(
        app.tasks(),
        [Task {
            text: "buy milk".to_string(),
            completed: false
        }]
    );
    assert_eq!(app.draft(), "");
}

/// A confirmation that stays pending for a few polls still completes.
#[tokio::test]
async fn confirmation_poll_survives_pending_receipts() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([]), Some(1)).await;
    mount_get_tasks(&server, json!([["buy milk", false]]), None).await;
    mount_submit(&server, "addTask", "0xaaa111").await;
    // Two pending polls before the receipt lands.
    mount_receipt(&server, Value::Null, Some(2)).await;
    mount_receipt(&server, receipt("confirmed"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.set_draft("buy milk");
    app.add_task().await.unwrap();

    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.draft(), "");
}

/// Completing a task follows the same submit → confirm → resync protocol.
#[tokio::test]
async fn confirmed_complete_reflects_remote_state() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([["buy milk", false]]), Some(1)).await;
    mount_get_tasks(&server, json!([["buy milk", true]]), None).await;
    mount_submit(&server, "completeTask", "0xbbb222").await;
    mount_receipt(&server, receipt("confirmed"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.complete_task(0).await.unwrap();

    assert_eq!(
        app.tasks(),
        [Task {
            text: "buy milk".to_string(),
            completed: true
        }]
    );
}

/// Deleting a task shrinks the projection only through resynchronization.
#[tokio::test]
async fn confirmed_delete_reflects_remote_state() {
    let server = MockServer::start().await;

    mount_get_tasks(
        &server,
        json!([["buy milk", false], ["water plants", false]]),
        Some(1),
    )
    .await;
    mount_get_tasks(&server, json!([["water plants", false]]), None).await;
    mount_submit(&server, "deleteTask", "0xccc333").await;
    mount_receipt(&server, receipt("confirmed"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();
    assert_eq!(app.tasks().len(), 2);

    app.delete_task(0).await.unwrap();

    assert_eq!(app.tasks().len(), 1);
    assert_eq!(app.tasks()[0].text, "water plants");
}

// =============================================================================
// Failed mutations
// =============================================================================

/// A rejected submission leaves the projection and the draft untouched.
#[tokio::test]
async fn rejected_submission_changes_nothing() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([["water plants", false]]), None).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "ledger_submit" })))
        .respond_with(ResponseTemplate::new(500).set_body_string("mempool full"))
        .mount(&server)
        .await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();
    let before: Vec<Task> = app.tasks().to_vec();

    app.set_draft("buy milk");
    let err = app.add_task().await.unwrap_err();

    assert!(matches!(err, ClientError::Submission(_)));
    assert_eq!(app.tasks(), before.as_slice());
    assert_eq!(app.draft(), "buy milk");
}

/// completeTask(0) submits but its wait rejects; the
/// local list is unchanged from the prior synchronized state.
#[tokio::test]
async fn reverted_confirmation_changes_nothing() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([["buy milk", false]]), None).await;
    mount_submit(&server, "completeTask", "0xbbb222").await;
    mount_receipt(&server, receipt("reverted"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();
    let before: Vec<Task> = app.tasks().to_vec();

    let err = app.complete_task(0).await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Confirmation(ConfirmationError::Reverted { .. })
    ));
    assert_eq!(app.tasks(), before.as_slice());
}

/// A receipt that never arrives is a terminal confirmation failure, not an
/// indefinite wait.
#[tokio::test]
async fn missing_receipt_times_out() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([]), None).await;
    mount_submit(&server, "addTask", "0xaaa111").await;
    mount_receipt(&server, Value::Null, None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.set_draft("buy milk");
    let err = app.add_task().await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Confirmation(ConfirmationError::TimedOut { .. })
    ));
    assert_eq!(app.draft(), "buy milk");
    assert!(app.tasks().is_empty());
}

/// A failing receipt lookup is a confirmation failure; the write is
/// treated as never applied.
#[tokio::test]
async fn failed_receipt_lookup_is_a_confirmation_failure() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([]), None).await;
    mount_submit(&server, "addTask", "0xaaa111").await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "ledger_receipt" })))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.set_draft("buy milk");
    let err = app.add_task().await.unwrap_err();

    assert!(matches!(
        err,
        ClientError::Confirmation(ConfirmationError::Receipt(_))
    ));
    assert!(app.tasks().is_empty());
}

/// The draft survives a confirmed add whose resynchronization fails: the
/// draft is cleared only when the whole pipeline succeeds.
#[tokio::test]
async fn draft_kept_when_resync_after_confirmation_fails() {
    let server = MockServer::start().await;

    // The connect-time read succeeds; the post-mutation read fails.
    mount_get_tasks(&server, json!([]), Some(1)).await;
    mount_submit(&server, "addTask", "0xaaa111").await;
    mount_receipt(&server, receipt("confirmed"), None).await;
    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({ "method": "ledger_call" })))
        .respond_with(ResponseTemplate::new(500).set_body_string("ledger unavailable"))
        .mount(&server)
        .await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.set_draft("buy milk");
    let err = app.add_task().await.unwrap_err();

    assert!(matches!(err, ClientError::Fetch(_)));
    assert_eq!(app.draft(), "buy milk");
}

/// Consecutive confirmed mutations always converge on the remote
/// collection's content.
#[tokio::test]
async fn mutation_sequence_matches_remote_collection() {
    let server = MockServer::start().await;

    mount_get_tasks(&server, json!([]), Some(1)).await;
    mount_get_tasks(&server, json!([["buy milk", false]]), Some(1)).await;
    mount_get_tasks(&server, json!([["buy milk", true]]), Some(1)).await;
    mount_get_tasks(&server, json!([]), None).await;
    mount_submit(&server, "addTask", "0x111").await;
    mount_submit(&server, "completeTask", "0x222").await;
    mount_submit(&server, "deleteTask", "0x333").await;
    mount_receipt(&server, receipt("confirmed"), None).await;

    let wallet_dir = TempDir::new().unwrap();
    let mut app = create_test_app(&server.uri(), &wallet_dir);
    app.connect().await.unwrap();

    app.set_draft("buy milk");
    app.add_task().await.unwrap();
    assert_eq!(app.tasks().len(), 1);
    assert!(!app.tasks()[0].completed);

    app.complete_task(0).await.unwrap();
    assert!(app.tasks()[0].completed);

    app.delete_task(0).await.unwrap();
    assert!(app.tasks().is_empty());
}
