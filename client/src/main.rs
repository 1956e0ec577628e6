//! TaskLedger - command-line task ledger client.
//!
//! This binary is the presentation layer over the client library: it
//! renders plain task data and invokes the documented operations, nothing
//! more.
//!
//! # Commands
//!
//! - `taskledger init`: Generate a wallet keypair
//! - `taskledger account`: Show the wallet's account address
//! - `taskledger list`: Show the remote task list
//! - `taskledger add <text>`: Add a task
//! - `taskledger complete <index>`: Mark a task completed
//! - `taskledger delete <index>`: Delete a task
//!
//! # Environment Variables
//!
//! See the [`config`](taskledger_client::config) module for available
//! configuration options.

use std::future::Future;
use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use directories::BaseDirs;
use tracing_subscriber::EnvFilter;

use taskledger_client::app::App;
use taskledger_client::config::Config;
use taskledger_client::tasks::Task;
use taskledger_client::wallet::Wallet;

/// Default wallet directory name relative to home.
const DEFAULT_WALLET_DIR: &str = ".taskledger";

/// TaskLedger - command-line task ledger client.
///
/// Manages a task list whose authoritative state lives in a remote
/// ledger-backed contract, authorized by a local wallet keypair.
#[derive(Parser, Debug)]
#[command(name = "taskledger")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    TASKLEDGER_RPC_URL               Ledger JSON-RPC endpoint (required)
    TASKLEDGER_CONTRACT_ADDRESS      Task contract address (0x + 40 hex)
    TASKLEDGER_WALLET_DIR            Wallet directory (default: ~/.taskledger)
    TASKLEDGER_PRIVATE_KEY           Base64 seed, takes precedence over the wallet dir
    TASKLEDGER_CONFIRM_TIMEOUT_SECS  Confirmation wait timeout (default: 60)
    TASKLEDGER_CONFIRM_POLL_MS       Receipt poll interval (default: 500)

EXAMPLES:
    # Generate a new wallet
    taskledger init

    # Add and list tasks
    export TASKLEDGER_RPC_URL=https://rpc.taskledger.dev
    export TASKLEDGER_CONTRACT_ADDRESS=0x...
    taskledger add 'buy milk'
    taskledger list
")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a wallet keypair.
    ///
    /// Creates a new keypair in ~/.taskledger (or TASKLEDGER_WALLET_DIR).
    Init {
        /// Force overwrite existing keys without confirmation.
        #[arg(short, long)]
        force: bool,
    },

    /// Show the wallet's account address.
    Account {
        /// Print the base64-encoded private key seed instead, for use as
        /// TASKLEDGER_PRIVATE_KEY in CI.
        #[arg(long)]
        export: bool,
    },

    /// Show the remote task list.
    List,

    /// Add a task.
    Add {
        /// The task text.
        text: String,
    },

    /// Mark a task completed.
    Complete {
        /// Position in the most recently listed task order.
        index: usize,
    },

    /// Delete a task.
    Delete {
        /// Position in the most recently listed task order.
        index: usize,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Init { force } => run_init(force),
        Command::Account { export } => run_account(export),
        Command::List => block_on(run_list()),
        Command::Add { text } => block_on(run_add(text)),
        Command::Complete { index } => block_on(run_complete(index)),
        Command::Delete { index } => block_on(run_delete(index)),
    }
}

/// Builds the async runtime and drives a remote operation on it.
fn block_on<F>(future: F) -> Result<()>
where
    F: Future<Output = Result<()>>,
{
    init_logging();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    runtime.block_on(future)
}

/// Initializes tracing with an env-filter, defaulting to `info`.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

/// Runs the init command to generate a new wallet keypair.
fn run_init(force: bool) -> Result<()> {
    let wallet_dir = wallet_directory()?;

    if Wallet::exists(&wallet_dir) && !force {
        eprintln!("A wallet already exists at: {}", wallet_dir.display());
        eprintln!();
        eprint!("Overwrite existing keys? [y/N] ");
        io::stderr().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            eprintln!("Aborted.");
            return Ok(());
        }
    }

    println!("Generating Ed25519 wallet keypair...");
    let wallet = Wallet::generate();
    wallet.save(&wallet_dir).context("Failed to save keypair")?;

    println!();
    println!("Wallet saved to: {}", wallet_dir.display());
    println!();
    println!("Account address:");
    println!();
    println!("  {}", wallet.address());

    Ok(())
}

/// Runs the account command to show the address or export the seed.
fn run_account(export: bool) -> Result<()> {
    let wallet_dir = wallet_directory()?;

    let wallet = match Wallet::load(&wallet_dir) {
        Ok(wallet) => wallet,
        Err(_) => {
            eprintln!("Error: No wallet found at {}/key.priv", wallet_dir.display());
            eprintln!("Run 'taskledger init' first.");
            std::process::exit(1);
        }
    };

    if export {
        // Print ONLY the seed to stdout, followed by exactly one newline
        println!("{}", wallet.seed_base64());
    } else {
        println!("Account address: {}", wallet.address());
        println!("Public key:      {}", wallet.public_key_base64());
    }

    Ok(())
}

/// Shows the remote task list.
async fn run_list() -> Result<()> {
    let app = connect_app().await?;
    render_tasks(app.tasks());
    Ok(())
}

/// Adds a task and shows the resynchronized list.
async fn run_add(text: String) -> Result<()> {
    let mut app = connect_app().await?;
    app.set_draft(text);
    app.add_task().await.context("Failed to add task")?;
    render_tasks(app.tasks());
    Ok(())
}

/// Completes a task and shows the resynchronized list.
async fn run_complete(index: usize) -> Result<()> {
    let mut app = connect_app().await?;
    app.complete_task(index)
        .await
        .with_context(|| format!("Failed to complete task {index}"))?;
    render_tasks(app.tasks());
    Ok(())
}

/// Deletes a task and shows the resynchronized list.
async fn run_delete(index: usize) -> Result<()> {
    let mut app = connect_app().await?;
    app.delete_task(index)
        .await
        .with_context(|| format!("Failed to delete task {index}"))?;
    render_tasks(app.tasks());
    Ok(())
}

/// Loads configuration, detects the wallet provider, and connects.
async fn connect_app() -> Result<App> {
    let config = Config::from_env().context("Failed to load configuration")?;
    let mut app = App::new(config);

    if !app.provider_available() {
        bail!("No wallet provider detected. Run 'taskledger init' to create a wallet.");
    }

    app.connect().await.context("Failed to connect wallet")?;

    if !app.is_connected() {
        bail!("The wallet granted no accounts; cannot continue.");
    }

    Ok(app)
}

/// Renders the task list as plain text.
fn render_tasks(tasks: &[Task]) {
    if tasks.is_empty() {
        println!("No tasks.");
        return;
    }

    for (index, task) in tasks.iter().enumerate() {
        let mark = if task.completed { "x" } else { " " };
        println!("  [{mark}] {index}: {}", task.text);
    }
}

/// Resolves the wallet directory from the environment or the default.
fn wallet_directory() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("TASKLEDGER_WALLET_DIR") {
        return Ok(PathBuf::from(dir));
    }

    let base_dirs = BaseDirs::new().context("Failed to determine home directory")?;
    Ok(base_dirs.home_dir().join(DEFAULT_WALLET_DIR))
}
