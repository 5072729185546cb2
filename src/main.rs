//! Ledger console.
//!
//! Drives a ledger node's multi-step workflows from the command line, or
//! serves them as a local JSON console.
//!
//! # Architecture Overview
//!
//! ```text
//!   CLI command / console request
//!        │
//!        ├──▶ TransactionWorkflow  (submit → mine → propagate, local node)
//!        ├──▶ NodeDirectory        (peer list, "no selection" first)
//!        └──▶ PeerHistoryWorkflow  (resolve → fetch, explicit peer)
//!                   │
//!                   ▼
//!             LedgerClient (reqwest) ──▶ local node / peer node
//!
//!   fetched chain ──▶ ChainView (pure) ──▶ terminal / JSON
//! ```

use clap::{Parser, Subcommand};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tokio::net::TcpListener;

use ledger_console::config::{load_config, ConsoleConfig};
use ledger_console::console::{self, ConsoleState};
use ledger_console::directory::NodeDirectory;
use ledger_console::ledger::{Endpoint, LedgerApi, LedgerClient, NodeAddress, Transaction};
use ledger_console::lifecycle::{signals, Shutdown};
use ledger_console::observability;
use ledger_console::view;
use ledger_console::workflow::{PeerHistoryWorkflow, TransactionWorkflow};

#[derive(Parser)]
#[command(name = "ledger-console")]
#[command(about = "Drive transactions and inspect peer chains on a ledger node", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Local node base URL, overriding node.base_url
    #[arg(short, long)]
    node_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a transaction, mine a block, then propagate the transaction
    Send {
        #[arg(long)]
        sender: String,
        #[arg(long)]
        recipient: String,
        #[arg(long)]
        amount: String,
        /// Print the local chain once the workflow completes
        #[arg(long)]
        show_chain: bool,
    },
    /// List peers known to the local node
    Nodes,
    /// Print the local node's chain
    Chain,
    /// Resolve conflicts on a peer, then print its chain
    History {
        /// Peer address (host:port)
        #[arg(long)]
        node: Option<String>,
    },
    /// Serve the JSON console until interrupted
    Serve {
        /// Bind address, overriding console.bind_address
        #[arg(long)]
        bind: Option<String>,
    },
}

type CliResult = Result<ExitCode, Box<dyn Error>>;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => match load_config(path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Error: {}", e);
                return ExitCode::FAILURE;
            }
        },
        None => ConsoleConfig::default(),
    };
    if let Some(url) = cli.node_url {
        config.node.base_url = url;
    }

    observability::logging::init_logging(&config.observability);

    match run(cli.command, config).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands, config: ConsoleConfig) -> CliResult {
    let local = Endpoint::parse(&config.node.base_url)?;
    let ledger: Arc<dyn LedgerApi> = Arc::new(LedgerClient::new());

    tracing::debug!(node = %local, "Using local node");

    match command {
        Commands::Send {
            sender,
            recipient,
            amount,
            show_chain,
        } => {
            let transaction = Transaction::new(sender, recipient, amount);
            send(ledger, local, transaction, &config, show_chain).await
        }
        Commands::Nodes => nodes(ledger, local).await,
        Commands::Chain => chain(ledger.as_ref(), &local).await,
        Commands::History { node } => history(ledger, node.map(NodeAddress::new)).await,
        Commands::Serve { bind } => serve(ledger, local, config, bind).await,
    }
}

async fn send(
    ledger: Arc<dyn LedgerApi>,
    local: Endpoint,
    transaction: Transaction,
    config: &ConsoleConfig,
    show_chain: bool,
) -> CliResult {
    let workflow = TransactionWorkflow::new(ledger.clone(), local.clone())
        .with_policy(config.workflow.transaction_policy);
    let report = workflow.run(transaction).await;

    for (stage, receipt) in &report.receipts {
        println!("{}: {}", stage, receipt.message.as_deref().unwrap_or("ok"));
    }

    if let Some(e) = &report.error {
        eprintln!(
            "Transaction failed at the {} stage ({} failure): {}",
            e.stage,
            e.kind(),
            e.source
        );
        return Ok(ExitCode::FAILURE);
    }
    println!("Transaction {} completed", report.transaction);

    if show_chain {
        return chain(ledger.as_ref(), &local).await;
    }
    Ok(ExitCode::SUCCESS)
}

async fn nodes(ledger: Arc<dyn LedgerApi>, local: Endpoint) -> CliResult {
    let directory = NodeDirectory::new(ledger, local);
    directory.refresh().await?;

    for option in directory.options() {
        if option.is_sentinel() {
            println!("  (empty)  {}", option.label);
        } else {
            println!("  {}", option.value);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn chain(ledger: &dyn LedgerApi, local: &Endpoint) -> CliResult {
    let response = ledger.fetch_chain(local).await?;
    print_blocks(&view::render_chain(&response.chain));
    Ok(ExitCode::SUCCESS)
}

async fn history(ledger: Arc<dyn LedgerApi>, selection: Option<NodeAddress>) -> CliResult {
    let report = PeerHistoryWorkflow::new(ledger).run(selection).await;

    if let Some(resolution) = &report.resolution {
        if resolution.resolved {
            println!("Conflicts resolved; the peer's chain was updated.");
        } else {
            println!("No conflicts detected.");
        }
    }

    if let Some(e) = &report.error {
        eprintln!("Peer history failed at the {} stage ({} failure): {}", e.stage(), e.kind(), e);
        return Ok(ExitCode::FAILURE);
    }

    if let (Some(node), Some(chain)) = (&report.node, &report.chain) {
        let history = view::render_history(node, chain);
        println!("{}:", history.heading);
        print_blocks(&history.blocks);
    }
    Ok(ExitCode::SUCCESS)
}

async fn serve(
    ledger: Arc<dyn LedgerApi>,
    local: Endpoint,
    config: ConsoleConfig,
    bind: Option<String>,
) -> CliResult {
    let bind_address = bind.unwrap_or_else(|| config.console.bind_address.clone());

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => observability::metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    tracing::info!(
        bind_address = %bind_address,
        node = %local,
        policy = ?config.workflow.transaction_policy,
        "Configuration loaded"
    );

    let listener = TcpListener::bind(&bind_address).await?;
    let state = ConsoleState::new(ledger, local, config.workflow.transaction_policy);

    let shutdown = Shutdown::new();
    let signal = shutdown.signal();
    tokio::spawn(async move { signals::shutdown_on_ctrl_c(&shutdown).await });

    console::serve(listener, state, signal).await?;

    tracing::info!("Shutdown complete");
    Ok(ExitCode::SUCCESS)
}

fn print_blocks(blocks: &[view::BlockRecord]) {
    if blocks.is_empty() {
        println!("(empty chain)");
    }
    for block in blocks {
        println!("{}\n", block);
    }
}
