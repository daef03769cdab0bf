//! Crowdfunding dApp client entry point.
//!
//! Connects to the user's wallet, reads projects from the crowdfunding
//! contract on Tea Sepolia and submits create / contribute / withdraw
//! transactions. Every mutating command waits for confirmation and re-reads
//! the affected project before reporting success.

mod analyzer;
mod config;
mod contract;
mod errors;
mod network;
mod project;
mod rpc;
mod session;
mod units;
mod views;
mod wallet;

#[cfg(test)]
mod testing;

use std::process::ExitCode;
use std::sync::Arc;

use alloy_primitives::Address;
use alloy_sol_types::SolEvent;
use chrono::Utc;
use clap::{Parser, Subcommand};
use reqwest::Client;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use contract::ContractService;
use network::{abi, CONTRACT, NETWORK};
use rpc::{JsonRpcClient, RpcProvider};
use session::{App, SessionUpdate};
use views::{CreateProjectView, ProjectDetailView, ProjectForm, ProjectListView};
use wallet::{short_address, RpcWallet};

#[derive(Debug, Parser)]
#[command(name = "crowdfund", version, about = "Crowdfunding dApp on the Tea Sepolia network")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the network and contract binding
    Info,
    /// Inspect the deployed contract over the public RPC
    Analyze,
    /// List every project
    List {
        /// Account whose creator-only actions should be shown
        #[arg(long)]
        account: Option<Address>,
    },
    /// Show one project with its contributor count
    Show {
        id: u64,
        #[arg(long)]
        account: Option<Address>,
    },
    /// Create a project (connects the wallet)
    Create {
        #[arg(long)]
        title: String,
        #[arg(long)]
        description: String,
        /// Funding goal in the native currency
        #[arg(long)]
        goal: String,
        /// YYYY-MM-DD
        #[arg(long)]
        deadline: String,
        /// Value sent with the creation transaction
        #[arg(long, default_value = "0.1")]
        value: String,
    },
    /// Contribute to a project (connects the wallet)
    Contribute { id: u64, amount: String },
    /// Withdraw a project's funds (connects the wallet)
    Withdraw { id: u64 },
    /// Stay connected and follow wallet account / chain changes
    Watch,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialise structured logging (RUST_LOG controls verbosity).
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Load optional .env file (ignored if missing).
    let _ = dotenvy::dotenv();

    match run(Cli::parse()).await {
        Ok(code) => code,
        Err(e) => {
            // Only the top-level message is shown; the cause chain is logged.
            error!("{e:#}");
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = Config::from_env()?;
    let client = Client::builder().timeout(config.http_timeout()).build()?;

    match cli.command {
        Command::Info => print_info(),
        Command::Analyze => {
            println!("Connecting to {} ...", NETWORK.name);
            let report = analyzer::analyze(&read_only_service(client)).await?;
            println!("{}", report.render(&NETWORK));
        }
        Command::List { account } => {
            let service = read_only_service(client);
            let mut view = ProjectListView::new();
            let loaded = view.load(&service).await;
            println!("{}", view.render(account.as_ref(), Utc::now(), NETWORK.symbol));
            if loaded.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Show { id, account } => {
            let service = read_only_service(client);
            let mut view = ProjectDetailView::new();
            let loaded = view.load(&service, id, account.as_ref()).await;
            println!("{}", view.render(account.as_ref(), Utc::now(), NETWORK.symbol));
            if loaded.is_err() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::Create {
            title,
            description,
            goal,
            deadline,
            value,
        } => {
            let app = connected_app(client, &config).await?;
            let Some(session) = app.session() else {
                anyhow::bail!("Wallet session unavailable. Please connect wallet first.");
            };
            let mut view = CreateProjectView::new(ProjectForm {
                title,
                description,
                funding_goal: goal,
                deadline,
                value_to_send: value,
            });
            let result = view.submit(&session.service, NETWORK.symbol).await;
            for line in view.debug_log() {
                println!("{line}");
            }
            match result {
                Ok(created) => {
                    println!("Project created successfully! {}", NETWORK.tx_url(&created.tx.hash));
                }
                Err(_) => {
                    eprintln!("{}", view.error().unwrap_or("Failed to create project."));
                    return Ok(ExitCode::FAILURE);
                }
            }
        }
        Command::Contribute { id, amount } => {
            let app = connected_app(client, &config).await?;
            let Some(session) = app.session() else {
                anyhow::bail!("Wallet session unavailable. Please connect wallet first.");
            };
            let mut view = ProjectListView::new();
            if view.contribute(&session.service, id, &amount).await.is_err() {
                eprintln!("{}", view.error().unwrap_or("Failed to contribute."));
                return Ok(ExitCode::FAILURE);
            }
            println!("Contribution successful!");
            println!("{}", view.render(Some(&session.account), Utc::now(), NETWORK.symbol));
        }
        Command::Withdraw { id } => {
            let app = connected_app(client, &config).await?;
            let Some(session) = app.session() else {
                anyhow::bail!("Wallet session unavailable. Please connect wallet first.");
            };
            let mut view = ProjectListView::new();
            if view.withdraw(&session.service, id).await.is_err() {
                eprintln!("{}", view.error().unwrap_or("Failed to withdraw funds."));
                return Ok(ExitCode::FAILURE);
            }
            println!("Funds withdrawn successfully!");
            println!("{}", view.render(Some(&session.account), Utc::now(), NETWORK.symbol));
        }
        Command::Watch => watch(client, &config).await?,
    }

    Ok(ExitCode::SUCCESS)
}

fn print_info() {
    println!("Network:   {} (chain id {})", NETWORK.name, NETWORK.chain_id);
    println!("RPC:       {}", NETWORK.rpc_url);
    println!("Currency:  {}", NETWORK.symbol);
    println!("Explorer:  {}", NETWORK.explorer);
    println!("Faucet:    {}", NETWORK.faucet);
    println!("Contract:  {}", NETWORK.address_url(&CONTRACT.address));
    println!("ABI:");
    for entry in CONTRACT.abi {
        println!("  {entry}");
    }
    println!("Event topics:");
    for (name, topic) in [
        (abi::ProjectCreated::SIGNATURE, abi::ProjectCreated::SIGNATURE_HASH),
        (abi::ContributionMade::SIGNATURE, abi::ContributionMade::SIGNATURE_HASH),
        (abi::FundsWithdrawn::SIGNATURE, abi::FundsWithdrawn::SIGNATURE_HASH),
    ] {
        println!("  {name}: {topic}");
    }
}

fn read_only_service(client: Client) -> ContractService {
    let provider = RpcProvider::new(JsonRpcClient::new(client, NETWORK.rpc_url));
    ContractService::new(Arc::new(provider), None)
}

async fn connected_app(client: Client, config: &Config) -> anyhow::Result<App> {
    let wallet = RpcWallet::new(JsonRpcClient::new(client, config.wallet_url.clone()));
    let mut app = App::new(Arc::new(wallet), NETWORK, config.receipt_poll());
    let session = app.connect().await?;
    println!(
        "Connected {} on {}",
        short_address(&session.account),
        NETWORK.name
    );
    Ok(app)
}

/// Follow wallet notifications until disconnect or Ctrl-C. A chain change
/// restarts from scratch.
async fn watch(client: Client, config: &Config) -> anyhow::Result<()> {
    loop {
        let mut app = connected_app(client.clone(), config).await?;
        let mut subscription = wallet::subscribe(app.wallet(), config.wallet_poll());

        let restart = loop {
            let event = tokio::select! {
                event = subscription.next() => event,
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(event) = event else { break false };

            match app.handle(event) {
                SessionUpdate::Unchanged => {}
                SessionUpdate::AccountSwitched(account) => {
                    println!("Account changed: {}", short_address(&account));
                }
                SessionUpdate::Disconnected => {
                    println!("Wallet disconnected.");
                    break false;
                }
                SessionUpdate::Reload => {
                    warn!("Chain changed; restarting");
                    break true;
                }
            }
        };

        subscription.unsubscribe();
        if !restart {
            info!("Watch finished");
            return Ok(());
        }
    }
}
