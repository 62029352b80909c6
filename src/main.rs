//! `wallet-bridge` operator CLI.
//!
//! Decodes and groups transaction batches offline, queries the configured
//! node, and submits batches, optionally signing them first with the local
//! key wallet.

use bytes::Bytes;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use wallet_bridge::config::{load_config, BridgeConfig};
use wallet_bridge::node::{AlgodClient, ConfirmationPolicy, NodeClient, NodeError, Submitter};
use wallet_bridge::observability::{init_logging, metrics};
use wallet_bridge::provider::{LocalWallet, WalletClient};
use wallet_bridge::transaction::batch::{batch_to_raw, parse_batch};
use wallet_bridge::transaction::{decode_encoded, group_by_sender, Address, EncodedBatch};

#[derive(Parser)]
#[command(name = "wallet-bridge")]
#[command(about = "Inspect, sign and submit Algorand transaction batches", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long, env = "WALLET_BRIDGE_CONFIG")]
    config: Option<PathBuf>,

    /// Override the node URL from the configuration
    #[arg(long)]
    node: Option<String>,

    /// Override the node API token from the configuration
    #[arg(long, env = "WALLET_BRIDGE_NODE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a base64 transaction
    Decode {
        txn: String,
        /// The transaction carries a signature envelope
        #[arg(long)]
        signed: bool,
    },
    /// Group the unsigned entries of an encoded batch by sender
    Group {
        /// JSON batch file (`[["u", "<base64>"], ...]`), `-` for stdin
        batch: PathBuf,
    },
    /// Check node health
    Health,
    /// Show account state
    Account {
        address: String,
        /// Print only the asset holdings
        #[arg(long)]
        assets: bool,
    },
    /// Submit a fully signed batch and wait for confirmation
    Submit {
        batch: PathBuf,
        /// Rounds to wait for confirmation
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        wait_rounds: Option<u64>,
    },
    /// Sign the unsigned entries with the local key wallet, then submit
    SignAndSubmit {
        batch: PathBuf,
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
        wait_rounds: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => BridgeConfig::default(),
    };
    if let Some(url) = cli.node {
        config.node.url = url;
    }
    if let Some(token) = cli.token {
        config.node.api_token = token;
    }

    init_logging(&config.observability);
    metrics::set_enabled(config.observability.metrics_enabled);

    match cli.command {
        Commands::Decode { txn, signed } => {
            print_json(&decode_encoded(&txn, signed)?)?;
        }
        Commands::Group { batch } => {
            let batch = read_batch(&batch)?;
            print_json(&group_by_sender(&batch)?)?;
        }
        Commands::Health => {
            let node = AlgodClient::new(&config.node)?;
            print_json(&node.health_check().await?)?;
        }
        Commands::Account { address, assets } => {
            let address: Address = address.parse()?;
            let node = AlgodClient::new(&config.node)?;
            let info = node.account_information(&address.to_string()).await?;
            if assets {
                let assets = info.assets.ok_or_else(|| {
                    NodeError::Decode(format!("Unable to get account assets for {}", address))
                })?;
                print_json(&assets)?;
            } else {
                print_json(&info)?;
            }
        }
        Commands::Submit { batch, wait_rounds } => {
            let batch = read_batch(&batch)?;
            if let Some(i) = batch.iter().position(|entry| !entry.is_signed()) {
                return Err(format!("batch entry {} is not signed", i).into());
            }
            let raw = batch_to_raw(&batch)?;
            submit(&config, wait_rounds, &raw).await?;
        }
        Commands::SignAndSubmit { batch, wait_rounds } => {
            let batch = read_batch(&batch)?;
            let wallet = LocalWallet::from_config(&config.local_wallet)?;
            let node = AlgodClient::new(&config.node)?;
            let client = WalletClient::new(Arc::new(wallet), Arc::new(node));
            client.connect().await?;

            let signed = client.sign_encoded_transactions(&batch).await?;
            submit(&config, wait_rounds, &signed).await?;
        }
    }

    Ok(())
}

async fn submit(
    config: &BridgeConfig,
    wait_rounds: Option<u64>,
    signed: &[Bytes],
) -> Result<(), Box<dyn std::error::Error>> {
    let mut policy = ConfirmationPolicy::from(&config.confirmation);
    if let Some(rounds) = wait_rounds {
        policy.wait_rounds = rounds;
    }

    let node = AlgodClient::new(&config.node)?;
    let submitter = Submitter::new(Arc::new(node)).with_policy(policy);
    print_json(&submitter.submit(signed).await?)
}

fn read_batch(path: &Path) -> Result<EncodedBatch, Box<dyn std::error::Error>> {
    let text = if path == Path::new("-") {
        std::io::read_to_string(std::io::stdin())?
    } else {
        std::fs::read_to_string(path)?
    };
    Ok(parse_batch(&text)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
