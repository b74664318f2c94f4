use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use colored::*;
use consumption_client::api::EnergyApi;
use consumption_client::cache::BlockSizeCache;
use consumption_client::net::blockchain_info::{BlockchainInfoClient, DEFAULT_BASE_URL};
use consumption_client::store::file::JsonFileStore;
use figlet_rs::FIGfont;
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_banner() {
    let Ok(font) = FIGfont::standard() else {
        return;
    };
    let Some(figure) = font.convert("Block Energy") else {
        return;
    };

    let rule = "═══════════════════════════════════════════════════════════════════════════════";
    eprintln!("{}", rule.bright_magenta());
    eprintln!("{}", figure.to_string().bright_cyan().bold());
    eprintln!("{}", rule.bright_magenta());
    eprintln!("{}", "Energy estimates for blockchain activity".bright_yellow());
    eprintln!("{}", rule.bright_magenta());
    eprintln!();
}

#[derive(Parser, Debug)]
#[command(name = "block-energy")]
#[command(about = "Energy estimates for blockchain activity", long_about = None)]
struct Args {
    /// Base URL of the blockchain.info compatible data API
    #[arg(long, env = "BLOCKCHAIN_API_URL", default_value = DEFAULT_BASE_URL)]
    api_url: String,

    /// JSON document caching block sizes between runs
    #[arg(long, env = "BLOCK_CACHE_PATH", default_value = "./data/blocks.json")]
    cache: PathBuf,

    /// Skip the startup banner
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consumption of today and the given number of previous days
    Daily {
        #[arg(allow_negative_numbers = true)]
        number_of_days: i64,
    },
    /// Block detail with per-transaction consumption
    Block { hash: String },
    /// Address detail with aggregate and per-transaction consumption
    Wallet {
        address: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if !args.quiet {
        print_banner();
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive("hyper=warn".parse()?)
        .add_directive("reqwest=warn".parse()?);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let client = Arc::new(BlockchainInfoClient::new(&args.api_url)?);
    let store = JsonFileStore::new(&args.cache)?;
    info!(path = %store.path().display(), "opening block size cache");
    let cache = Arc::new(BlockSizeCache::open(store)?);
    let api = EnergyApi::new(client, cache);

    match args.command {
        Command::Daily { number_of_days } => {
            let records = api.daily_consumption(number_of_days).await?;
            print_json(&records)?;
        }
        Command::Block { hash } => {
            let report = api.block(&hash).await?;
            print_json(&report)?;
        }
        Command::Wallet {
            address,
            limit,
            offset,
        } => {
            let report = api.wallet(&address, limit, offset).await?;
            print_json(&report)?;
        }
    }

    Ok(())
}
