//! Phoenix CLI - read-only order book inspection
//!
//! Fetches a market account over RPC (or reads a raw dump from disk),
//! decodes it with `phoenix-state` and prints the ladder, the header or
//! the registered traders.

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

mod book;
mod client;
mod config;
mod inspect;

use config::{FileConfig, NetworkConfig, Overrides};

#[derive(Parser)]
#[command(name = "phoenix")]
#[command(about = "Phoenix market reader - decode order books and trader state", long_about = None)]
#[command(version)]
struct Cli {
    /// Network to connect to (localnet, devnet, mainnet-beta)
    #[arg(short, long, global = true)]
    network: Option<String>,

    /// RPC URL (overrides network default)
    #[arg(short, long, global = true)]
    url: Option<String>,

    /// Commitment level (processed, confirmed, finalized)
    #[arg(long, global = true)]
    commitment: Option<String>,

    /// TOML config file with network, url, commitment and depth
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Program that must own the market account
    #[arg(long, global = true)]
    program: Option<String>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the live price ladder of a market
    Book {
        /// Market address
        market: String,

        /// Price levels per side
        #[arg(short, long)]
        depth: Option<usize>,

        /// Print the ladder as JSON
        #[arg(long)]
        json: bool,

        /// Include orders past their last valid slot or timestamp
        #[arg(long)]
        no_expiry_filter: bool,
    },

    /// Show header, scaling parameters, fees and occupancy
    Info {
        /// Market address
        market: String,
    },

    /// List registered traders and their balances
    Traders {
        /// Market address
        market: String,
    },

    /// List the resting orders of one trader
    Orders {
        /// Market address
        market: String,

        /// Trader wallet address
        #[arg(short, long)]
        trader: String,
    },

    /// Decode a raw market account dump offline
    Decode {
        /// File holding the raw account bytes
        #[arg(short, long)]
        file: PathBuf,

        /// Reference slot for expiry filtering
        #[arg(long)]
        slot: Option<u64>,

        /// Reference unix timestamp for expiry filtering
        #[arg(long)]
        timestamp: Option<u64>,

        /// Price levels per side
        #[arg(short, long)]
        depth: Option<usize>,

        /// Print the ladder as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    let config = NetworkConfig::resolve(
        Overrides {
            network: cli.network.clone(),
            url: cli.url.clone(),
            commitment: cli.commitment.clone(),
        },
        file,
    )?;

    if cli.verbose {
        println!("{} {}", "Network:".bright_cyan(), config.network);
        println!("{} {}", "RPC URL:".bright_cyan(), config.rpc_url);
        println!("{} {:?}", "Commitment:".bright_cyan(), config.commitment.commitment);
    }

    // Execute command
    match cli.command {
        Commands::Book { market, depth, json, no_expiry_filter } => {
            book::show_book(&config, market, cli.program, depth, json, no_expiry_filter).await?;
        }
        Commands::Info { market } => {
            inspect::show_market_info(&config, market, cli.program).await?;
        }
        Commands::Traders { market } => {
            inspect::list_traders(&config, market, cli.program).await?;
        }
        Commands::Orders { market, trader } => {
            inspect::list_orders(&config, market, cli.program, trader).await?;
        }
        Commands::Decode { file, slot, timestamp, depth, json } => {
            book::decode_file(&config, &file, slot, timestamp, depth, json)?;
        }
    }

    Ok(())
}
