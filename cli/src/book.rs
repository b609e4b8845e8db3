//! Price ladder commands: live (`book`) and offline (`decode`)

use anyhow::{Context, Result};
use colored::Colorize;
use phoenix_state::{ExpiryReference, Market, UiLadder};
use std::fs;
use std::path::Path;

use crate::client;
use crate::config::NetworkConfig;

pub async fn show_book(
    config: &NetworkConfig,
    market_address: String,
    program: Option<String>,
    depth: Option<usize>,
    json: bool,
    no_expiry_filter: bool,
) -> Result<()> {
    let address = client::parse_pubkey(&market_address, "market")?;
    let program = program.map(|p| client::parse_pubkey(&p, "program")).transpose()?;
    let rpc_client = client::create_rpc_client(config);

    let account = client::fetch_market_account(&rpc_client, &address, program.as_ref()).await?;
    let market = Market::from_bytes(&account.data)
        .with_context(|| format!("Failed to decode market: {}", address))?;

    let (reference, block_time) = if no_expiry_filter {
        (ExpiryReference::NONE, None)
    } else {
        let block_time = client::fetch_block_time(&rpc_client, account.slot).await;
        let reference = ExpiryReference {
            slot: Some(account.slot),
            unix_timestamp: block_time.and_then(|t| u64::try_from(t).ok()),
        };
        (reference, block_time)
    };

    let depth = depth.unwrap_or(config.depth);
    let ladder = market.ui_ladder(&reference, depth);

    if json {
        println!("{}", serde_json::to_string_pretty(&ladder)?);
        return Ok(());
    }

    println!("{}", "=== Order Book ===".bright_green().bold());
    println!("{} {}", "Network:".bright_cyan(), config.network);
    println!("{} {}", "Market:".bright_cyan(), account.address);
    println!("{} {}", "Slot:".bright_cyan(), account.slot);
    if let Some(time) = block_time.and_then(|t| chrono::DateTime::from_timestamp(t, 0)) {
        println!("{} {}", "Block time:".bright_cyan(), time.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();
    print_ladder(&ladder);
    Ok(())
}

/// Read a raw account dump from disk and decode it.
pub fn load_snapshot(path: &Path) -> Result<Market> {
    let data = fs::read(path)
        .with_context(|| format!("Failed to read snapshot file: {}", path.display()))?;
    Market::from_bytes(&data)
        .with_context(|| format!("Failed to decode snapshot: {}", path.display()))
}

pub fn decode_file(
    config: &NetworkConfig,
    path: &Path,
    slot: Option<u64>,
    timestamp: Option<u64>,
    depth: Option<usize>,
    json: bool,
) -> Result<()> {
    let market = load_snapshot(path)?;
    let reference = ExpiryReference {
        slot,
        unix_timestamp: timestamp,
    };
    let ladder = market.ui_ladder(&reference, depth.unwrap_or(config.depth));

    if json {
        println!("{}", serde_json::to_string_pretty(&ladder)?);
        return Ok(());
    }

    println!("{}", "=== Snapshot ===".bright_green().bold());
    println!("{} {}", "File:".bright_cyan(), path.display());
    println!("{} {}", "Sequence:".bright_cyan(), market.sequence_number());
    println!(
        "{} {} bids, {} asks, {} traders",
        "Resting:".bright_cyan(),
        market.bids().len(),
        market.asks().len(),
        market.traders().len()
    );
    println!();
    print_ladder(&ladder);
    Ok(())
}

/// Asks worst to best above the spread, bids best to worst below it
fn print_ladder(ladder: &UiLadder) {
    if ladder.bids.is_empty() && ladder.asks.is_empty() {
        println!("{}", "  (empty book)".dimmed());
        return;
    }
    println!("{:>16} {:>16}", "PRICE".bold(), "SIZE".bold());
    for level in ladder.asks.iter().rev() {
        println!(
            "{:>16} {:>16}",
            level.price.to_string().bright_red(),
            level.quantity.to_string()
        );
    }
    println!("{}", "-".repeat(33).dimmed());
    for level in &ladder.bids {
        println!(
            "{:>16} {:>16}",
            level.price.to_string().bright_green(),
            level.quantity.to_string()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use phoenix_state::{DecodeError, ErrorKind};
    use std::io::Write;

    #[test]
    fn test_empty_snapshot_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        let decode = err.downcast_ref::<DecodeError>().unwrap();
        assert_eq!(decode.kind(), ErrorKind::EmptyOrMissingSnapshot);
    }

    #[test]
    fn test_truncated_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 300]).unwrap();
        let err = load_snapshot(file.path()).unwrap_err();
        let decode = err.downcast_ref::<DecodeError>().unwrap();
        assert_eq!(decode.kind(), ErrorKind::StructuralCorruption);
    }

    #[test]
    fn test_missing_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = load_snapshot(&dir.path().join("missing.bin")).unwrap_err();
        assert!(err.to_string().contains("Failed to read snapshot file"));
    }
}
