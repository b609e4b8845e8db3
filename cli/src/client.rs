//! Solana RPC client utilities and helpers

use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use phoenix_state::AccountKey;
use solana_account_decoder::UiAccountEncoding;
use solana_client::nonblocking::rpc_client::RpcClient;
use solana_client::rpc_config::RpcAccountInfoConfig;
use solana_sdk::pubkey::Pubkey;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

use crate::config::NetworkConfig;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("account {0} not found")]
    AccountNotFound(Pubkey),

    #[error("account {0} holds no data")]
    EmptyAccount(Pubkey),

    #[error("account {address} is owned by {owner}, expected {expected}")]
    WrongOwner {
        address: Pubkey,
        owner: Pubkey,
        expected: Pubkey,
    },
}

/// Raw market bytes plus the slot they were read at
pub struct MarketAccount {
    pub address: Pubkey,
    pub slot: u64,
    pub data: Vec<u8>,
}

/// Create an RPC client from the network configuration
pub fn create_rpc_client(config: &NetworkConfig) -> RpcClient {
    RpcClient::new_with_commitment(config.rpc_url.clone(), config.commitment)
}

pub fn parse_pubkey(value: &str, what: &str) -> Result<Pubkey> {
    Pubkey::from_str(value).with_context(|| format!("Invalid {} address: {}", what, value))
}

/// Fetch a market account and check it before decoding.
pub async fn fetch_market_account(
    client: &RpcClient,
    address: &Pubkey,
    expected_owner: Option<&Pubkey>,
) -> Result<MarketAccount> {
    let spinner = spinner(format!("Fetching {}", address));
    let response = client
        .get_account_with_config(
            address,
            RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64Zstd),
                commitment: Some(client.commitment()),
                ..RpcAccountInfoConfig::default()
            },
        )
        .await;
    spinner.finish_and_clear();

    let response = response.with_context(|| format!("Failed to get account: {}", address))?;
    let account = response.value.ok_or(FetchError::AccountNotFound(*address))?;
    check_account(address, &account.owner, account.data.len(), expected_owner)?;

    log::debug!(
        "fetched {} ({} bytes) at slot {}",
        address,
        account.data.len(),
        response.context.slot
    );
    Ok(MarketAccount {
        address: *address,
        slot: response.context.slot,
        data: account.data,
    })
}

fn check_account(
    address: &Pubkey,
    owner: &Pubkey,
    data_len: usize,
    expected_owner: Option<&Pubkey>,
) -> Result<(), FetchError> {
    if data_len == 0 {
        return Err(FetchError::EmptyAccount(*address));
    }
    if let Some(expected) = expected_owner {
        if owner != expected {
            return Err(FetchError::WrongOwner {
                address: *address,
                owner: *owner,
                expected: *expected,
            });
        }
    }
    Ok(())
}

/// Block time of `slot`, `None` if the node cannot report one.
pub async fn fetch_block_time(client: &RpcClient, slot: u64) -> Option<i64> {
    match client.get_block_time(slot).await {
        Ok(ts) => Some(ts),
        Err(e) => {
            log::warn!("no block time for slot {}: {}", slot, e);
            None
        }
    }
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

pub fn to_account_key(pubkey: &Pubkey) -> AccountKey {
    AccountKey(pubkey.to_bytes())
}

/// Pretty print an account key as shortened address
pub fn format_key(key: &AccountKey) -> String {
    let addr = key.to_string();
    if addr.len() <= 16 {
        return addr.bright_yellow().to_string();
    }
    format!("{}...{}", &addr[0..8], &addr[addr.len() - 8..]).bright_yellow().to_string()
}
