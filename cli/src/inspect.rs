//! Market inspection: header, traders, per-trader orders

use anyhow::{Context, Result};
use colored::Colorize;
use phoenix_state::{AccountKey, Market, Side};
use solana_sdk::pubkey::Pubkey;

use crate::client;
use crate::config::NetworkConfig;

async fn load_market(
    config: &NetworkConfig,
    market_address: &str,
    program: Option<String>,
) -> Result<(Pubkey, Market)> {
    let address = client::parse_pubkey(market_address, "market")?;
    let program = program.map(|p| client::parse_pubkey(&p, "program")).transpose()?;
    let rpc_client = client::create_rpc_client(config);
    let account = client::fetch_market_account(&rpc_client, &address, program.as_ref()).await?;
    let market = Market::from_bytes(&account.data)
        .with_context(|| format!("Failed to decode market: {}", address))?;
    Ok((address, market))
}

pub async fn show_market_info(
    config: &NetworkConfig,
    market_address: String,
    program: Option<String>,
) -> Result<()> {
    let (address, market) = load_market(config, &market_address, program).await?;
    let header = &market.header;
    let meta = &market.metadata;

    println!("{}", "=== Market Info ===".bright_green().bold());
    println!("{} {}", "Market:".bright_cyan(), address);
    let status = match header.market_status() {
        Some(status) => format!("{:?}", status),
        None => format!("Unknown ({})", header.status),
    };
    println!("{} {}", "Status:".bright_cyan(), status);
    println!("{} {}", "Sequence:".bright_cyan(), market.sequence_number());
    println!("{} {}", "Authority:".bright_cyan(), header.authority);
    println!("{} {}", "Fee recipient:".bright_cyan(), header.fee_recipient);

    println!("\n{}", "=== Tokens ===".bright_yellow());
    println!(
        "{} {} ({} decimals)",
        "Base mint:".bright_cyan(),
        meta.base_mint,
        meta.base_decimals
    );
    println!(
        "{} {} ({} decimals)",
        "Quote mint:".bright_cyan(),
        meta.quote_mint,
        meta.quote_decimals
    );

    println!("\n{}", "=== Scaling ===".bright_yellow());
    println!("{} {} atoms", "Base lot size:".bright_cyan(), meta.base_atoms_per_base_lot);
    println!("{} {} atoms", "Quote lot size:".bright_cyan(), meta.quote_atoms_per_quote_lot);
    println!(
        "{} {} quote atoms per base unit ({} per raw base unit)",
        "Tick size:".bright_cyan(),
        meta.tick_size_in_quote_atoms_per_base_unit,
        meta.quote_units_per_raw_base_unit_per_tick()
    );
    println!(
        "{} {}",
        "Raw base units per base unit:".bright_cyan(),
        meta.raw_base_units_per_base_unit
    );
    println!("{} {}", "Base lots per base unit:".bright_cyan(), market.base_lots_per_base_unit);
    println!(
        "{} {}",
        "Quote lots per base unit per tick:".bright_cyan(),
        market.quote_lots_per_base_unit_per_tick
    );

    println!("\n{}", "=== Fees ===".bright_yellow());
    println!("{} {} bps", "Taker fee:".bright_cyan(), market.taker_fee_bps);
    println!(
        "{} {}",
        "Collected:".bright_cyan(),
        meta.quote_lots_to_quote_units(market.collected_quote_lot_fees)
    );
    println!(
        "{} {}",
        "Unclaimed:".bright_cyan(),
        meta.quote_lots_to_quote_units(market.unclaimed_quote_lot_fees)
    );

    let params = meta.market_size_params;
    println!("\n{}", "=== Occupancy ===".bright_yellow());
    println!("{} {}/{}", "Bids:".bright_cyan(), market.bids().len(), params.bids_size);
    println!("{} {}/{}", "Asks:".bright_cyan(), market.asks().len(), params.asks_size);
    let seats = market.trader_indices();
    println!("{} {}/{}", "Seats:".bright_cyan(), seats.len(), params.num_seats);

    Ok(())
}

pub async fn list_traders(
    config: &NetworkConfig,
    market_address: String,
    program: Option<String>,
) -> Result<()> {
    let (_, market) = load_market(config, &market_address, program).await?;
    let meta = &market.metadata;

    println!("{}", "=== Traders ===".bright_green().bold());
    let seats = market.trader_indices();
    if seats.is_empty() {
        println!("{}", "  (no registered traders)".dimmed());
        return Ok(());
    }

    for (trader, index) in seats.entries() {
        let Some(state) = market.trader(&trader) else {
            continue;
        };
        println!("{} {}", format!("[{}]", index).bright_blue(), trader);
        println!(
            "    base  free {:<14} locked {}",
            meta.base_lots_to_raw_base_units_as_float(state.base_lots_free),
            meta.base_lots_to_raw_base_units_as_float(state.base_lots_locked)
        );
        println!(
            "    quote free {:<14} locked {}",
            meta.quote_lots_to_quote_units(state.quote_lots_free),
            meta.quote_lots_to_quote_units(state.quote_lots_locked)
        );
    }
    Ok(())
}

pub async fn list_orders(
    config: &NetworkConfig,
    market_address: String,
    program: Option<String>,
    trader: String,
) -> Result<()> {
    let trader: AccountKey = trader
        .parse()
        .with_context(|| format!("Invalid trader address: {}", trader))?;
    let (_, market) = load_market(config, &market_address, program).await?;
    let meta = &market.metadata;

    println!("{}", "=== Resting Orders ===".bright_green().bold());
    println!("{} {}", "Trader:".bright_cyan(), client::format_key(&trader));
    let Some(index) = market.trader_index(&trader) else {
        println!("{}", "  Trader holds no seat on this market".yellow());
        return Ok(());
    };
    println!("{} {}", "Index:".bright_cyan(), index);

    let mut count = 0;
    for (side, order_id, order) in market.orders_for_trader(&trader) {
        count += 1;
        let side_label = match side {
            Side::Bid => "BID".bright_green(),
            Side::Ask => "ASK".bright_red(),
        };
        let mut line = format!(
            "  {} {} @ {} (seq {})",
            side_label,
            meta.base_lots_to_raw_base_units_as_float(order.num_base_lots),
            meta.ticks_to_float_price(order_id.price_in_ticks),
            order_id.sequence()
        );
        if order.last_valid_slot != 0 {
            line.push_str(&format!(" until slot {}", order.last_valid_slot));
        }
        if order.last_valid_unix_timestamp_in_seconds != 0 {
            line.push_str(&format!(" until ts {}", order.last_valid_unix_timestamp_in_seconds));
        }
        println!("{}", line);
    }
    if count == 0 {
        println!("{}", "  (no resting orders)".dimmed());
    }
    Ok(())
}
