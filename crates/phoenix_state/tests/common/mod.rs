//! Byte-level builder for market account snapshots

#![allow(dead_code)]

use phoenix_state::arena::{region_size, CONTAINER_HEADER_SIZE, SLOT_OVERHEAD};
use phoenix_state::market::MARKET_PADDING_SIZE;
use phoenix_state::order::BID_SEQUENCE_BIT;
use phoenix_state::{Side, MARKET_HEADER_SIZE};

pub const BASE_MINT: [u8; 32] = [1u8; 32];
pub const QUOTE_MINT: [u8; 32] = [2u8; 32];

pub fn trader_key(n: u8) -> [u8; 32] {
    let mut key = [0u8; 32];
    key[0] = 0xAA;
    key[31] = n;
    key
}

pub const fn bid_seq(n: u64) -> u64 {
    BID_SEQUENCE_BIT | n
}

#[derive(Debug, Clone)]
pub struct Slot {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    /// Register 0 (free list link)
    pub next: i32,
}

/// One arena region. Every listed slot is allocated; `bump_index` is
/// `slots.len() + 1` unless overridden.
#[derive(Debug, Clone, Default)]
pub struct RegionLayout {
    pub slots: Vec<Slot>,
    pub free_list_head: i32,
    pub bump_index: Option<i32>,
}

impl RegionLayout {
    /// Release a 1-based slot onto the head of the free list.
    pub fn release(&mut self, slot: i32) {
        self.slots[(slot - 1) as usize].next = self.free_list_head;
        self.free_list_head = slot;
    }

    pub fn encode(&self, key_len: usize, value_len: usize, capacity: u64) -> Vec<u8> {
        assert!(self.slots.len() as u64 <= capacity, "region over capacity");
        let bump_index = self.bump_index.unwrap_or(self.slots.len() as i32 + 1);
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&capacity.to_le_bytes());
        data.extend_from_slice(&bump_index.to_le_bytes());
        data.extend_from_slice(&self.free_list_head.to_le_bytes());
        assert_eq!(data.len(), CONTAINER_HEADER_SIZE);
        for i in 0..capacity as usize {
            match self.slots.get(i) {
                Some(slot) => {
                    assert_eq!(slot.key.len(), key_len);
                    assert_eq!(slot.value.len(), value_len);
                    data.extend_from_slice(&slot.next.to_le_bytes());
                    data.extend_from_slice(&[0u8; SLOT_OVERHEAD - 4]);
                    data.extend_from_slice(&slot.key);
                    data.extend_from_slice(&slot.value);
                }
                None => {
                    data.extend(std::iter::repeat(0u8).take(SLOT_OVERHEAD + key_len + value_len))
                }
            }
        }
        assert_eq!(Some(data.len()), region_size(key_len, value_len, capacity));
        data
    }
}

fn words(values: &[u64]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_le_bytes()).collect()
}

#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    pub status: u64,
    pub bids_size: u64,
    pub asks_size: u64,
    pub num_seats: u64,
    pub base_decimals: u32,
    pub base_lot_size: u64,
    pub quote_decimals: u32,
    pub quote_lot_size: u64,
    pub tick_size: u64,
    pub raw_base_units_per_base_unit: u32,
    pub market_sequence_number: u64,
    pub taker_fee_bps: u64,
    pub bids: RegionLayout,
    pub asks: RegionLayout,
    pub traders: RegionLayout,
}

impl SnapshotBuilder {
    /// SOL/USDC-like scaling: 9 base decimals, 1e6 atom lots (1000 lots per
    /// SOL), 6 quote decimals, 1 atom quote lots, 1000 atom ticks (0.001).
    pub fn new(bids_size: u64, asks_size: u64, num_seats: u64) -> Self {
        Self {
            status: 1,
            bids_size,
            asks_size,
            num_seats,
            base_decimals: 9,
            base_lot_size: 1_000_000,
            quote_decimals: 6,
            quote_lot_size: 1,
            tick_size: 1_000,
            raw_base_units_per_base_unit: 1,
            market_sequence_number: 42,
            taker_fee_bps: 5,
            bids: RegionLayout::default(),
            asks: RegionLayout::default(),
            traders: RegionLayout::default(),
        }
    }

    pub fn order(
        mut self,
        side: Side,
        price_in_ticks: u64,
        order_sequence_number: u64,
        trader_index: u64,
        num_base_lots: u64,
        last_valid_slot: u64,
        last_valid_unix_timestamp: u64,
    ) -> Self {
        let slot = Slot {
            key: words(&[price_in_ticks, order_sequence_number]),
            value: words(&[
                trader_index,
                num_base_lots,
                last_valid_slot,
                last_valid_unix_timestamp,
            ]),
            next: 0,
        };
        match side {
            Side::Bid => self.bids.slots.push(slot),
            Side::Ask => self.asks.slots.push(slot),
        }
        self
    }

    pub fn bid(self, price_in_ticks: u64, seq: u64, trader_index: u64, lots: u64) -> Self {
        self.order(Side::Bid, price_in_ticks, bid_seq(seq), trader_index, lots, 0, 0)
    }

    pub fn ask(self, price_in_ticks: u64, seq: u64, trader_index: u64, lots: u64) -> Self {
        self.order(Side::Ask, price_in_ticks, seq, trader_index, lots, 0, 0)
    }

    /// Register a trader with `[quote locked, quote free, base locked, base free]`.
    pub fn trader(mut self, key: [u8; 32], balances: [u64; 4]) -> Self {
        let mut value = words(&balances);
        value.extend_from_slice(&[0u8; 64]);
        self.traders.slots.push(Slot {
            key: key.to_vec(),
            value,
            next: 0,
        });
        self
    }

    pub fn header(&self) -> Vec<u8> {
        let mut h = Vec::with_capacity(MARKET_HEADER_SIZE);
        h.extend(words(&[0x5A5A, self.status]));
        h.extend(words(&[self.bids_size, self.asks_size, self.num_seats]));
        // base params
        h.extend_from_slice(&self.base_decimals.to_le_bytes());
        h.extend_from_slice(&255u32.to_le_bytes());
        h.extend_from_slice(&BASE_MINT);
        h.extend_from_slice(&[3u8; 32]);
        h.extend(words(&[self.base_lot_size]));
        // quote params
        h.extend_from_slice(&self.quote_decimals.to_le_bytes());
        h.extend_from_slice(&254u32.to_le_bytes());
        h.extend_from_slice(&QUOTE_MINT);
        h.extend_from_slice(&[4u8; 32]);
        h.extend(words(&[self.quote_lot_size, self.tick_size]));
        h.extend_from_slice(&[5u8; 32]); // authority
        h.extend_from_slice(&[6u8; 32]); // fee recipient
        h.extend(words(&[self.market_sequence_number]));
        h.extend_from_slice(&[7u8; 32]); // successor
        h.extend_from_slice(&self.raw_base_units_per_base_unit.to_le_bytes());
        h.resize(MARKET_HEADER_SIZE, 0);
        h
    }

    pub fn build(&self) -> Vec<u8> {
        let mut data = self.header();
        data.extend(std::iter::repeat(0u8).take(MARKET_PADDING_SIZE));
        data.extend(words(&[1_000, 1, 7, self.taker_fee_bps, 11, 13]));
        data.extend(self.bids.encode(16, 32, self.bids_size));
        data.extend(self.asks.encode(16, 32, self.asks_size));
        data.extend(self.traders.encode(32, 96, self.num_seats));
        data
    }
}
