//! Market account snapshot: parser and decoded order book
//!
//! Account layout:
//!
//! ```text
//! [MarketHeader 576][padding 256][6 x u64 market scalars]
//! [bids region][asks region][traders region]
//! ```
//!
//! Region sizes follow from the capacities in the header (see
//! [`crate::arena::region_size`]). Bytes past the traders region are ignored.

use std::collections::HashMap;

use crate::arena::{region_size, NodeTable};
use crate::codec::{ByteReader, FixedLayout};
use crate::error::{DecodeError, DecodeResult};
use crate::header::{MarketHeader, MARKET_HEADER_SIZE};
use crate::order::{OrderId, RestingOrder, Side, TraderId, TraderState};
use crate::units::MarketMetadata;

/// Reserved bytes between the header and the market scalars
pub const MARKET_PADDING_SIZE: usize = 256;

/// Offset of the bids region
pub const MARKET_REGIONS_OFFSET: usize = MARKET_HEADER_SIZE + MARKET_PADDING_SIZE + 6 * 8;

/// Bijection between trader keys and their 1-based slot in the traders
/// region. Resting orders store the slot, not the key.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraderIndex {
    by_trader: HashMap<TraderId, u64>,
    by_index: HashMap<u64, TraderId>,
}

impl TraderIndex {
    fn from_table(table: &NodeTable<TraderId, TraderState>) -> DecodeResult<Self> {
        let mut index = Self::default();
        for (slot, trader, _) in table.iter_live() {
            if index.by_trader.insert(*trader, slot as u64).is_some() {
                return Err(DecodeError::DuplicateTrader(trader.to_string()));
            }
            index.by_index.insert(slot as u64, *trader);
        }
        Ok(index)
    }

    pub fn index_of(&self, trader: &TraderId) -> Option<u64> {
        self.by_trader.get(trader).copied()
    }

    pub fn trader_at(&self, index: u64) -> Option<&TraderId> {
        self.by_index.get(&index)
    }

    pub fn len(&self) -> usize {
        self.by_trader.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_trader.is_empty()
    }

    /// `(trader, index)` pairs in ascending index order
    pub fn entries(&self) -> Vec<(TraderId, u64)> {
        let mut entries: Vec<_> = self.by_trader.iter().map(|(k, i)| (*k, *i)).collect();
        entries.sort_by_key(|(_, i)| *i);
        entries
    }
}

/// Fully decoded market. Immutable once built.
#[derive(Debug, Clone)]
pub struct Market {
    pub header: MarketHeader,
    pub metadata: MarketMetadata,
    pub base_lots_per_base_unit: u64,
    pub quote_lots_per_base_unit_per_tick: u64,
    pub order_sequence_number: u64,
    pub taker_fee_bps: u64,
    pub collected_quote_lot_fees: u64,
    pub unclaimed_quote_lot_fees: u64,
    bids: Vec<(OrderId, RestingOrder)>,
    asks: Vec<(OrderId, RestingOrder)>,
    traders: HashMap<TraderId, TraderState>,
    trader_index: TraderIndex,
}

impl Market {
    /// Decode a complete market account.
    pub fn from_bytes(data: &[u8]) -> DecodeResult<Self> {
        if data.is_empty() {
            return Err(DecodeError::EmptySnapshot);
        }

        let mut reader = ByteReader::new(data, "market header");
        let header: MarketHeader = reader.read()?;
        let metadata = MarketMetadata::from_header(&header)?;

        reader.set_region("market padding");
        reader.skip(MARKET_PADDING_SIZE)?;

        reader.set_region("market scalars");
        let base_lots_per_base_unit = reader.read_u64()?;
        let quote_lots_per_base_unit_per_tick = reader.read_u64()?;
        let order_sequence_number = reader.read_u64()?;
        let taker_fee_bps = reader.read_u64()?;
        let collected_quote_lot_fees = reader.read_u64()?;
        let unclaimed_quote_lot_fees = reader.read_u64()?;
        debug_assert_eq!(reader.offset(), MARKET_REGIONS_OFFSET);
        log::trace!(
            "regions start at {}, {} bytes remain",
            reader.offset(),
            reader.remaining()
        );

        let params = header.market_size_params;
        let bids_data =
            take_region::<OrderId, RestingOrder>(&mut reader, "bids", params.bids_size)?;
        let asks_data =
            take_region::<OrderId, RestingOrder>(&mut reader, "asks", params.asks_size)?;
        let traders_data =
            take_region::<TraderId, TraderState>(&mut reader, "traders", params.num_seats)?;

        let bids_table = NodeTable::<OrderId, RestingOrder>::decode(bids_data, "bids")?;
        let asks_table = NodeTable::<OrderId, RestingOrder>::decode(asks_data, "asks")?;
        let traders_table = NodeTable::<TraderId, TraderState>::decode(traders_data, "traders")?;

        // Physical slot order is allocation order, not price order
        let mut bids = bids_table.into_live_pairs();
        bids.sort_by(|a, b| Side::Bid.priority(&a.0, &b.0));
        let mut asks = asks_table.into_live_pairs();
        asks.sort_by(|a, b| Side::Ask.priority(&a.0, &b.0));

        let trader_index = TraderIndex::from_table(&traders_table)?;
        let traders: HashMap<_, _> = traders_table.into_live_pairs().into_iter().collect();

        let orphans = bids
            .iter()
            .chain(asks.iter())
            .filter(|(_, order)| trader_index.trader_at(order.trader_index).is_none())
            .count();
        if orphans > 0 {
            log::warn!("{} resting orders reference unregistered trader slots", orphans);
        }

        log::debug!(
            "decoded market seq={} bids={} asks={} traders={}",
            header.market_sequence_number,
            bids.len(),
            asks.len(),
            traders.len()
        );

        Ok(Self {
            header,
            metadata,
            base_lots_per_base_unit,
            quote_lots_per_base_unit_per_tick,
            order_sequence_number,
            taker_fee_bps,
            collected_quote_lot_fees,
            unclaimed_quote_lot_fees,
            bids,
            asks,
            traders,
            trader_index,
        })
    }

    pub fn sequence_number(&self) -> u64 {
        self.header.market_sequence_number
    }

    /// Bids, best (highest) price first
    pub fn bids(&self) -> &[(OrderId, RestingOrder)] {
        &self.bids
    }

    /// Asks, best (lowest) price first
    pub fn asks(&self) -> &[(OrderId, RestingOrder)] {
        &self.asks
    }

    pub fn side(&self, side: Side) -> &[(OrderId, RestingOrder)] {
        match side {
            Side::Bid => &self.bids,
            Side::Ask => &self.asks,
        }
    }

    /// Best resting bid, expired or not
    pub fn best_bid(&self) -> Option<&(OrderId, RestingOrder)> {
        self.bids.first()
    }

    /// Best resting ask, expired or not
    pub fn best_ask(&self) -> Option<&(OrderId, RestingOrder)> {
        self.asks.first()
    }

    /// The first `levels` individual orders of a side as display
    /// `(price, size)` pairs, without aggregation or expiry filtering.
    pub fn top_of_book(&self, side: Side, levels: usize) -> Vec<(f64, f64)> {
        self.side(side)
            .iter()
            .take(levels)
            .map(|(id, order)| {
                (
                    self.metadata.ticks_to_float_price(id.price_in_ticks),
                    self.metadata.base_lots_to_raw_base_units_as_float(order.num_base_lots),
                )
            })
            .collect()
    }

    pub fn traders(&self) -> &HashMap<TraderId, TraderState> {
        &self.traders
    }

    pub fn trader(&self, trader: &TraderId) -> Option<&TraderState> {
        self.traders.get(trader)
    }

    pub fn trader_index(&self, trader: &TraderId) -> Option<u64> {
        self.trader_index.index_of(trader)
    }

    pub fn trader_id(&self, index: u64) -> Option<&TraderId> {
        self.trader_index.trader_at(index)
    }

    pub fn trader_indices(&self) -> &TraderIndex {
        &self.trader_index
    }

    /// Every resting order owned by `trader`, bids first, each side in
    /// priority order. Empty if the trader holds no seat.
    pub fn orders_for_trader<'a>(
        &'a self,
        trader: &TraderId,
    ) -> impl Iterator<Item = (Side, &'a OrderId, &'a RestingOrder)> + 'a {
        let index = self.trader_index.index_of(trader);
        let bids = self.bids.iter().map(|(id, order)| (Side::Bid, id, order));
        let asks = self.asks.iter().map(|(id, order)| (Side::Ask, id, order));
        bids.chain(asks)
            .filter(move |(_, _, order)| Some(order.trader_index) == index)
    }

    /// Look up a resting order on the side encoded in its sequence number.
    pub fn find_order(&self, order_id: &OrderId) -> Option<&RestingOrder> {
        let side = order_id.side();
        let orders = self.side(side);
        orders
            .binary_search_by(|(id, _)| side.priority(id, order_id))
            .ok()
            .map(|i| &orders[i].1)
    }
}

fn take_region<'a, K: FixedLayout, V: FixedLayout>(
    reader: &mut ByteReader<'a>,
    region: &'static str,
    capacity: u64,
) -> DecodeResult<&'a [u8]> {
    let len = region_size(K::LEN, V::LEN, capacity)
        .ok_or(DecodeError::RegionSizeOverflow { region, capacity })?;
    reader.set_region(region);
    reader.take(len)
}
