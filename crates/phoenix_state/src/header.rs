//! Market header (first 576 bytes of the account)

use serde::Serialize;

use crate::codec::{ByteReader, FixedLayout};
use crate::error::DecodeResult;
use crate::order::AccountKey;

/// Encoded size of [`MarketHeader`]
pub const MARKET_HEADER_SIZE: usize = 576;

/// Lifecycle state of a market
#[repr(u64)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MarketStatus {
    Uninitialized = 0,
    Active = 1,
    PostOnly = 2,
    Paused = 3,
    Closed = 4,
    Tombstoned = 5,
}

impl MarketStatus {
    pub const fn from_u64(raw: u64) -> Option<Self> {
        match raw {
            0 => Some(MarketStatus::Uninitialized),
            1 => Some(MarketStatus::Active),
            2 => Some(MarketStatus::PostOnly),
            3 => Some(MarketStatus::Paused),
            4 => Some(MarketStatus::Closed),
            5 => Some(MarketStatus::Tombstoned),
            _ => None,
        }
    }
}

/// Capacities of the three arena regions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MarketSizeParams {
    pub bids_size: u64,
    pub asks_size: u64,
    pub num_seats: u64,
}

impl FixedLayout for MarketSizeParams {
    const LEN: usize = 24;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "market size params");
        Ok(Self {
            bids_size: reader.read_u64()?,
            asks_size: reader.read_u64()?,
            num_seats: reader.read_u64()?,
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TokenParams {
    pub decimals: u32,
    pub vault_bump: u32,
    pub mint_key: AccountKey,
    pub vault_key: AccountKey,
}

impl FixedLayout for TokenParams {
    const LEN: usize = 72;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "token params");
        Ok(Self {
            decimals: reader.read_u32()?,
            vault_bump: reader.read_u32()?,
            mint_key: reader.read()?,
            vault_key: reader.read()?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarketHeader {
    pub discriminant: u64,
    /// Raw status word, see [`MarketHeader::market_status`]
    pub status: u64,
    pub market_size_params: MarketSizeParams,
    pub base_params: TokenParams,
    pub base_lot_size: u64,
    pub quote_params: TokenParams,
    pub quote_lot_size: u64,
    pub tick_size_in_quote_atoms_per_base_unit: u64,
    pub authority: AccountKey,
    pub fee_recipient: AccountKey,
    pub market_sequence_number: u64,
    pub successor: AccountKey,
    /// 0 on older markets, read as 1
    pub raw_base_units_per_base_unit: u32,
}

impl MarketHeader {
    /// `None` for status words this decoder does not know.
    pub const fn market_status(&self) -> Option<MarketStatus> {
        MarketStatus::from_u64(self.status)
    }

    pub fn effective_raw_base_units_per_base_unit(&self) -> u32 {
        self.raw_base_units_per_base_unit.max(1)
    }
}

impl FixedLayout for MarketHeader {
    const LEN: usize = MARKET_HEADER_SIZE;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "market header");
        let header = Self {
            discriminant: reader.read_u64()?,
            status: reader.read_u64()?,
            market_size_params: reader.read()?,
            base_params: reader.read()?,
            base_lot_size: reader.read_u64()?,
            quote_params: reader.read()?,
            quote_lot_size: reader.read_u64()?,
            tick_size_in_quote_atoms_per_base_unit: reader.read_u64()?,
            authority: reader.read()?,
            fee_recipient: reader.read()?,
            market_sequence_number: reader.read_u64()?,
            successor: reader.read()?,
            raw_base_units_per_base_unit: reader.read_u32()?,
        };
        // padding1 (u32) + padding2 ([u64; 32])
        reader.skip(4 + 8 * 32)?;
        debug_assert_eq!(reader.remaining(), 0);
        Ok(header)
    }
}
