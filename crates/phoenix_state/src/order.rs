//! Order, trader and side types stored in the market regions

use core::cmp::Ordering;
use core::fmt;
use core::str::FromStr;

use serde::{Serialize, Serializer};

use crate::codec::{ByteReader, FixedLayout};
use crate::error::DecodeResult;

/// Bit of the order sequence number that marks a bid
pub const BID_SEQUENCE_BIT: u64 = 1 << 63;

/// Order side
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    pub const fn opposite(self) -> Self {
        match self {
            Side::Bid => Side::Ask,
            Side::Ask => Side::Bid,
        }
    }

    /// Bids carry the top bit of their sequence number.
    pub const fn from_order_sequence_number(order_sequence_number: u64) -> Self {
        if order_sequence_number & BID_SEQUENCE_BIT != 0 {
            Side::Bid
        } else {
            Side::Ask
        }
    }

    /// Price-time priority on this side: `Less` means `a` is matched first.
    ///
    /// Bids rank higher prices first, asks lower prices first. Equal prices
    /// rank the lower sequence number first on both sides.
    pub fn priority(self, a: &OrderId, b: &OrderId) -> Ordering {
        let by_price = match self {
            Side::Bid => b.price_in_ticks.cmp(&a.price_in_ticks),
            Side::Ask => a.price_in_ticks.cmp(&b.price_in_ticks),
        };
        by_price.then(a.order_sequence_number.cmp(&b.order_sequence_number))
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => write!(f, "Bid"),
            Side::Ask => write!(f, "Ask"),
        }
    }
}

/// Key of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct OrderId {
    pub price_in_ticks: u64,
    pub order_sequence_number: u64,
}

impl OrderId {
    pub const fn new(price_in_ticks: u64, order_sequence_number: u64) -> Self {
        Self {
            price_in_ticks,
            order_sequence_number,
        }
    }

    pub const fn side(&self) -> Side {
        Side::from_order_sequence_number(self.order_sequence_number)
    }

    /// Arrival counter without the side bit
    pub const fn sequence(&self) -> u64 {
        self.order_sequence_number & !BID_SEQUENCE_BIT
    }
}

impl FixedLayout for OrderId {
    const LEN: usize = 16;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "order id");
        Ok(Self {
            price_in_ticks: reader.read_u64()?,
            order_sequence_number: reader.read_u64()?,
        })
    }
}

/// Reference point for expiry checks. `None` disables that dimension.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExpiryReference {
    pub slot: Option<u64>,
    pub unix_timestamp: Option<u64>,
}

impl ExpiryReference {
    pub const NONE: Self = Self {
        slot: None,
        unix_timestamp: None,
    };

    pub const fn new(slot: u64, unix_timestamp: u64) -> Self {
        Self {
            slot: Some(slot),
            unix_timestamp: Some(unix_timestamp),
        }
    }
}

/// Value of a resting order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RestingOrder {
    /// 1-based trader slot, see [`crate::TraderIndex`]
    pub trader_index: u64,
    pub num_base_lots: u64,
    /// 0 = no slot expiry
    pub last_valid_slot: u64,
    /// 0 = no timestamp expiry
    pub last_valid_unix_timestamp_in_seconds: u64,
}

impl RestingOrder {
    pub fn is_expired(&self, reference: &ExpiryReference) -> bool {
        let slot_expired = match reference.slot {
            Some(slot) => self.last_valid_slot != 0 && self.last_valid_slot < slot,
            None => false,
        };
        let time_expired = match reference.unix_timestamp {
            Some(ts) => {
                self.last_valid_unix_timestamp_in_seconds != 0
                    && self.last_valid_unix_timestamp_in_seconds < ts
            }
            None => false,
        };
        slot_expired || time_expired
    }
}

impl FixedLayout for RestingOrder {
    const LEN: usize = 32;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "resting order");
        Ok(Self {
            trader_index: reader.read_u64()?,
            num_base_lots: reader.read_u64()?,
            last_valid_slot: reader.read_u64()?,
            last_valid_unix_timestamp_in_seconds: reader.read_u64()?,
        })
    }
}

/// 32-byte account identifier, shown as base58
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct AccountKey(pub [u8; 32]);

/// Traders are keyed by their wallet address
pub type TraderId = AccountKey;

impl AccountKey {
    pub const fn to_bytes(self) -> [u8; 32] {
        self.0
    }
}

impl fmt::Display for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for AccountKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AccountKey({})", self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid base58 identifier: {0}")]
pub struct ParseAccountKeyError(String);

impl FromStr for AccountKey {
    type Err = ParseAccountKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut out = [0u8; 32];
        let written = bs58::decode(s)
            .onto(&mut out)
            .map_err(|_| ParseAccountKeyError(s.to_string()))?;
        if written != 32 {
            return Err(ParseAccountKeyError(s.to_string()));
        }
        Ok(Self(out))
    }
}

impl Serialize for AccountKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl FixedLayout for AccountKey {
    const LEN: usize = 32;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        ByteReader::new(bytes, "account key").take_array().map(Self)
    }
}

/// Balances held by a registered trader, in lots
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TraderState {
    pub quote_lots_locked: u64,
    pub quote_lots_free: u64,
    pub base_lots_locked: u64,
    pub base_lots_free: u64,
}

impl FixedLayout for TraderState {
    // Four balances followed by 8 words of padding
    const LEN: usize = 96;

    fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let mut reader = ByteReader::new(bytes, "trader state");
        let state = Self {
            quote_lots_locked: reader.read_u64()?,
            quote_lots_free: reader.read_u64()?,
            base_lots_locked: reader.read_u64()?,
            base_lots_free: reader.read_u64()?,
        };
        reader.skip(8 * 8)?;
        Ok(state)
    }
}
