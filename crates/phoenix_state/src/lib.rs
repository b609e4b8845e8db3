//! Decoder for Phoenix-style on-chain order book accounts
//! Pure and synchronous: bytes in, market and ladder out. No I/O.
//!
//! ```ignore
//! let market = Market::from_bytes(&account_data)?;
//! let ladder = market.ui_ladder(&ExpiryReference::new(slot, unix_ts), DEFAULT_LADDER_DEPTH);
//! println!("{}", ladder);
//! ```

#![forbid(unsafe_code)]

pub mod arena;
pub mod codec;
pub mod error;
pub mod header;
pub mod ladder;
pub mod market;
pub mod order;
pub mod units;

// Re-export commonly used types
pub use error::{DecodeError, DecodeResult, ErrorKind};
pub use header::{
    MarketHeader, MarketSizeParams, MarketStatus, TokenParams, MARKET_HEADER_SIZE,
};
pub use ladder::{Ladder, LadderLevel, UiLadder, UiLadderLevel, DEFAULT_LADDER_DEPTH};
pub use market::{Market, TraderIndex};
pub use order::{
    AccountKey, ExpiryReference, OrderId, RestingOrder, Side, TraderId, TraderState,
};
pub use units::MarketMetadata;
