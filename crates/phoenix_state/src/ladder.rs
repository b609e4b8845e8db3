//! Depth-limited price ladders
//!
//! A ladder collapses each side of the book into price levels, best first.
//! Expired orders are skipped; equal prices are merged into one level.

use std::fmt;

use serde::Serialize;

use crate::market::Market;
use crate::order::{ExpiryReference, OrderId, RestingOrder};
use crate::units::MarketMetadata;

pub const DEFAULT_LADDER_DEPTH: usize = 10;

/// One price level in ticks and base lots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LadderLevel {
    pub price_in_ticks: u64,
    pub size_in_base_lots: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Ladder {
    /// Highest price first
    pub bids: Vec<LadderLevel>,
    /// Lowest price first
    pub asks: Vec<LadderLevel>,
}

/// One price level in quote units per raw base unit and raw base units
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct UiLadderLevel {
    pub price: f64,
    pub quantity: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UiLadder {
    pub bids: Vec<UiLadderLevel>,
    pub asks: Vec<UiLadderLevel>,
}

/// Aggregate one side, already in priority order, into at most `depth`
/// levels.
pub fn aggregate_side<'a, I>(
    orders: I,
    reference: &ExpiryReference,
    depth: usize,
) -> Vec<LadderLevel>
where
    I: IntoIterator<Item = &'a (OrderId, RestingOrder)>,
{
    let mut levels: Vec<LadderLevel> = Vec::new();
    if depth == 0 {
        return levels;
    }
    for (order_id, order) in orders {
        if order.is_expired(reference) {
            continue;
        }
        match levels.last_mut() {
            Some(level) if level.price_in_ticks == order_id.price_in_ticks => {
                level.size_in_base_lots =
                    level.size_in_base_lots.saturating_add(order.num_base_lots);
            }
            _ => {
                if levels.len() == depth {
                    break;
                }
                levels.push(LadderLevel {
                    price_in_ticks: order_id.price_in_ticks,
                    size_in_base_lots: order.num_base_lots,
                });
            }
        }
    }
    levels
}

impl LadderLevel {
    pub fn to_ui(&self, metadata: &MarketMetadata) -> UiLadderLevel {
        UiLadderLevel {
            price: metadata.ticks_to_float_price(self.price_in_ticks),
            quantity: metadata.base_lots_to_raw_base_units_as_float(self.size_in_base_lots),
        }
    }
}

impl Ladder {
    pub fn to_ui(&self, metadata: &MarketMetadata) -> UiLadder {
        UiLadder {
            bids: self.bids.iter().map(|l| l.to_ui(metadata)).collect(),
            asks: self.asks.iter().map(|l| l.to_ui(metadata)).collect(),
        }
    }
}

impl fmt::Display for UiLadder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for level in self.asks.iter().rev() {
            writeln!(f, "{} {}", level.price, level.quantity)?;
        }
        writeln!(f)?;
        for level in &self.bids {
            writeln!(f, "{} {}", level.price, level.quantity)?;
        }
        Ok(())
    }
}

impl Market {
    /// Raw ladder of both sides. Expiry is judged against `reference`.
    pub fn ladder(&self, reference: &ExpiryReference, depth: usize) -> Ladder {
        Ladder {
            bids: aggregate_side(self.bids(), reference, depth),
            asks: aggregate_side(self.asks(), reference, depth),
        }
    }

    pub fn ui_ladder(&self, reference: &ExpiryReference, depth: usize) -> UiLadder {
        self.ladder(reference, depth).to_ui(&self.metadata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::BID_SEQUENCE_BIT;

    fn order(price: u64, seq: u64, lots: u64, last_valid_slot: u64) -> (OrderId, RestingOrder) {
        (
            OrderId::new(price, seq),
            RestingOrder {
                trader_index: 1,
                num_base_lots: lots,
                last_valid_slot,
                last_valid_unix_timestamp_in_seconds: 0,
            },
        )
    }

    fn level(price_in_ticks: u64, size_in_base_lots: u64) -> LadderLevel {
        LadderLevel {
            price_in_ticks,
            size_in_base_lots,
        }
    }

    #[test]
    fn test_equal_prices_merge() {
        let bids = vec![
            order(105, BID_SEQUENCE_BIT | 1, 3, 0),
            order(105, BID_SEQUENCE_BIT | 4, 2, 0),
            order(100, BID_SEQUENCE_BIT | 2, 7, 0),
        ];
        let levels = aggregate_side(&bids, &ExpiryReference::NONE, DEFAULT_LADDER_DEPTH);
        assert_eq!(levels, vec![level(105, 5), level(100, 7)]);
    }

    #[test]
    fn test_depth_cap_keeps_merging_last_level() {
        let asks = vec![
            order(100, 1, 1, 0),
            order(101, 2, 1, 0),
            order(101, 3, 4, 0),
            order(102, 4, 9, 0),
        ];
        let levels = aggregate_side(&asks, &ExpiryReference::NONE, 2);
        assert_eq!(levels, vec![level(100, 1), level(101, 5)]);
    }

    #[test]
    fn test_zero_depth() {
        let asks = vec![order(100, 1, 1, 0)];
        assert!(aggregate_side(&asks, &ExpiryReference::NONE, 0).is_empty());
    }

    #[test]
    fn test_expired_orders_skipped() {
        let asks = vec![order(100, 1, 1, 50), order(101, 2, 2, 0), order(102, 3, 3, 200)];
        let reference = ExpiryReference {
            slot: Some(100),
            unix_timestamp: None,
        };
        let levels = aggregate_side(&asks, &reference, 1);
        // Expired best level does not consume depth
        assert_eq!(levels, vec![level(101, 2)]);
    }

    #[test]
    fn test_ui_display() {
        let ui = UiLadder {
            bids: vec![
                UiLadderLevel { price: 22.4, quantity: 1.5 },
                UiLadderLevel { price: 22.3, quantity: 2.0 },
            ],
            asks: vec![
                UiLadderLevel { price: 22.5, quantity: 0.5 },
                UiLadderLevel { price: 22.6, quantity: 3.0 },
            ],
        };
        assert_eq!(ui.to_string(), "22.6 3\n22.5 0.5\n\n22.4 1.5\n22.3 2\n");
    }

    #[test]
    fn test_serialize() {
        let ladder = Ladder {
            bids: vec![level(105, 5)],
            asks: vec![],
        };
        let json = serde_json::to_string(&ladder).unwrap();
        assert_eq!(json, r#"{"bids":[{"price_in_ticks":105,"size_in_base_lots":5}],"asks":[]}"#);
    }
}
