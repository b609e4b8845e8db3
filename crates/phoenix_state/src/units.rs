//! Fixed-point unit conversions for one market
//!
//! Four scales are in play:
//! - atoms: smallest indivisible token unit (`10^decimals` per unit)
//! - lots: the market's trading increment, a fixed number of atoms
//! - ticks: the price increment, `tick_size` quote atoms per base unit
//! - raw base units: display units of the base token, where one "base unit"
//!   may bundle several raw units (`raw_base_units_per_base_unit`)
//!
//! Float-input conversions that round up add 0.5 before truncating. That
//! is not a true ceiling (1.4 lots rounds "up" to 1), but it matches what
//! order-sizing code built on these helpers already expects.

use serde::Serialize;

use crate::error::{DecodeError, DecodeResult};
use crate::header::{MarketHeader, MarketSizeParams};
use crate::order::AccountKey;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MarketMetadata {
    pub base_mint: AccountKey,
    pub quote_mint: AccountKey,
    pub base_decimals: u32,
    pub quote_decimals: u32,
    pub base_atoms_per_raw_base_unit: u64,
    pub quote_atoms_per_quote_unit: u64,
    pub base_atoms_per_base_lot: u64,
    pub quote_atoms_per_quote_lot: u64,
    pub tick_size_in_quote_atoms_per_base_unit: u64,
    pub raw_base_units_per_base_unit: u32,
    pub num_base_lots_per_base_unit: u64,
    pub market_size_params: MarketSizeParams,
}

fn atoms_per_unit(decimals: u32) -> DecodeResult<u64> {
    10u64
        .checked_pow(decimals)
        .ok_or(DecodeError::DecimalsOverflow { decimals })
}

fn non_zero(value: u64, field: &'static str) -> DecodeResult<u64> {
    if value == 0 {
        return Err(DecodeError::ZeroSize { field });
    }
    Ok(value)
}

impl MarketMetadata {
    /// Derive scaling constants, rejecting headers whose base lot size does
    /// not evenly divide one base unit.
    pub fn from_header(header: &MarketHeader) -> DecodeResult<Self> {
        let base_atoms_per_base_lot = non_zero(header.base_lot_size, "base lot size")?;
        let quote_atoms_per_quote_lot = non_zero(header.quote_lot_size, "quote lot size")?;
        let tick_size = non_zero(header.tick_size_in_quote_atoms_per_base_unit, "tick size")?;

        let base_decimals = header.base_params.decimals;
        let quote_decimals = header.quote_params.decimals;
        let base_atoms_per_raw_base_unit = atoms_per_unit(base_decimals)?;
        let quote_atoms_per_quote_unit = atoms_per_unit(quote_decimals)?;
        let raw_base_units_per_base_unit = header.effective_raw_base_units_per_base_unit();

        let base_atoms_per_base_unit =
            base_atoms_per_raw_base_unit as u128 * raw_base_units_per_base_unit as u128;
        if base_atoms_per_base_unit % base_atoms_per_base_lot as u128 != 0 {
            return Err(DecodeError::InvalidBaseLotSize {
                base_decimals,
                raw_base_units_per_base_unit,
                base_lot_size: base_atoms_per_base_lot,
            });
        }
        let num_base_lots_per_base_unit =
            u64::try_from(base_atoms_per_base_unit / base_atoms_per_base_lot as u128)
                .map_err(|_| DecodeError::DecimalsOverflow {
                    decimals: base_decimals,
                })?;

        Ok(Self {
            base_mint: header.base_params.mint_key,
            quote_mint: header.quote_params.mint_key,
            base_decimals,
            quote_decimals,
            base_atoms_per_raw_base_unit,
            quote_atoms_per_quote_unit,
            base_atoms_per_base_lot,
            quote_atoms_per_quote_lot,
            tick_size_in_quote_atoms_per_base_unit: tick_size,
            raw_base_units_per_base_unit,
            num_base_lots_per_base_unit,
            market_size_params: header.market_size_params,
        })
    }

    // ------------------------------------------------------------------
    // Base quantities
    // ------------------------------------------------------------------

    pub fn raw_base_units_to_base_lots(&self, raw_base_units: f64, round_up: bool) -> u64 {
        let base_units = raw_base_units / self.raw_base_units_per_base_unit as f64;
        let lots = base_units * self.num_base_lots_per_base_unit as f64;
        if round_up {
            (lots + 0.5) as u64
        } else {
            lots as u64
        }
    }

    pub fn raw_base_units_to_base_lots_rounded_down(&self, raw_base_units: f64) -> u64 {
        self.raw_base_units_to_base_lots(raw_base_units, false)
    }

    pub fn raw_base_units_to_base_lots_rounded_up(&self, raw_base_units: f64) -> u64 {
        self.raw_base_units_to_base_lots(raw_base_units, true)
    }

    #[inline]
    pub fn base_atoms_to_base_lots_rounded_down(&self, base_atoms: u64) -> u64 {
        base_atoms / self.base_atoms_per_base_lot
    }

    #[inline]
    pub fn base_atoms_to_base_lots_rounded_up(&self, base_atoms: u64) -> u64 {
        base_atoms.div_ceil(self.base_atoms_per_base_lot)
    }

    #[inline]
    pub fn base_lots_to_base_atoms(&self, base_lots: u64) -> u128 {
        base_lots as u128 * self.base_atoms_per_base_lot as u128
    }

    pub fn base_atoms_to_raw_base_units_as_float(&self, base_atoms: u128) -> f64 {
        base_atoms as f64 / self.base_atoms_per_raw_base_unit as f64
    }

    pub fn base_lots_to_raw_base_units_as_float(&self, base_lots: u64) -> f64 {
        self.base_atoms_to_raw_base_units_as_float(self.base_lots_to_base_atoms(base_lots))
    }

    pub fn raw_base_units_per_base_lot(&self) -> f64 {
        self.base_atoms_per_base_lot as f64 / self.base_atoms_per_raw_base_unit as f64
    }

    // ------------------------------------------------------------------
    // Quote quantities
    // ------------------------------------------------------------------

    pub fn quote_units_to_quote_lots(&self, quote_units: f64) -> u64 {
        let lots_per_unit =
            self.quote_atoms_per_quote_unit as f64 / self.quote_atoms_per_quote_lot as f64;
        (quote_units * lots_per_unit) as u64
    }

    #[inline]
    pub fn quote_atoms_to_quote_lots_rounded_down(&self, quote_atoms: u64) -> u64 {
        quote_atoms / self.quote_atoms_per_quote_lot
    }

    #[inline]
    pub fn quote_atoms_to_quote_lots_rounded_up(&self, quote_atoms: u64) -> u64 {
        quote_atoms.div_ceil(self.quote_atoms_per_quote_lot)
    }

    #[inline]
    pub fn quote_lots_to_quote_atoms(&self, quote_lots: u64) -> u128 {
        quote_lots as u128 * self.quote_atoms_per_quote_lot as u128
    }

    pub fn quote_atoms_to_quote_units_as_float(&self, quote_atoms: u128) -> f64 {
        quote_atoms as f64 / self.quote_atoms_per_quote_unit as f64
    }

    pub fn quote_lots_to_quote_units(&self, quote_lots: u64) -> f64 {
        self.quote_atoms_to_quote_units_as_float(self.quote_lots_to_quote_atoms(quote_lots))
    }

    // ------------------------------------------------------------------
    // Prices
    // ------------------------------------------------------------------

    /// Quote atoms exchanged for `base_lots` at `price_in_ticks`, rounded
    /// down. `None` if the product leaves u128.
    pub fn base_lots_and_price_to_quote_atoms(
        &self,
        base_lots: u64,
        price_in_ticks: u64,
    ) -> Option<u128> {
        (base_lots as u128)
            .checked_mul(price_in_ticks as u128)?
            .checked_mul(self.tick_size_in_quote_atoms_per_base_unit as u128)
            .map(|n| n / self.num_base_lots_per_base_unit as u128)
    }

    pub fn price_to_ticks(&self, price: f64, round_up: bool) -> u64 {
        let ticks = (price
            * self.raw_base_units_per_base_unit as f64
            * self.quote_atoms_per_quote_unit as f64)
            / self.tick_size_in_quote_atoms_per_base_unit as f64;
        if round_up {
            (ticks + 0.5) as u64
        } else {
            ticks as u64
        }
    }

    pub fn float_price_to_ticks_rounded_down(&self, price: f64) -> u64 {
        self.price_to_ticks(price, false)
    }

    pub fn float_price_to_ticks_rounded_up(&self, price: f64) -> u64 {
        self.price_to_ticks(price, true)
    }

    pub fn ticks_to_float_price(&self, ticks: u64) -> f64 {
        let quote_atoms = ticks as u128 * self.tick_size_in_quote_atoms_per_base_unit as u128;
        quote_atoms as f64 / self.quote_atoms_per_raw_base_unit() as f64
    }

    pub fn quote_units_per_raw_base_unit_per_tick(&self) -> f64 {
        self.tick_size_in_quote_atoms_per_base_unit as f64
            / self.quote_atoms_per_raw_base_unit() as f64
    }

    #[inline]
    fn quote_atoms_per_raw_base_unit(&self) -> u128 {
        self.quote_atoms_per_quote_unit as u128 * self.raw_base_units_per_base_unit as u128
    }
}
