//! Decode errors
//!
//! Every failure aborts the whole decode. Nothing in this crate hands back a
//! partially populated market.

use thiserror::Error;

/// Coarse classification of a [`DecodeError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Buffer too short for its declared sizes, or a malformed free list
    StructuralCorruption,
    /// Header fields describe an impossible market
    InvariantViolation,
    /// No bytes were supplied at all
    EmptyOrMissingSnapshot,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("snapshot is empty")]
    EmptySnapshot,

    #[error("truncated {region}: need {needed} bytes, have {available}")]
    Truncated {
        region: &'static str,
        needed: usize,
        available: usize,
    },

    #[error("{region} size overflows for declared capacity {capacity}")]
    RegionSizeOverflow { region: &'static str, capacity: u64 },

    #[error("bump index {bump_index} is inconsistent with capacity {capacity}")]
    BumpIndexOutOfRange { bump_index: i32, capacity: usize },

    #[error("free list pointer {pointer} outside of {allocated} allocated slots")]
    FreeListOutOfRange { pointer: i32, allocated: usize },

    #[error("free list did not terminate within {bump_index} steps")]
    FreeListCycle { bump_index: i32 },

    #[error("trader {0} occupies more than one live slot")]
    DuplicateTrader(String),

    #[error("invalid base lot size: 10^{base_decimals} * {raw_base_units_per_base_unit} is not a multiple of {base_lot_size}")]
    InvalidBaseLotSize {
        base_decimals: u32,
        raw_base_units_per_base_unit: u32,
        base_lot_size: u64,
    },

    #[error("{field} must be non-zero")]
    ZeroSize { field: &'static str },

    #[error("{decimals} decimals overflow the atom scale")]
    DecimalsOverflow { decimals: u32 },
}

impl DecodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::EmptySnapshot => ErrorKind::EmptyOrMissingSnapshot,
            DecodeError::Truncated { .. }
            | DecodeError::RegionSizeOverflow { .. }
            | DecodeError::BumpIndexOutOfRange { .. }
            | DecodeError::FreeListOutOfRange { .. }
            | DecodeError::FreeListCycle { .. }
            | DecodeError::DuplicateTrader(_) => ErrorKind::StructuralCorruption,
            DecodeError::InvalidBaseLotSize { .. }
            | DecodeError::ZeroSize { .. }
            | DecodeError::DecimalsOverflow { .. } => ErrorKind::InvariantViolation,
        }
    }

    /// Re-decoding the same bytes can never succeed; callers must fetch a
    /// fresh snapshot instead.
    pub fn is_retryable(&self) -> bool {
        false
    }
}

pub type DecodeResult<T> = Result<T, DecodeError>;
