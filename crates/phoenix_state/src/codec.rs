//! Bounds-checked little-endian reads over account bytes

use crate::error::{DecodeError, DecodeResult};

/// A record with a fixed little-endian encoding of `LEN` bytes
pub trait FixedLayout: Sized {
    const LEN: usize;

    /// Decode from a slice of exactly `Self::LEN` bytes.
    fn decode(bytes: &[u8]) -> DecodeResult<Self>;
}

/// Forward-only cursor over a byte slice.
///
/// Reads past the end fail with [`DecodeError::Truncated`] naming `region`.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    offset: usize,
    region: &'static str,
}

impl<'a> ByteReader<'a> {
    pub fn new(data: &'a [u8], region: &'static str) -> Self {
        Self {
            data,
            offset: 0,
            region,
        }
    }

    /// Name reported by subsequent truncation errors
    pub fn set_region(&mut self, region: &'static str) {
        self.region = region;
    }

    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len() - self.offset
    }

    pub fn take(&mut self, len: usize) -> DecodeResult<&'a [u8]> {
        let end = self.offset.checked_add(len).ok_or(DecodeError::Truncated {
            region: self.region,
            needed: usize::MAX,
            available: self.data.len(),
        })?;
        let bytes = self.data.get(self.offset..end).ok_or(DecodeError::Truncated {
            region: self.region,
            needed: end,
            available: self.data.len(),
        })?;
        self.offset = end;
        Ok(bytes)
    }

    pub fn skip(&mut self, len: usize) -> DecodeResult<()> {
        self.take(len).map(|_| ())
    }

    pub fn take_array<const N: usize>(&mut self) -> DecodeResult<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn read_u32(&mut self) -> DecodeResult<u32> {
        self.take_array().map(u32::from_le_bytes)
    }

    pub fn read_i32(&mut self) -> DecodeResult<i32> {
        self.take_array().map(i32::from_le_bytes)
    }

    pub fn read_u64(&mut self) -> DecodeResult<u64> {
        self.take_array().map(u64::from_le_bytes)
    }

    pub fn read<T: FixedLayout>(&mut self) -> DecodeResult<T> {
        T::decode(self.take(T::LEN)?)
    }
}
