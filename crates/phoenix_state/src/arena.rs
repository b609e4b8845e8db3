//! Arena node table decoding
//!
//! Each order book region is a fixed-capacity array of slots managed by a
//! bump allocator with a singly-linked free list:
//!
//! ```text
//! [tree header 16][allocator size 8][bump_index i32][free_list_head i32]
//! [slot 1: registers 4 x i32 | key | value]
//! [slot 2: ...]
//! ```
//!
//! Slots `1..bump_index` have been handed out at some point. A slot that was
//! later released sits on the free list, threaded through register 0. Slot
//! numbers are 1-based; 0 is the null pointer.
//!
//! The remaining registers hold tree links and are never read:
//! callers get slots in physical order and sort them themselves.

use std::collections::{BTreeSet, HashMap};
use std::hash::Hash;

use crate::codec::{ByteReader, FixedLayout};
use crate::error::{DecodeError, DecodeResult};

/// Tree header (16) + allocator size (8) + bump index (4) + free list head (4)
pub const CONTAINER_HEADER_SIZE: usize = 32;

/// Four i32 registers in front of every slot
pub const SLOT_OVERHEAD: usize = 16;

/// Null slot pointer
pub const SENTINEL: i32 = 0;

/// Bytes occupied by a region of `capacity` slots, `None` on overflow.
pub fn region_size(key_len: usize, value_len: usize, capacity: u64) -> Option<usize> {
    let slot_len = SLOT_OVERHEAD.checked_add(key_len)?.checked_add(value_len)?;
    usize::try_from(capacity)
        .ok()?
        .checked_mul(slot_len)?
        .checked_add(CONTAINER_HEADER_SIZE)
}

/// Decoded arena region: every allocated slot in physical order plus the
/// set of slots on the free list.
#[derive(Debug, Clone)]
pub struct NodeTable<K, V> {
    nodes: Vec<(K, V)>,
    /// 0-based physical indices
    free: BTreeSet<usize>,
}

impl<K: FixedLayout, V: FixedLayout> NodeTable<K, V> {
    pub fn decode(data: &[u8], region: &'static str) -> DecodeResult<Self> {
        Self::decode_with(data, K::LEN, V::LEN, region, K::decode, V::decode)
    }
}

impl<K, V> NodeTable<K, V> {
    /// Decode a region with caller-supplied key and value decoders. Each
    /// decoder receives exactly `key_len` / `value_len` bytes.
    pub fn decode_with<FK, FV>(
        data: &[u8],
        key_len: usize,
        value_len: usize,
        region: &'static str,
        decode_key: FK,
        decode_value: FV,
    ) -> DecodeResult<Self>
    where
        FK: Fn(&[u8]) -> DecodeResult<K>,
        FV: Fn(&[u8]) -> DecodeResult<V>,
    {
        let mut reader = ByteReader::new(data, region);
        reader.skip(16)?; // tree header
        reader.skip(8)?; // allocator size
        let bump_index = reader.read_i32()?;
        let free_list_head = reader.read_i32()?;

        let slot_len = SLOT_OVERHEAD + key_len + value_len;
        let capacity = reader.remaining() / slot_len;
        if bump_index < 0 || (bump_index as usize).saturating_sub(1) > capacity {
            return Err(DecodeError::BumpIndexOutOfRange {
                bump_index,
                capacity,
            });
        }
        let allocated = (bump_index as usize).saturating_sub(1);
        log::trace!(
            "{}: bump_index={} free_list_head={} capacity={}",
            region,
            bump_index,
            free_list_head,
            capacity
        );

        let mut nodes = Vec::with_capacity(allocated);
        let mut next_free = Vec::with_capacity(allocated);
        for _ in 0..allocated {
            let next = reader.read_i32()?;
            reader.skip(SLOT_OVERHEAD - 4)?;
            let key = decode_key(reader.take(key_len)?)?;
            let value = decode_value(reader.take(value_len)?)?;
            nodes.push((key, value));
            next_free.push(next);
        }

        let mut free = BTreeSet::new();
        let mut pointer = free_list_head;
        let mut steps = 0usize;
        while pointer != SENTINEL && pointer < bump_index {
            if pointer < 0 {
                return Err(DecodeError::FreeListOutOfRange { pointer, allocated });
            }
            steps += 1;
            if steps > bump_index as usize {
                return Err(DecodeError::FreeListCycle { bump_index });
            }
            // 1 <= pointer < bump_index, so always an allocated slot
            let index = (pointer - 1) as usize;
            free.insert(index);
            pointer = next_free[index];
        }

        log::debug!(
            "{}: {} allocated, {} free, {} live",
            region,
            allocated,
            free.len(),
            allocated - free.len()
        );
        Ok(Self { nodes, free })
    }

    /// Slots ever handed out (`bump_index - 1`)
    pub fn allocated(&self) -> usize {
        self.nodes.len()
    }

    /// 0-based physical indices of vacant slots
    pub fn free_slots(&self) -> &BTreeSet<usize> {
        &self.free
    }

    pub fn live_len(&self) -> usize {
        self.nodes.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live_len() == 0
    }

    /// Live slots in physical order as `(1-based slot, key, value)`
    pub fn iter_live(&self) -> impl Iterator<Item = (u32, &K, &V)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.free.contains(i))
            .map(|(i, (k, v))| (i as u32 + 1, k, v))
    }

    pub fn live_pairs(&self) -> impl Iterator<Item = (&K, &V)> + '_ {
        self.iter_live().map(|(_, k, v)| (k, v))
    }

    pub fn into_live_pairs(self) -> Vec<(K, V)> {
        let free = self.free;
        self.nodes
            .into_iter()
            .enumerate()
            .filter(|(i, _)| !free.contains(i))
            .map(|(_, kv)| kv)
            .collect()
    }
}

impl<K: Copy + Eq + Hash, V> NodeTable<K, V> {
    /// 1-based slot of every live key
    pub fn index_map(&self) -> HashMap<K, u32> {
        self.iter_live().map(|(i, k, _)| (*k, i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_u64(bytes: &[u8]) -> DecodeResult<u64> {
        ByteReader::new(bytes, "test").read_u64()
    }

    /// Region of u64 -> u64 slots. `next` holds register 0 per slot.
    fn encode(
        capacity: usize,
        bump_index: i32,
        free_list_head: i32,
        slots: &[(u64, u64, i32)],
    ) -> Vec<u8> {
        let mut data = vec![0u8; 16];
        data.extend_from_slice(&(capacity as u64).to_le_bytes());
        data.extend_from_slice(&bump_index.to_le_bytes());
        data.extend_from_slice(&free_list_head.to_le_bytes());
        for i in 0..capacity {
            let (key, value, next) = slots.get(i).copied().unwrap_or((0, 0, 0));
            data.extend_from_slice(&next.to_le_bytes());
            data.extend_from_slice(&[0u8; 12]);
            data.extend_from_slice(&key.to_le_bytes());
            data.extend_from_slice(&value.to_le_bytes());
        }
        assert_eq!(Some(data.len()), region_size(8, 8, capacity as u64));
        data
    }

    fn decode(data: &[u8]) -> DecodeResult<NodeTable<u64, u64>> {
        NodeTable::decode_with(data, 8, 8, "test", read_u64, read_u64)
    }

    #[test]
    fn test_all_live() {
        let data = encode(4, 4, 4, &[(10, 1, 0), (20, 2, 0), (30, 3, 0)]);
        let table = decode(&data).unwrap();
        assert_eq!(table.allocated(), 3);
        assert!(table.free_slots().is_empty());
        let live: Vec<_> = table.live_pairs().map(|(k, v)| (*k, *v)).collect();
        assert_eq!(live, vec![(10, 1), (20, 2), (30, 3)]);
    }

    #[test]
    fn test_free_list_excluded() {
        // Slots 2 and 4 released: head -> 4 -> 2 -> bump_index (6)
        let data = encode(
            6,
            6,
            4,
            &[(10, 1, 0), (20, 2, 6), (30, 3, 0), (40, 4, 2), (50, 5, 0)],
        );
        let table = decode(&data).unwrap();
        assert_eq!(table.free_slots().iter().copied().collect::<Vec<_>>(), vec![1, 3]);
        assert_eq!(table.live_len(), 6 - 1 - 2);
        let live: Vec<_> = table.iter_live().map(|(i, k, _)| (i, *k)).collect();
        assert_eq!(live, vec![(1, 10), (3, 30), (5, 50)]);

        let index = table.index_map();
        assert_eq!(index[&30], 3);
        assert!(!index.contains_key(&20));
        assert_eq!(table.into_live_pairs().len(), 3);
    }

    #[test]
    fn test_sentinel_head_means_empty_list() {
        let data = encode(2, 3, SENTINEL, &[(10, 1, 0), (20, 2, 0)]);
        let table = decode(&data).unwrap();
        assert_eq!(table.live_len(), 2);
    }

    #[test]
    fn test_uninitialized_region() {
        let data = encode(3, 0, 0, &[]);
        let table = decode(&data).unwrap();
        assert_eq!(table.allocated(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_free_list_cycle_rejected() {
        // 1 -> 2 -> 1 -> ...
        let data = encode(3, 3, 1, &[(10, 1, 2), (20, 2, 1)]);
        assert_eq!(decode(&data).unwrap_err(), DecodeError::FreeListCycle { bump_index: 3 });
    }

    #[test]
    fn test_negative_pointer_rejected() {
        let data = encode(3, 3, 1, &[(10, 1, -5), (20, 2, 0)]);
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::FreeListOutOfRange {
                pointer: -5,
                allocated: 2
            }
        );
    }

    #[test]
    fn test_bump_index_beyond_capacity() {
        let data = encode(2, 4, 4, &[(10, 1, 0), (20, 2, 0)]);
        assert_eq!(
            decode(&data).unwrap_err(),
            DecodeError::BumpIndexOutOfRange {
                bump_index: 4,
                capacity: 2
            }
        );
        let data = encode(2, -1, 0, &[]);
        assert!(matches!(decode(&data), Err(DecodeError::BumpIndexOutOfRange { .. })));
    }

    #[test]
    fn test_truncated_container_header() {
        let data = encode(1, 1, 1, &[]);
        assert!(matches!(decode(&data[..20]), Err(DecodeError::Truncated { .. })));
    }

    #[test]
    fn test_region_size() {
        assert_eq!(region_size(16, 32, 2), Some(32 + 64 * 2));
        assert_eq!(region_size(32, 96, 0), Some(32));
        assert_eq!(region_size(16, 32, u64::MAX), None);
    }
}
