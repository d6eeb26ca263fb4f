//! The hash-table cache policy.
//!
//! A real `FxHashMap<NodeIndex, CacheSlot<T>>` (`fxhash`, used elsewhere
//! for state hashing too) holds every resident slot, with a `VecDeque` of
//! indices tracking recency for eviction. `chain_trim` bounds how many
//! least-recently-used candidates eviction will scan before giving up —
//! the part of "worst-case eviction cost bounded" that still matters once
//! the lookup itself is an O(1) hash map rather than a chained bucket
//! array.

use super::{Cache, CacheGuard, CacheGuardMut, CacheSlot, CacheStats, ReleaseSink};
use crate::node_index::NodeIndex;
use crate::swap::SwapDevice;
use bytemuck::Zeroable;
use fxhash::FxHashMap;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

pub struct HashTableCache<T: bytemuck::Pod, D: SwapDevice<T>> {
    device: D,
    capacity: usize,
    chain_trim: usize,
    inner: Mutex<Inner<T>>,
    hits: AtomicU64,
    misses: AtomicU64,
    reads: AtomicU64,
    writes: AtomicU64,
}

struct Inner<T> {
    slots: FxHashMap<NodeIndex, CacheSlot<T>>,
    /// Most-recently-used at the front.
    recency: VecDeque<NodeIndex>,
}

impl<T: bytemuck::Pod, D: SwapDevice<T>> HashTableCache<T, D> {
    pub fn with_tuning(device: D, capacity: usize, chain_trim: usize) -> Self {
        assert!((1..=16).contains(&chain_trim), "chain trim must be in [1,16]");
        HashTableCache {
            device,
            capacity,
            chain_trim,
            inner: Mutex::new(Inner {
                slots: FxHashMap::default(),
                recency: VecDeque::new(),
            }),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            reads: AtomicU64::new(0),
            writes: AtomicU64::new(0),
        }
    }

    fn touch(inner: &mut Inner<T>, index: NodeIndex) {
        inner.recency.retain(|&i| i != index);
        inner.recency.push_front(index);
    }

    /// Evicts the least-recently-used unpinned, non-dirty-or-flushed slot
    /// to make room. Scans at most `chain_trim` candidates from the tail
    /// before falling back to a full scan.
    fn evict_one(&self, inner: &mut Inner<T>) -> std::io::Result<()> {
        let mut scanned = 0;
        let mut victim = None;
        for &index in inner.recency.iter().rev() {
            if scanned >= self.chain_trim {
                break;
            }
            scanned += 1;
            if let Some(slot) = inner.slots.get(&index) {
                if slot.pins == 0 {
                    victim = Some(index);
                    break;
                }
            }
        }
        // Fall back to scanning the whole recency list if nothing unpinned
        // turned up within the trimmed window — better to pay the extra
        // scan than to spuriously fail an insert.
        let victim = match victim {
            Some(v) => v,
            None => inner
                .recency
                .iter()
                .rev()
                .find(|&&index| inner.slots.get(&index).map(|s| s.pins == 0).unwrap_or(false))
                .copied(),
        };
        if let Some(index) = victim {
            if let Some(slot) = inner.slots.remove(&index) {
                if slot.dirty {
                    self.device.write(index, &slot.data)?;
                    self.writes.fetch_add(1, Ordering::Relaxed);
                }
            }
            inner.recency.retain(|&i| i != index);
        }
        Ok(())
    }

    fn load_miss(&self, inner: &mut Inner<T>, index: NodeIndex) -> std::io::Result<()> {
        if inner.slots.len() >= self.capacity {
            self.evict_one(inner)?;
        }
        let mut data = T::zeroed();
        self.device.read(index, &mut data)?;
        self.reads.fetch_add(1, Ordering::Relaxed);
        self.misses.fetch_add(1, Ordering::Relaxed);
        inner.slots.insert(index, CacheSlot { data, dirty: false, pins: 0 });
        Self::touch(inner, index);
        Ok(())
    }
}

impl<T: bytemuck::Pod, D: SwapDevice<T>> ReleaseSink<T> for HashTableCache<T, D> {
    fn release_read(&self, index: NodeIndex) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.slots.get_mut(&index) {
            slot.pins = slot.pins.saturating_sub(1);
        }
    }

    fn release_write(&self, index: NodeIndex, value: T) {
        let mut inner = self.inner.lock();
        if let Some(slot) = inner.slots.get_mut(&index) {
            slot.data = value;
            slot.dirty = true;
            slot.pins = slot.pins.saturating_sub(1);
        }
    }
}

impl<T: bytemuck::Pod, D: SwapDevice<T>> Cache<T, D> for HashTableCache<T, D> {
    fn new(device: D, capacity: usize) -> Self {
        Self::with_tuning(device, capacity, 8)
    }

    fn get(&self, index: NodeIndex) -> std::io::Result<CacheGuard<'_, T>> {
        let mut inner = self.inner.lock();
        if inner.slots.contains_key(&index) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.load_miss(&mut inner, index)?;
        }
        Self::touch(&mut inner, index);
        let slot = inner.slots.get_mut(&index).expect("just inserted");
        slot.pins += 1;
        let value = slot.data;
        Ok(CacheGuard { index, value, sink: self })
    }

    fn get_mut(&self, index: NodeIndex) -> std::io::Result<CacheGuardMut<'_, T>> {
        let mut inner = self.inner.lock();
        if inner.slots.contains_key(&index) {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.load_miss(&mut inner, index)?;
        }
        Self::touch(&mut inner, index);
        let slot = inner.slots.get_mut(&index).expect("just inserted");
        slot.pins += 1;
        let value = slot.data;
        Ok(CacheGuardMut { index, value, sink: self })
    }

    fn flush_all(&self) -> std::io::Result<()> {
        let mut inner = self.inner.lock();
        for (&index, slot) in inner.slots.iter_mut() {
            if slot.dirty {
                self.device.write(index, &slot.data)?;
                self.writes.fetch_add(1, Ordering::Relaxed);
                slot.dirty = false;
            }
        }
        Ok(())
    }

    fn device(&self) -> &D {
        &self.device
    }

    fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
        }
    }
}
