//! The node store: canonicalizes, deduplicates, and persists every state
//! the search touches, handing back a dense `NodeIndex` for it.
//!
//! Deduplication is a hash table of its own, independent of the record
//! cache above it: `buckets[hash32(state) % buckets.len()]` holds the
//! head `NodeIndex` of a singly-linked chain of same-bucket nodes. The
//! chain links are a flat, capacity-sized `AtomicU32` array owned by the
//! store rather than a field inside the node record — this keeps
//! `NodeBfs`/`NodeDfs` exactly the size the search driver needs (the BFS
//! frontier's `next` is a different link, over a different partition:
//! frame buckets, not hash buckets) at the cost of one small RAM-resident
//! array sized to `capacity`. Insertion hashes, walks the bucket chain
//! comparing states, and only allocates + links a fresh node if no match
//! was found — all while holding that one bucket's lock, so two threads
//! racing to insert the same state never both win.
//!
//! Node indices are handed out from one atomic counter shared by every
//! partition; a partition only ever decides whether *its own* bucket
//! needs a new index, never contends on the counter itself beyond the
//! single `fetch_add`.

use crate::cache::{Cache, CacheStats};
use crate::error::SearchError;
use crate::kernel::PuzzleState;
use crate::node::NodeRecord;
use crate::node_index::NodeIndex;
use crate::step::Step;
use crate::swap::SwapDevice;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};

/// One partition's lock guards both the bucket head and every chain walk
/// through it, so a lookup-or-insert on a given state is atomic with
/// respect to other threads hashing into the same bucket.
struct Bucket {
    head: Mutex<NodeIndex>,
}

pub struct NodeStore<S, N, C, D>
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    cache: C,
    buckets: Vec<Bucket>,
    /// `chain_next[i]` is the hash-bucket successor of node `i + 1`
    /// (index `0` is unused since `NodeIndex` reserves `0` for `NIL`).
    chain_next: Vec<AtomicU32>,
    node_count: AtomicU32,
    capacity: u32,
    collisions: AtomicU64,
    _marker: std::marker::PhantomData<(S, N, D)>,
}

/// What `lookup_or_insert` tells the caller about the state it was given.
pub struct LookupResult {
    pub index: NodeIndex,
    /// `true` if this call allocated a new node; `false` if the state was
    /// already present and `index` names the existing node.
    pub fresh: bool,
}

impl<S, N, C, D> NodeStore<S, N, C, D>
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    /// `bucket_count` should be a prime or power-of-two comfortably larger
    /// than the expected node count; too few buckets turns every insert
    /// into a long chain walk under one partition's lock.
    pub fn new(device: D, cache_capacity: usize, bucket_count: usize, capacity: u32) -> Self {
        let mut buckets = Vec::with_capacity(bucket_count.max(1));
        for _ in 0..bucket_count.max(1) {
            buckets.push(Bucket { head: Mutex::new(NodeIndex::NIL) });
        }
        let mut chain_next = Vec::with_capacity(capacity as usize + 1);
        chain_next.resize_with(capacity as usize + 1, || AtomicU32::new(0));
        NodeStore {
            cache: C::new(device, cache_capacity),
            buckets,
            chain_next,
            node_count: AtomicU32::new(0),
            capacity,
            collisions: AtomicU64::new(0),
            _marker: std::marker::PhantomData,
        }
    }

    fn chain_next_of(&self, index: NodeIndex) -> NodeIndex {
        NodeIndex::new(self.chain_next[index.as_usize()].load(Ordering::Relaxed))
    }

    fn set_chain_next(&self, index: NodeIndex, next: NodeIndex) {
        self.chain_next[index.as_usize()].store(next.as_u32(), Ordering::Relaxed);
    }

    /// Finds an existing node equal to `state`, or allocates a fresh one
    /// recording `parent`/`step`/`frame`. Canonicalizes `state` first, so
    /// callers never need to call `PuzzleState::canonicalize` themselves.
    pub fn lookup_or_insert(
        &self,
        mut state: S,
        parent: NodeIndex,
        step: Step,
        frame: u32,
    ) -> Result<LookupResult, SearchError> {
        state.canonicalize();
        let hash = state.hash32() as usize;
        let bucket = &self.buckets[hash % self.buckets.len()];
        let mut head = bucket.head.lock();

        let mut cursor = *head;
        let mut chain_length = 0u64;
        while !cursor.is_nil() {
            chain_length += 1;
            let guard = self.cache.get(cursor).map_err(SearchError::SwapIo)?;
            if *guard.state() == state {
                if chain_length > 1 {
                    self.collisions.fetch_add(chain_length - 1, Ordering::Relaxed);
                }
                return Ok(LookupResult { index: cursor, fresh: false });
            }
            cursor = self.chain_next_of(cursor);
        }
        if chain_length > 1 {
            self.collisions.fetch_add(chain_length - 1, Ordering::Relaxed);
        }

        let next_count = self.node_count.fetch_add(1, Ordering::Relaxed) + 1;
        if next_count >= self.capacity {
            self.node_count.fetch_sub(1, Ordering::Relaxed);
            return Err(SearchError::CapacityExceeded { node_count: next_count });
        }
        let index = NodeIndex::new(next_count);

        let record = N::new(state, parent, step, frame);
        {
            let mut guard = self.cache.get_mut(index).map_err(SearchError::SwapIo)?;
            *guard = record;
        }
        self.set_chain_next(index, *head);
        *head = index;

        Ok(LookupResult { index, fresh: true })
    }

    pub fn get(&self, index: NodeIndex) -> Result<crate::cache::CacheGuard<'_, N>, SearchError> {
        self.cache.get(index).map_err(SearchError::SwapIo)
    }

    /// Rewrites `index`'s parent/step/frame if `frame` improves on the
    /// node's currently recorded frame, for DFS's best-known-frame
    /// pruning. Returns whether an improvement was made. The peek-then-
    /// write isn't atomic across the two cache accesses, so two threads
    /// racing to improve the same node can both write — harmless, since
    /// either write is a valid (if not optimal) predecessor.
    pub fn try_improve(&self, index: NodeIndex, parent: NodeIndex, step: Step, frame: u32) -> Result<bool, SearchError> {
        let current = self.cache.get(index).map_err(SearchError::SwapIo)?.frame();
        if frame >= current {
            return Ok(false);
        }
        let mut guard = self.cache.get_mut(index).map_err(SearchError::SwapIo)?;
        guard.set_parent_step_frame(parent, step, frame);
        Ok(true)
    }

    pub fn flush(&self) -> Result<(), SearchError> {
        self.cache.flush_all().map_err(SearchError::SwapIo)
    }

    /// Writes every allocated node, in index order starting at `1`, to
    /// `path` as a raw concatenation of `bytemuck::bytes_of(&node)` —
    /// byte-for-byte the same layout as the original's `dumpNodesToDisk()`.
    /// Flushes the cache first so a dirty, unflushed record isn't silently
    /// skipped.
    pub fn dump_nodes(&self, path: impl AsRef<std::path::Path>) -> Result<(), SearchError> {
        self.flush()?;
        let mut out = std::io::BufWriter::new(std::fs::File::create(path).map_err(SearchError::SwapIo)?);
        for raw in 1..=self.node_count() {
            let guard = self.cache.get(NodeIndex::new(raw)).map_err(SearchError::SwapIo)?;
            std::io::Write::write_all(&mut out, bytemuck::bytes_of(&*guard)).map_err(SearchError::SwapIo)?;
        }
        std::io::Write::flush(&mut out).map_err(SearchError::SwapIo)?;
        Ok(())
    }

    pub fn node_count(&self) -> u32 {
        self.node_count.load(Ordering::Relaxed)
    }

    pub fn capacity(&self) -> u32 {
        self.capacity
    }

    /// The underlying cache's lifetime hit/miss/read/write counters.
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Hash-bucket chain walks that touched more than one node, summed
    /// across every `lookup_or_insert` call so far.
    pub fn collisions(&self) -> u64 {
        self.collisions.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hashtable::HashTableCache;
    use crate::kernel::demo::{open_board, DemoState};
    use crate::node::NodeBfs;
    use crate::swap::RamSwap;

    type Store = NodeStore<DemoState, NodeBfs<DemoState>, HashTableCache<NodeBfs<DemoState>, RamSwap<NodeBfs<DemoState>>>, RamSwap<NodeBfs<DemoState>>>;

    fn new_store(capacity: u32) -> Store {
        let device = RamSwap::open(capacity).unwrap();
        NodeStore::new(device, capacity as usize, 17, capacity)
    }

    #[test]
    fn inserting_the_same_state_twice_is_idempotent() {
        let store = new_store(64);
        let step = Step::encode(0, 1, 1, 0).unwrap();
        let first = store.lookup_or_insert(open_board(), NodeIndex::NIL, step, 0).unwrap();
        let second = store.lookup_or_insert(open_board(), NodeIndex::NIL, step, 0).unwrap();
        assert!(first.fresh);
        assert!(!second.fresh);
        assert_eq!(first.index, second.index);
        assert_eq!(store.node_count(), 1);
    }

    #[test]
    fn distinct_states_get_distinct_indices() {
        let store = new_store(64);
        let step = Step::encode(0, 1, 1, 0).unwrap();
        let mut other = open_board();
        other.x = 3;
        other.y = 3;
        let a = store.lookup_or_insert(open_board(), NodeIndex::NIL, step, 0).unwrap();
        let b = store.lookup_or_insert(other, NodeIndex::NIL, step, 0).unwrap();
        assert_ne!(a.index, b.index);
        assert_eq!(store.node_count(), 2);
    }

    #[test]
    fn capacity_exceeded_reports_node_count() {
        let store = new_store(3);
        let step = Step::encode(0, 1, 1, 0).unwrap();
        for i in 0..2u8 {
            let mut s = open_board();
            s.x = i;
            store.lookup_or_insert(s, NodeIndex::NIL, step, 0).unwrap();
        }
        let mut s = open_board();
        s.x = 5;
        let err = store.lookup_or_insert(s, NodeIndex::NIL, step, 0).unwrap_err();
        assert!(matches!(err, SearchError::CapacityExceeded { .. }));
    }

    #[test]
    fn a_single_bucket_forces_every_distinct_insert_to_collide() {
        let device = RamSwap::open(64).unwrap();
        let store: Store = NodeStore::new(device, 64, 1, 64);
        let step = Step::encode(0, 1, 1, 0).unwrap();
        for i in 0..4u8 {
            let mut s = open_board();
            s.x = i;
            store.lookup_or_insert(s, NodeIndex::NIL, step, 0).unwrap();
        }
        assert!(store.collisions() > 0);
    }

    #[test]
    fn dump_nodes_writes_one_record_per_allocated_node() {
        let store = new_store(64);
        let step = Step::encode(0, 1, 1, 0).unwrap();
        for i in 0..5u8 {
            let mut s = open_board();
            s.x = i;
            store.lookup_or_insert(s, NodeIndex::NIL, step, 0).unwrap();
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nodes-1.bin");
        store.dump_nodes(&path).unwrap();

        let bytes = std::fs::read(&path).unwrap();
        let record_size = std::mem::size_of::<NodeBfs<DemoState>>();
        assert_eq!(bytes.len(), record_size * store.node_count() as usize);
    }
}
