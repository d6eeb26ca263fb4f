//! Per-thread search counters, merged at each BFS frame barrier (or at
//! DFS join) into a whole-run total.
//!
//! Kept as plain `u64` fields on a `Default`-able struct rather than
//! atomics: every worker owns one `ThreadStats` for the duration of its
//! run and only ever merges into the shared total at an explicit
//! synchronization point, so there's no concurrent-mutation hazard to
//! pay atomic-op overhead for. `hits`/`misses`/`reads`/`writes` are the
//! exception — the cache and node store are shared across every worker,
//! so those four are tallied with their own atomics inside
//! `cache::hashtable`/`cache::splay`/`store`, and copied into the final
//! `SearchStats` wholesale rather than merged frame-by-frame.

#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadStats {
    pub states_expanded: u64,
    pub states_generated: u64,
    pub duplicates_found: u64,
    pub hits: u64,
    pub misses: u64,
    pub reads: u64,
    pub writes: u64,
}

impl ThreadStats {
    pub fn merge(&mut self, other: &ThreadStats) {
        self.states_expanded += other.states_expanded;
        self.states_generated += other.states_generated;
        self.duplicates_found += other.duplicates_found;
        self.hits += other.hits;
        self.misses += other.misses;
        self.reads += other.reads;
        self.writes += other.writes;
    }
}

/// The run-wide total, accumulated by the coordinating thread as worker
/// stats come in.
#[derive(Debug, Default, Clone)]
pub struct SearchStats {
    pub total: ThreadStats,
    pub frames_searched: u32,
    pub peak_frontier_size: u64,
    /// Chain walks through a hash bucket that touched more than one node
    /// (`store::NodeStore::lookup_or_insert`'s bucket-chain walk).
    pub collisions: u64,
    /// Nodes expanded per BFS frame bucket, in frame order. Empty for DFS,
    /// which has no frame barrier to index by.
    pub nodes_expanded: Vec<u64>,
}

impl SearchStats {
    pub fn record_frame(&mut self, frontier_size: u64, frame_stats: &[ThreadStats]) {
        self.frames_searched += 1;
        self.peak_frontier_size = self.peak_frontier_size.max(frontier_size);
        let mut expanded_this_frame = 0u64;
        for s in frame_stats {
            self.total.merge(s);
            expanded_this_frame += s.states_expanded;
        }
        self.nodes_expanded.push(expanded_this_frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_sums_every_field() {
        let mut total = ThreadStats::default();
        let a = ThreadStats { states_expanded: 3, states_generated: 10, duplicates_found: 2, hits: 5, misses: 1, reads: 1, writes: 0 };
        let b = ThreadStats { states_expanded: 1, states_generated: 4, duplicates_found: 0, hits: 2, misses: 3, reads: 3, writes: 1 };
        total.merge(&a);
        total.merge(&b);
        assert_eq!(total.states_expanded, 4);
        assert_eq!(total.states_generated, 14);
        assert_eq!(total.misses, 4);
        assert_eq!(total.reads, 4);
        assert_eq!(total.writes, 1);
    }

    #[test]
    fn record_frame_tracks_peak_frontier_and_expansion_histogram() {
        let mut stats = SearchStats::default();
        stats.record_frame(10, &[ThreadStats { states_expanded: 7, ..Default::default() }]);
        stats.record_frame(3, &[ThreadStats { states_expanded: 2, ..Default::default() }]);
        assert_eq!(stats.peak_frontier_size, 10);
        assert_eq!(stats.frames_searched, 2);
        assert_eq!(stats.nodes_expanded, vec![7, 2]);
    }
}
