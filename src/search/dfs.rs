//! Depth-first search: walks a pruned stack rather than a frame-bucketed
//! frontier, trading breadth-first's shortest-path guarantee for a much
//! smaller live frontier at any instant — useful when the reachable state
//! space is too wide for BFS's node store to hold all at once.
//!
//! Parallelism is coarse-grained: the root's direct children are
//! distributed once across the thread pool, and each thread then owns an
//! independent stack for its share of the tree. Threads only ever
//! synchronize through the node store itself (`lookup_or_insert` /
//! `try_improve`), never through a shared frontier structure, so there's
//! no frame barrier to wait on — a thread that runs out of work before
//! the others simply finishes early rather than idling at a barrier.
//!
//! Because DFS has no frame-order guarantee, a state can be rediscovered
//! later via a cheaper path than the one that first inserted it;
//! `NodeStore::try_improve` lets a thread rewrite a node's
//! parent/step/frame when it finds a strictly better frame count, which
//! is the pruning half of "best-known-frame pruning" — the other half is
//! skipping expansion of a node whose current best frame already exceeds
//! the frame budget.

use crate::cache::Cache;
use crate::error::SearchError;
use crate::kernel::PuzzleState;
use crate::node::NodeRecord;
use crate::node_index::NodeIndex;
use crate::search::SearchOutcome;
use crate::stats::{SearchStats, ThreadStats};
use crate::step::Step;
use crate::store::NodeStore;
use crate::swap::SwapDevice;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Copies the node store's shared hit/miss/read/write/collision counters
/// into `stats`, overwriting rather than merging — these already
/// accumulate cumulatively on the store/cache, unlike the per-thread
/// expansion counters.
fn finalize_stats<S, N, C, D>(store: &NodeStore<S, N, C, D>, stats: &mut SearchStats)
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    let cache_stats = store.cache_stats();
    stats.total.hits = cache_stats.hits;
    stats.total.misses = cache_stats.misses;
    stats.total.reads = cache_stats.reads;
    stats.total.writes = cache_stats.writes;
    stats.collisions = store.collisions();
}

/// Runs DFS to completion, with no shutdown flag to poll. Equivalent to
/// `run_cancellable(store, root, thread_count, max_frames, None)`.
pub fn run<S, N, C, D>(
    store: &NodeStore<S, N, C, D>,
    root: S,
    thread_count: usize,
    max_frames: Option<u32>,
) -> Result<SearchOutcome, SearchError>
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    run_cancellable(store, root, thread_count, max_frames, None)
}

/// As [`run`], but polls `shutdown` (when given) before each stack pop —
/// DFS has no frame barrier, so this is the nearest equivalent suspension
/// point to BFS's "between bucket drains" check.
pub fn run_cancellable<S, N, C, D>(
    store: &NodeStore<S, N, C, D>,
    root: S,
    thread_count: usize,
    max_frames: Option<u32>,
    shutdown: Option<&AtomicBool>,
) -> Result<SearchOutcome, SearchError>
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    let thread_count = thread_count.max(1);
    let mut stats = SearchStats::default();

    let root_step = Step::encode(0, 0, 0, 0).expect("all-zero step always encodes");
    let root_result = store.lookup_or_insert(root, NodeIndex::NIL, root_step, 0)?;
    if root.is_goal() {
        finalize_stats(store, &mut stats);
        return Ok(SearchOutcome::Found { goal: root_result.index, stats });
    }

    let mut seed_stacks: Vec<Vec<(NodeIndex, S, u32)>> = (0..thread_count).map(|_| Vec::new()).collect();
    let mut next_worker = 0;
    let mut seed_stats = ThreadStats::default();
    for mv in root.legal_actions() {
        let Some(step) = Step::encode(mv.action, mv.x, mv.y, mv.extra_steps) else { continue };
        let result = store.lookup_or_insert(mv.resulting_state, root_result.index, step, mv.frame_cost)?;
        seed_stats.states_generated += 1;
        if result.fresh {
            if mv.resulting_state.is_goal() {
                stats.total.merge(&seed_stats);
                finalize_stats(store, &mut stats);
                return Ok(SearchOutcome::Found { goal: result.index, stats });
            }
            seed_stacks[next_worker].push((result.index, mv.resulting_state, mv.frame_cost));
            next_worker = (next_worker + 1) % thread_count;
        } else {
            seed_stats.duplicates_found += 1;
        }
    }
    seed_stats.states_expanded += 1;
    stats.total.merge(&seed_stats);

    let found = AtomicU32::new(NodeIndex::NIL.as_u32());
    let shutdown_seen = AtomicBool::new(false);

    let thread_stats: Vec<ThreadStats> = crossbeam_utils::thread::scope(|scope| {
        let mut handles = Vec::new();
        for seed in seed_stacks {
            let found = &found;
            let shutdown_seen = &shutdown_seen;
            handles.push(scope.spawn(move |_| -> Result<ThreadStats, SearchError> {
                let mut local = ThreadStats::default();
                let mut work = seed;
                while let Some((id, state, frame)) = work.pop() {
                    if found.load(Ordering::Relaxed) != NodeIndex::NIL.as_u32() {
                        break;
                    }
                    if shutdown.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
                        shutdown_seen.store(true, Ordering::Relaxed);
                        break;
                    }
                    if let Some(limit) = max_frames {
                        if frame > limit {
                            continue;
                        }
                    }
                    local.states_expanded += 1;
                    for mv in state.legal_actions() {
                        let Some(step) = Step::encode(mv.action, mv.x, mv.y, mv.extra_steps) else {
                            continue;
                        };
                        let child_frame = frame + mv.frame_cost;
                        let result = store.lookup_or_insert(mv.resulting_state, id, step, child_frame)?;
                        local.states_generated += 1;
                        if result.fresh {
                            if mv.resulting_state.is_goal() {
                                found.store(result.index.as_u32(), Ordering::Relaxed);
                                break;
                            }
                            work.push((result.index, mv.resulting_state, child_frame));
                        } else {
                            local.duplicates_found += 1;
                            store.try_improve(result.index, id, step, child_frame)?;
                        }
                    }
                }
                Ok(local)
            }));
        }
        handles.into_iter().map(|h| h.join().unwrap()).collect::<Result<Vec<_>, _>>()
    })
    .unwrap()?;

    for s in &thread_stats {
        stats.total.merge(s);
    }
    finalize_stats(store, &mut stats);

    let found = found.load(Ordering::Relaxed);
    if found != NodeIndex::NIL.as_u32() {
        Ok(SearchOutcome::Found { goal: NodeIndex::new(found), stats })
    } else if shutdown_seen.load(Ordering::Relaxed) {
        Ok(SearchOutcome::ShutdownRequested { stats })
    } else {
        Ok(SearchOutcome::Exhausted { stats })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::splay::SplayCache;
    use crate::kernel::demo::{one_move_board, open_board, solved_board, walled_in_board, DemoState};
    use crate::node::NodeDfs;
    use crate::path;
    use crate::swap::RamSwap;

    type Store = NodeStore<DemoState, NodeDfs<DemoState>, SplayCache<NodeDfs<DemoState>, RamSwap<NodeDfs<DemoState>>>, RamSwap<NodeDfs<DemoState>>>;

    fn new_store(capacity: u32) -> Store {
        let device = RamSwap::open(capacity).unwrap();
        NodeStore::new(device, capacity as usize, 257, capacity)
    }

    #[test]
    fn trivial_puzzle_solves_at_the_root() {
        let store = new_store(64);
        let outcome = run(&store, solved_board(), 1, None).unwrap();
        assert!(matches!(outcome, SearchOutcome::Found { .. }));
    }

    #[test]
    fn one_move_puzzle_finds_a_goal() {
        let store = new_store(64);
        match run(&store, one_move_board(), 2, None).unwrap() {
            SearchOutcome::Found { goal, .. } => {
                let path = path::reconstruct(&store, goal).unwrap();
                assert_eq!(path.steps.len(), 1);
            }
            _ => panic!("expected a solution"),
        }
    }

    #[test]
    fn walled_in_board_is_exhausted() {
        let store = new_store(64);
        let outcome = run(&store, walled_in_board(), 2, None).unwrap();
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
    }

    #[test]
    fn open_board_is_solved_with_multiple_worker_threads() {
        let store = new_store(4096);
        let outcome = run(&store, open_board(), 4, None).unwrap();
        assert!(matches!(outcome, SearchOutcome::Found { .. }));
    }

    #[test]
    fn a_shutdown_flag_set_before_the_search_starts_halts_it() {
        let store = new_store(4096);
        let shutdown = AtomicBool::new(true);
        let outcome = run_cancellable(&store, open_board(), 2, None, Some(&shutdown)).unwrap();
        assert!(matches!(outcome, SearchOutcome::ShutdownRequested { .. }));
    }
}
