//! Breadth-first search: expands the frontier one frame number at a time,
//! so the first node found to satisfy the goal predicate is reachable in
//! the fewest frames.
//!
//! The frontier is a `BTreeMap<u32, Vec<NodeIndex>>` keyed by absolute
//! frame number rather than a plain FIFO queue, since a single move can
//! cost more than one frame (`extra_steps`) — a node discovered from the
//! current frame can land several frame numbers ahead, not just the next
//! one. Each frame's bucket is drained and handed to a fixed thread pool;
//! workers only ever read already-inserted nodes and insert new ones, so
//! the barrier between frames is just "wait for this frame's threads to
//! finish" — there is no cross-thread mutable state besides the frontier
//! map and the node store itself, both already safe for concurrent use.
//!
//! Because frames are processed in non-decreasing order, the first
//! insertion of any given state is already at its minimum frame number —
//! a later discovery of the same state should never improve on it. The
//! rewrite path (`NodeStore::try_improve`, used for real by DFS) is still
//! wired into the duplicate branch here, guarded by a `debug_assert!`, so
//! a violation of that ordering would be caught rather than silently
//! leaving a stale frame on the node.

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
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Copies the node store's shared hit/miss/read/write/collision counters
/// into `stats`, overwriting rather than merging — unlike the per-thread
/// counters, these already live cumulatively on the store/cache and would
/// double-count if merged frame over frame.
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

/// Runs BFS to completion, with no shutdown flag to poll. Equivalent to
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

/// As [`run`], but polls `shutdown` (when given) between frame barriers,
/// so a SIGINT handler's "orderly shutdown" flag is observed there.
/// Registering the actual signal handler is left to the binary embedding
/// this engine; the driver only promises to notice the flag and stop
/// cleanly.
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

    let frontier: Mutex<BTreeMap<u32, Vec<NodeIndex>>> = Mutex::new(BTreeMap::new());
    frontier.lock().insert(0, vec![root_result.index]);

    loop {
        if shutdown.is_some_and(|flag| flag.load(Ordering::Relaxed)) {
            finalize_stats(store, &mut stats);
            return Ok(SearchOutcome::ShutdownRequested { stats });
        }

        let (current_frame, ids) = {
            let mut guard = frontier.lock();
            match guard.iter().next().map(|(&f, _)| f) {
                Some(f) => (f, guard.remove(&f).unwrap()),
                None => {
                    finalize_stats(store, &mut stats);
                    return Ok(SearchOutcome::Exhausted { stats });
                }
            }
        };

        if let Some(limit) = max_frames {
            if current_frame > limit {
                finalize_stats(store, &mut stats);
                return Ok(SearchOutcome::FrameBudgetExceeded { frames_searched: current_frame, stats });
            }
        }

        let found = AtomicU32::new(NodeIndex::NIL.as_u32());
        let chunk_size = ids.len().div_ceil(thread_count).max(1);

        let thread_stats: Vec<ThreadStats> = crossbeam_utils::thread::scope(|scope| {
            let mut handles = Vec::new();
            for chunk in ids.chunks(chunk_size) {
                let found = &found;
                let frontier = &frontier;
                handles.push(scope.spawn(move |_| -> Result<ThreadStats, SearchError> {
                    let mut local = ThreadStats::default();
                    for &id in chunk {
                        if found.load(Ordering::Relaxed) != NodeIndex::NIL.as_u32() {
                            break;
                        }
                        let state = {
                            let guard = store.get(id)?;
                            *guard.state()
                        };
                        // Goal test happens here, on the node as it's drained
                        // from its frame bucket — not when it's generated as
                        // a successor. Frame costs aren't uniform
                        // (`extra_steps`/`DELAY_MOVE`), so a node generated
                        // later in this same frame's expansion can still be
                        // cheaper than one generated earlier but landing in a
                        // later bucket; only testing at drain time guarantees
                        // the first goal found is frame-optimal.
                        if state.is_goal() {
                            found.store(id.as_u32(), Ordering::Relaxed);
                            continue;
                        }
                        local.states_expanded += 1;
                        for mv in state.legal_actions() {
                            let Some(step) = Step::encode(mv.action, mv.x, mv.y, mv.extra_steps) else {
                                continue;
                            };
                            let Some(child_frame) = current_frame.checked_add(mv.frame_cost) else {
                                continue;
                            };
                            debug_assert!(child_frame >= current_frame, "move costs must be non-negative");

                            let result = store.lookup_or_insert(mv.resulting_state, id, step, child_frame)?;
                            local.states_generated += 1;
                            if result.fresh {
                                frontier.lock().entry(child_frame).or_default().push(result.index);
                            } else {
                                local.duplicates_found += 1;
                                // Frame order guarantees the first insertion of any
                                // state is already at its minimum frame, so a rewrite
                                // should never fire here; wired in (rather than
                                // omitted) so a violation of that ordering surfaces
                                // loudly instead of silently leaving a stale frame.
                                let improved = store.try_improve(result.index, id, step, child_frame)?;
                                debug_assert!(!improved, "BFS found a frame improvement for an already-visited node");
                            }
                        }
                    }
                    Ok(local)
                }));
            }
            handles.into_iter().map(|h| h.join().unwrap()).collect::<Result<Vec<_>, _>>()
        })
        .unwrap()?;

        stats.record_frame(ids.len() as u64, &thread_stats);

        let found = found.load(Ordering::Relaxed);
        if found != NodeIndex::NIL.as_u32() {
            finalize_stats(store, &mut stats);
            return Ok(SearchOutcome::Found { goal: NodeIndex::new(found), stats });
        }
    }
}
