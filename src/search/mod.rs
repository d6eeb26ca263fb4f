//! Search drivers: walk the state space outward from a root state,
//! populating the node store, until a goal is found or the search is
//! exhausted.
//!
//! BFS and DFS are different enough in their frontier representation
//! (frame-bucketed queue vs. a pruned stack) that they're two concrete
//! modules rather than one generic driver; both report through the same
//! `SearchOutcome` so callers don't need to know which ran.

pub mod bfs;
pub mod dfs;

use crate::node_index::NodeIndex;
use crate::stats::SearchStats;

pub enum SearchOutcome {
    Found { goal: NodeIndex, stats: SearchStats },
    Exhausted { stats: SearchStats },
    FrameBudgetExceeded { frames_searched: u32, stats: SearchStats },
    /// A caller-supplied shutdown flag (e.g. a SIGINT handler) was observed
    /// set between bucket drains / stack pops. Orderly shutdown: whatever
    /// was discovered so far is left in the node store for the caller to
    /// flush, but no solution is reported.
    ShutdownRequested { stats: SearchStats },
}
