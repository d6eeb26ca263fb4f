//! Error kinds returned by the search engine's public operations.
//!
//! Shaped the way `forest_db::errors::Error` is: one flat enum, `thiserror`
//! messages, `#[from]` for the one wrapped external error. Programming
//! errors (pin-discipline violations, the BFS frontier-rewrite invariant)
//! are *not* represented here — they use `assert!`/`debug_assert!` with a
//! diagnostic message, since they indicate store corruption rather than a
//! recoverable condition.

use crate::node_index::NodeIndex;
use crate::step::Step;

#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The node store's static capacity was exhausted. Fatal; reported
    /// with the `nodeCount` at the time of failure.
    #[error("node store full at {node_count} nodes")]
    CapacityExceeded { node_count: u32 },

    /// The swap device failed after one retry.
    #[error("swap device I/O error: {0}")]
    SwapIo(#[from] std::io::Error),

    /// Path reconstruction replayed a step the kernel rejected. Fatal;
    /// indicates store corruption.
    #[error("illegal replay of {step:?} at node {node:?}")]
    IllegalReplay { node: NodeIndex, step: Step },

    /// The search exhausted `maxFrames` (or the reachable state space)
    /// without finding a goal. A normal, expected outcome, not a crash.
    #[error("no solution found within {frames_searched} frames")]
    NotFound { frames_searched: u32 },

    /// CLI surface error (too many arguments, non-numeric budget, ...).
    #[error("bad arguments: {0}")]
    BadArguments(String),
}

pub type SearchResult<T> = Result<T, SearchError>;
