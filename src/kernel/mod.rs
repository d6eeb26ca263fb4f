//! The puzzle-kernel interface.
//!
//! This is the one external collaborator the engine is generic over: the
//! move legality, action execution, and frame-cost model of the actual
//! game are never the engine's concern. Everything downstream (node store,
//! cache, search drivers) is generic over `S: PuzzleState`.
//!
//! `kernel::demo` is a test/bench-only toy implementation (a walled grid
//! with a single player) so the engine has something concrete to search
//! without depending on a real puzzle kernel.

#[cfg(any(test, feature = "demo-kernel"))]
pub mod demo;

use crate::error::SearchError;
use crate::step::Step;
use smallvec::SmallVec;

/// One candidate expansion discovered by `PuzzleState::legal_actions`:
/// the active player moved to `(x, y)` via `action`, taking `extra_steps`
/// detour steps beyond the Manhattan-distance estimate, landing in
/// `resulting_state` at a cost of `frame_cost` frames.
#[derive(Clone)]
pub struct LegalMove<S> {
    pub action: u8,
    pub x: u8,
    pub y: u8,
    pub extra_steps: u8,
    pub frame_cost: u32,
    pub resulting_state: S,
}

/// Up to 8 legal moves are expected from a typical position; beyond that
/// `legal_actions` spills to the heap. Keeps expansion allocation-free on
/// the common path.
pub type LegalMoves<S> = SmallVec<[LegalMove<S>; 8]>;

/// The opaque, fixed-size puzzle position the search engine explores.
///
/// Bounded by `bytemuck::Pod` so the engine can copy, hash, and persist
/// `State` bytes without ever interpreting them — a fixed byte size known
/// at build time, with no pointers or heap-owned content.
pub trait PuzzleState: bytemuck::Pod + Eq + std::hash::Hash + Send + Sync {
    /// Frames charged per tile walked.
    const DELAY_MOVE: u32;

    /// Normalizes equivalent representations (e.g. canonical player
    /// ordering) prior to hashing/equality, so that two states reachable
    /// by different move orders but otherwise identical compare equal.
    fn canonicalize(&mut self);

    /// A 32-bit hash of the canonicalized state. Swapping this for a
    /// weaker hash must never change the set of discovered nodes — only
    /// performance.
    fn hash32(&self) -> u32;

    fn is_goal(&self) -> bool;

    /// Enumerates legal expansions from this state.
    fn legal_actions(&self) -> LegalMoves<Self>
    where
        Self: Sized;

    /// Applies `action` in place. Returns the positive number of frames
    /// added on success, or a non-positive value if the move is illegal.
    fn perform(&mut self, action: u8) -> i32;

    /// Re-derives the actual frame cost of a recorded `Step` by replaying
    /// it against this state, used during path reconstruction. Returns
    /// `IllegalReplay` if the kernel rejects the move — this indicates
    /// node-store corruption, since the step was recorded during a
    /// successful expansion.
    fn replay_step(&mut self, step: Step) -> Result<u32, SearchError>;
}
