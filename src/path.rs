//! Reconstructs the move sequence from the root to a goal node.
//!
//! The node store only remembers, per node, its parent and the `Step`
//! that produced it — walking from a goal node back to the root and
//! reversing gives the solution, but the stored `Step` only encodes
//! *where* the move ended up, not the exact frame cost, so each step is
//! replayed against the actual kernel to recover both the frame cost and
//! a sanity check that the store wasn't corrupted.

use crate::cache::Cache;
use crate::error::SearchError;
use crate::kernel::PuzzleState;
use crate::node::NodeRecord;
use crate::node_index::NodeIndex;
use crate::step::Step;
use crate::store::NodeStore;
use crate::swap::SwapDevice;

/// One replayed move in a reconstructed solution.
pub struct PathStep {
    pub step: Step,
    pub frame_cost: u32,
}

/// The full move sequence from the root to `goal`, in play order.
pub struct Path<S> {
    pub root_state: S,
    pub steps: Vec<PathStep>,
    pub total_frames: u32,
}

/// Walks `goal`'s parent chain back to the root, then replays it forward
/// through a fresh copy of the root state to recover per-step frame costs.
pub fn reconstruct<S, N, C, D>(
    store: &NodeStore<S, N, C, D>,
    goal: NodeIndex,
) -> Result<Path<S>, SearchError>
where
    S: PuzzleState,
    N: NodeRecord<S>,
    C: Cache<N, D>,
    D: SwapDevice<N>,
{
    let mut reversed = Vec::new();
    let mut cursor = goal;
    let mut root_state = None;
    while !cursor.is_nil() {
        let guard = store.get(cursor)?;
        let parent = guard.parent();
        let step = guard.step();
        if parent.is_nil() {
            root_state = Some(*guard.state());
        } else {
            reversed.push(step);
        }
        cursor = parent;
    }
    let placeholder_step = Step::encode(0, 0, 0, 0).expect("all-zero step always encodes");
    let root_state = root_state.ok_or(SearchError::IllegalReplay { node: goal, step: placeholder_step })?;
    reversed.reverse();

    let mut replay_state = root_state;
    let mut steps = Vec::with_capacity(reversed.len());
    let mut total_frames = 0u32;
    for step in reversed {
        let frame_cost = replay_state.replay_step(step)?;
        total_frames += frame_cost;
        steps.push(PathStep { step, frame_cost });
    }

    Ok(Path { root_state, steps, total_frames })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hashtable::HashTableCache;
    use crate::kernel::demo::{open_board, DemoState};
    use crate::node::NodeBfs;
    use crate::swap::RamSwap;

    type Store = NodeStore<DemoState, NodeBfs<DemoState>, HashTableCache<NodeBfs<DemoState>, RamSwap<NodeBfs<DemoState>>>, RamSwap<NodeBfs<DemoState>>>;

    #[test]
    fn reconstructs_a_two_move_path() {
        let device = RamSwap::open(16).unwrap();
        let store: Store = NodeStore::new(device, 16, 7, 16);

        let root_state = open_board();
        let root = store
            .lookup_or_insert(root_state, NodeIndex::NIL, Step::encode(0, 0, 0, 0).unwrap(), 0)
            .unwrap()
            .index;

        let first_move = root_state.legal_actions().into_iter().next().unwrap();
        let first_step = Step::encode(first_move.action, first_move.x, first_move.y, first_move.extra_steps).unwrap();
        let mid = store
            .lookup_or_insert(first_move.resulting_state, root, first_step, first_move.frame_cost)
            .unwrap()
            .index;

        let second_move = first_move.resulting_state.legal_actions().into_iter().next().unwrap();
        let second_step = Step::encode(second_move.action, second_move.x, second_move.y, second_move.extra_steps).unwrap();
        let goal = store
            .lookup_or_insert(second_move.resulting_state, mid, second_step, first_move.frame_cost + second_move.frame_cost)
            .unwrap()
            .index;

        let path = reconstruct(&store, goal).unwrap();
        assert_eq!(path.steps.len(), 2);
        assert_eq!(path.root_state, root_state);
        assert_eq!(path.total_frames, first_move.frame_cost + second_move.frame_cost);
    }
}
