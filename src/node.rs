//! Persisted node records.
//!
//! Two layouts exist because the frontier representation differs between
//! search modes: storing the frontier's next pointer inside the node
//! record ties the record layout to the search mode, so BFS and DFS each
//! get their own. Both are `#[repr(C)]` + `bytemuck::Pod` so the swap
//! device can move them to/from disk as raw bytes with no serialization
//! step — a raw `memcpy` to/from the swap file's backing bytes.
//!
//! Field order within each struct is chosen to leave zero implicit
//! padding (grouped largest-alignment-first) — `bytemuck::Pod` forbids
//! padding bytes, since reading them would expose uninitialized memory.

use crate::node_index::NodeIndex;
use crate::step::Step;

/// Common read/write surface shared by both node layouts, so the node
/// store and path reconstructor don't need to know which search mode
/// produced a given record.
pub trait NodeRecord<S>: bytemuck::Pod + Send + Sync {
    fn new(state: S, parent: NodeIndex, step: Step, frame: u32) -> Self;
    fn state(&self) -> &S;
    fn parent(&self) -> NodeIndex;
    fn step(&self) -> Step;
    fn frame(&self) -> u32;
    fn set_parent_step_frame(&mut self, parent: NodeIndex, step: Step, frame: u32);
}

/// The BFS record: adds `next`, the intrusive link to the following node
/// in the same frame bucket.
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct NodeBfs<S: bytemuck::Pod + Send + Sync> {
    state: S,
    frame: u32,
    parent: NodeIndex,
    next: NodeIndex,
    step: Step,
    _pad: u16,
}

impl<S: bytemuck::Pod + Send + Sync> NodeBfs<S> {
    #[inline]
    pub fn next(&self) -> NodeIndex {
        self.next
    }

    #[inline]
    pub fn set_next(&mut self, next: NodeIndex) {
        self.next = next;
    }
}

impl<S: bytemuck::Pod + Send + Sync> NodeRecord<S> for NodeBfs<S> {
    fn new(state: S, parent: NodeIndex, step: Step, frame: u32) -> Self {
        NodeBfs { state, frame, parent, next: NodeIndex::NIL, step, _pad: 0 }
    }

    fn state(&self) -> &S {
        &self.state
    }

    fn parent(&self) -> NodeIndex {
        self.parent
    }

    fn step(&self) -> Step {
        self.step
    }

    fn frame(&self) -> u32 {
        self.frame
    }

    fn set_parent_step_frame(&mut self, parent: NodeIndex, step: Step, frame: u32) {
        self.parent = parent;
        self.step = step;
        self.frame = frame;
    }
}

/// The DFS record: no intrusive bucket link (DFS walks a stack, not frame
/// buckets), but `frame` doubles as the "best known frame" used for
/// re-expansion pruning.
#[derive(Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(C)]
pub struct NodeDfs<S: bytemuck::Pod + Send + Sync> {
    state: S,
    frame: u32,
    parent: NodeIndex,
    step: Step,
    _pad: [u8; 6],
}

impl<S: bytemuck::Pod + Send + Sync> NodeRecord<S> for NodeDfs<S> {
    fn new(state: S, parent: NodeIndex, step: Step, frame: u32) -> Self {
        NodeDfs { state, frame, parent, step, _pad: [0; 6] }
    }

    fn state(&self) -> &S {
        &self.state
    }

    fn parent(&self) -> NodeIndex {
        self.parent
    }

    fn step(&self) -> Step {
        self.step
    }

    fn frame(&self) -> u32 {
        self.frame
    }

    fn set_parent_step_frame(&mut self, parent: NodeIndex, step: Step, frame: u32) {
        self.parent = parent;
        self.step = step;
        self.frame = frame;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::demo::DemoState;

    static_assertions::assert_eq_size!(NodeBfs<DemoState>, [u8; 32]);
    static_assertions::assert_eq_size!(NodeDfs<DemoState>, [u8; 32]);

    #[test]
    fn bfs_record_roundtrip() {
        let s = DemoState::new(1, 2, 0, 5, 5);
        let step = Step::encode(0, 1, 2, 0).unwrap();
        let mut n = NodeBfs::new(s, NodeIndex::new(3), step, 7);
        assert_eq!(n.parent(), NodeIndex::new(3));
        assert_eq!(n.frame(), 7);
        assert!(n.next().is_nil());
        n.set_next(NodeIndex::new(9));
        assert_eq!(n.next(), NodeIndex::new(9));
    }
}
