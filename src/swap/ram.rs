//! RAM-backed swap device: no persistence, used by tests and as the
//! crate's zero-setup default.

use super::SwapDevice;
use crate::node_index::NodeIndex;
use bytemuck::Zeroable;
use parking_lot::RwLock;

pub struct RamSwap<T: bytemuck::Pod> {
    records: RwLock<Vec<T>>,
}

impl<T: bytemuck::Pod> SwapDevice<T> for RamSwap<T> {
    fn open(capacity: u32) -> std::io::Result<Self> {
        Ok(RamSwap { records: RwLock::new(vec![T::zeroed(); capacity as usize]) })
    }

    fn read(&self, index: NodeIndex, out: &mut T) -> std::io::Result<()> {
        *out = self.records.read()[index.as_usize()];
        Ok(())
    }

    fn write_once(&self, index: NodeIndex, value: &T) -> std::io::Result<()> {
        self.records.write()[index.as_usize()] = *value;
        Ok(())
    }

    fn capacity(&self) -> u32 {
        self.records.read().len() as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::demo::DemoState;
    use crate::node::{NodeBfs, NodeRecord};
    use crate::step::Step;

    #[test]
    fn write_then_read_roundtrips() {
        let dev: RamSwap<NodeBfs<DemoState>> = RamSwap::open(8).unwrap();
        let state = DemoState::new(1, 1, 0, 5, 5);
        let node = NodeBfs::new(state, NodeIndex::new(0), Step::encode(0, 1, 1, 0).unwrap(), 3);
        dev.write(NodeIndex::new(2), &node).unwrap();
        let mut out = NodeBfs::new(DemoState::new(0, 0, 0, 0, 0), NodeIndex::NIL, Step::encode(0,0,0,0).unwrap(), 0);
        dev.read(NodeIndex::new(2), &mut out).unwrap();
        assert_eq!(out.frame(), 3);
        assert_eq!(out.parent(), NodeIndex::new(0));
    }
}
