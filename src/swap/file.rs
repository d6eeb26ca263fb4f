//! Direct-file-I/O swap device. One fixed-size record per index;
//! positioned reads and writes (`pread`/`pwrite`) let distinct indices
//! proceed concurrently without a shared cursor, so concurrent read/write
//! on distinct indices is safe by construction.

use super::SwapDevice;
use crate::node_index::NodeIndex;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::FileExt;
use std::path::{Path, PathBuf};

pub struct FileSwap<T: bytemuck::Pod> {
    file: File,
    capacity: u32,
    path: PathBuf,
    _marker: std::marker::PhantomData<T>,
}

impl<T: bytemuck::Pod> FileSwap<T> {
    pub fn open_at(path: impl AsRef<Path>, capacity: u32) -> io::Result<Self> {
        let record_size = std::mem::size_of::<T>() as u64;
        let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        file.set_len(record_size * u64::from(capacity))?;
        Ok(FileSwap { file, capacity, path: path.as_ref().to_path_buf(), _marker: std::marker::PhantomData })
    }

    fn offset(&self, index: NodeIndex) -> u64 {
        std::mem::size_of::<T>() as u64 * u64::from(index.as_u32())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: bytemuck::Pod> SwapDevice<T> for FileSwap<T> {
    fn open(capacity: u32) -> io::Result<Self> {
        let path = std::env::temp_dir().join(format!("kwirk-swap-{}.bin", std::process::id()));
        Self::open_at(path, capacity)
    }

    fn read(&self, index: NodeIndex, out: &mut T) -> io::Result<()> {
        let bytes = bytemuck::bytes_of_mut(out);
        self.file.read_exact_at(bytes, self.offset(index))
    }

    fn write_once(&self, index: NodeIndex, value: &T) -> io::Result<()> {
        let bytes = bytemuck::bytes_of(value);
        self.file.write_all_at(bytes, self.offset(index))
    }

    fn capacity(&self) -> u32 {
        self.capacity
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
        let dir = tempfile::tempdir().unwrap();
        let dev: FileSwap<NodeBfs<DemoState>> =
            FileSwap::open_at(dir.path().join("nodes.bin"), 8).unwrap();
        let state = DemoState::new(1, 1, 0, 5, 5);
        let node = NodeBfs::new(state, NodeIndex::new(1), Step::encode(1, 2, 3, 0).unwrap(), 11);
        dev.write(NodeIndex::new(4), &node).unwrap();

        let dev2: FileSwap<NodeBfs<DemoState>> =
            FileSwap::open_at(dir.path().join("nodes.bin"), 8).unwrap();
        let mut out = NodeBfs::new(DemoState::new(0, 0, 0, 0, 0), NodeIndex::NIL, Step::encode(0,0,0,0).unwrap(), 0);
        dev2.read(NodeIndex::new(4), &mut out).unwrap();
        assert_eq!(out.frame(), 11);
        assert_eq!(out.parent(), NodeIndex::new(1));
    }
}
