//! Memory-mapped swap device. OS-managed paging takes the place of the
//! cache's own eviction for data that has made it to disk; the file grows
//! by whole `ARCHIVE_CLUSTER_SIZE` clusters (default `2^14` records) as
//! the node count crosses a boundary, lazily materializing one cluster at
//! a time so the engine never pays for remapping the whole file
//! mid-search.

use super::SwapDevice;
use crate::node_index::NodeIndex;
use memmap2::MmapMut;
use parking_lot::RwLock;
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};

pub const DEFAULT_CLUSTER_SIZE: u32 = 1 << 14;

pub struct MmapSwap<T: bytemuck::Pod> {
    file: std::fs::File,
    path: PathBuf,
    cluster_size: u32,
    mmap: RwLock<MmapMut>,
    mapped_records: RwLock<u32>,
    _marker: std::marker::PhantomData<T>,
}

impl<T: bytemuck::Pod> MmapSwap<T> {
    pub fn open_at(path: impl AsRef<Path>, capacity: u32, cluster_size: u32) -> io::Result<Self> {
        let record_size = std::mem::size_of::<T>() as u64;
        let file = OpenOptions::new().read(true).write(true).create(true).open(&path)?;
        let initial_records = Self::round_up(capacity.max(1), cluster_size);
        file.set_len(record_size * u64::from(initial_records))?;
        let mmap = unsafe { MmapMut::map_mut(&file)? };
        Ok(MmapSwap {
            file,
            path: path.as_ref().to_path_buf(),
            cluster_size,
            mmap: RwLock::new(mmap),
            mapped_records: RwLock::new(initial_records),
            _marker: std::marker::PhantomData,
        })
    }

    fn round_up(records: u32, cluster_size: u32) -> u32 {
        let clusters = records.div_ceil(cluster_size);
        clusters * cluster_size
    }

    fn ensure_mapped(&self, index: NodeIndex) -> io::Result<()> {
        if index.as_u32() < *self.mapped_records.read() {
            return Ok(());
        }
        let mut mapped = self.mapped_records.write();
        if index.as_u32() < *mapped {
            return Ok(());
        }
        let new_records = Self::round_up(index.as_u32() + 1, self.cluster_size);
        let record_size = std::mem::size_of::<T>() as u64;
        self.file.set_len(record_size * u64::from(new_records))?;
        let mut mmap = self.mmap.write();
        *mmap = unsafe { MmapMut::map_mut(&self.file)? };
        *mapped = new_records;
        Ok(())
    }

    fn offset(&self, index: NodeIndex) -> usize {
        std::mem::size_of::<T>() * index.as_usize()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl<T: bytemuck::Pod> SwapDevice<T> for MmapSwap<T> {
    fn open(capacity: u32) -> io::Result<Self> {
        let path = std::env::temp_dir().join(format!("kwirk-mmap-{}.bin", std::process::id()));
        Self::open_at(path, capacity, DEFAULT_CLUSTER_SIZE)
    }

    fn read(&self, index: NodeIndex, out: &mut T) -> io::Result<()> {
        self.ensure_mapped(index)?;
        let offset = self.offset(index);
        let size = std::mem::size_of::<T>();
        let mmap = self.mmap.read();
        let bytes = &mmap[offset..offset + size];
        bytemuck::bytes_of_mut(out).copy_from_slice(bytes);
        Ok(())
    }

    fn write_once(&self, index: NodeIndex, value: &T) -> io::Result<()> {
        self.ensure_mapped(index)?;
        let offset = self.offset(index);
        let size = std::mem::size_of::<T>();
        let mut mmap = self.mmap.write();
        mmap[offset..offset + size].copy_from_slice(bytemuck::bytes_of(value));
        Ok(())
    }

    fn capacity(&self) -> u32 {
        *self.mapped_records.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::demo::DemoState;
    use crate::node::{NodeBfs, NodeRecord};
    use crate::step::Step;

    #[test]
    fn write_then_read_roundtrips_across_cluster_boundary() {
        let dir = tempfile::tempdir().unwrap();
        let dev: MmapSwap<NodeBfs<DemoState>> =
            MmapSwap::open_at(dir.path().join("nodes.mmap"), 4, 4).unwrap();
        let state = DemoState::new(1, 1, 0, 5, 5);
        // index 5 falls in the second cluster (cluster_size = 4), forcing growth.
        let node = NodeBfs::new(state, NodeIndex::new(2), Step::encode(2, 3, 4, 0).unwrap(), 21);
        dev.write(NodeIndex::new(5), &node).unwrap();
        let mut out = NodeBfs::new(DemoState::new(0, 0, 0, 0, 0), NodeIndex::NIL, Step::encode(0,0,0,0).unwrap(), 0);
        dev.read(NodeIndex::new(5), &mut out).unwrap();
        assert_eq!(out.frame(), 21);
        assert_eq!(out.parent(), NodeIndex::new(2));
        assert!(dev.capacity() >= 8);
    }
}
