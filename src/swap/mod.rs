//! The swap device: the backing store for node records beyond cache
//! capacity.
//!
//! Three implementations share one `read`/`write` contract, selected at
//! configure time — build-time selection is preferable to virtual
//! dispatch on the hot path, so callers are generic over `D: SwapDevice<T>`
//! rather than holding a `dyn SwapDevice`.

pub mod file;
pub mod mmap;
pub mod ram;

use crate::node_index::NodeIndex;

/// Fixed-capacity logical array of `T` records, indexed by `NodeIndex`.
/// Reading or writing an index `>= capacity` is a programming error, not
/// a recoverable condition.
pub trait SwapDevice<T: bytemuck::Pod>: Send + Sync {
    fn open(capacity: u32) -> std::io::Result<Self>
    where
        Self: Sized;

    /// Copies record `index` into `out`. Fails only on I/O error.
    fn read(&self, index: NodeIndex, out: &mut T) -> std::io::Result<()>;

    /// Persists `value` at `index`, retrying once on I/O error before
    /// propagating — fatal after one retry.
    fn write(&self, index: NodeIndex, value: &T) -> std::io::Result<()> {
        match self.write_once(index, value) {
            Ok(()) => Ok(()),
            Err(_) => self.write_once(index, value),
        }
    }

    /// The single-attempt write backends implement; `write`'s default
    /// retry wraps this.
    fn write_once(&self, index: NodeIndex, value: &T) -> std::io::Result<()>;

    fn capacity(&self) -> u32;
}

pub use file::FileSwap;
pub use mmap::MmapSwap;
pub use ram::RamSwap;
