//! Dense node identifiers.
//!
//! `NodeIndex` is a small `Copy` newtype around a raw integer with a
//! single reserved sentinel value, rather than an `Option<u32>` (which
//! would double the size of every `Node` field that stores one).

use std::num::NonZeroU32;

/// A dense, monotonically allocated node identifier. `0` is reserved for
/// `NIL` ("no node"). `1..nodeCount` are valid.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd, bytemuck::Pod, bytemuck::Zeroable)]
#[repr(transparent)]
pub struct NodeIndex(u32);

impl NodeIndex {
    pub const NIL: NodeIndex = NodeIndex(0);

    #[inline]
    pub fn new(raw: u32) -> NodeIndex {
        NodeIndex(raw)
    }

    #[inline]
    pub fn is_nil(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub fn as_u32(self) -> u32 {
        self.0
    }

    #[inline]
    pub fn as_usize(self) -> usize {
        self.0 as usize
    }

    /// The index as a `NonZeroU32`, or `None` for `NIL`. Useful at the
    /// store/cache boundary, where a slot key of zero would otherwise be
    /// ambiguous with "empty slot".
    #[inline]
    pub fn non_zero(self) -> Option<NonZeroU32> {
        NonZeroU32::new(self.0)
    }
}

impl std::fmt::Debug for NodeIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_nil() {
            write!(f, "NodeIndex(NIL)")
        } else {
            write!(f, "NodeIndex({})", self.0)
        }
    }
}

impl From<u32> for NodeIndex {
    fn from(value: u32) -> Self {
        NodeIndex(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nil_is_zero() {
        assert!(NodeIndex::NIL.is_nil());
        assert_eq!(NodeIndex::NIL.as_u32(), 0);
    }

    #[test]
    fn roundtrip() {
        let i = NodeIndex::new(42);
        assert!(!i.is_nil());
        assert_eq!(i.as_usize(), 42);
    }
}
