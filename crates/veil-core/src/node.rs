#![forbid(unsafe_code)]

//! Opaque node handles.

use core::fmt;

/// Handle to a node owned by a [`Dom`](crate::Dom) implementation.
///
/// Handles are only meaningful to the adapter that issued them. Copying a
/// handle never copies the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl NodeId {
    /// Wrap a raw adapter-assigned id.
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id value.
    #[inline]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node#{}", self.0)
    }
}
