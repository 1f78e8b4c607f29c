//! Directory handles and the global reverse-reference registry.
//!
//! VeridianOS's [`crate::fs::VfsNode`] has no intrusive parent pointer or
//! reference-counted "who has unveiled me" field the way a real vnode does,
//! so `DirHandle` pairs a node with the canonical path it was resolved from,
//! and the reverse count required by invariant I3 (`uvcount`) is tracked in
//! a small global registry keyed by inode number, the same way
//! `cap::revocation::RevocationList` keeps a global table rather than an
//! intrusive field on the capability itself.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::{collections::BTreeMap, string::String, sync::Arc};

use spin::RwLock;

use crate::fs::{NodeType, VfsNode};

/// A pinned reference to a directory, identified by the canonical absolute
/// path it was resolved from.
#[derive(Clone)]
pub struct DirHandle {
    node: Arc<dyn VfsNode>,
    path: String,
    inode: u64,
}

impl DirHandle {
    /// Build a handle from a resolved node and its canonical path.
    ///
    /// Fails if `node` is not a directory (invariant I1).
    pub fn new(node: Arc<dyn VfsNode>, path: String) -> Result<Self, &'static str> {
        if node.node_type() != NodeType::Directory {
            return Err("not a directory");
        }
        let inode = Self::inode_of(&node);
        Ok(Self { node, path, inode })
    }

    /// `Metadata` carries no dedicated inode field (unlike `fs::DirEntry`,
    /// the directory-listing record), so the node's identity for uvcount
    /// purposes is its `Arc` allocation address. This is stable for the
    /// handle's lifetime and unique per live node, which is all
    /// `UvcountRegistry` needs.
    fn inode_of(node: &Arc<dyn VfsNode>) -> u64 {
        Arc::as_ptr(node) as *const () as u64
    }

    pub fn node(&self) -> &Arc<dyn VfsNode> {
        &self.node
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn inode(&self) -> u64 {
        self.inode
    }
}

impl PartialEq for DirHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inode == other.inode
    }
}
impl Eq for DirHandle {}

impl core::fmt::Debug for DirHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DirHandle")
            .field("path", &self.path)
            .field("inode", &self.inode)
            .finish()
    }
}

/// Global reverse-reference counter: for each directory (by inode/address
/// identity), how many `UnveilEntry`s across all processes pin it.
///
/// Mirrors the global-static pattern in `cap::revocation::RevocationList`.
pub struct UvcountRegistry {
    counts: RwLock<BTreeMap<u64, usize>>,
}

impl UvcountRegistry {
    const fn new() -> Self {
        Self {
            counts: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn incref(&self, handle: &DirHandle) {
        let mut counts = self.counts.write();
        *counts.entry(handle.inode()).or_insert(0) += 1;
    }

    pub fn decref(&self, handle: &DirHandle) {
        let mut counts = self.counts.write();
        if let Some(count) = counts.get_mut(&handle.inode()) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                counts.remove(&handle.inode());
            }
        }
    }

    /// Current reverse-reference count for `handle` (invariant I3).
    pub fn count(&self, handle: &DirHandle) -> usize {
        self.counts
            .read()
            .get(&handle.inode())
            .copied()
            .unwrap_or(0)
    }
}

/// The process-wide registry. One instance suffices: inode identity is
/// globally unique for the lifetime of a live node.
pub static UVCOUNT: UvcountRegistry = UvcountRegistry::new();

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ramfs::RamFs;
    use crate::fs::Filesystem;

    fn root_handle() -> DirHandle {
        let fs = RamFs::new();
        let root = fs.root();
        DirHandle::new(root, String::from("/")).unwrap()
    }

    #[test]
    fn incref_decref_round_trips_to_zero() {
        let handle = root_handle();
        UVCOUNT.incref(&handle);
        UVCOUNT.incref(&handle);
        assert_eq!(UVCOUNT.count(&handle), 2);
        UVCOUNT.decref(&handle);
        assert_eq!(UVCOUNT.count(&handle), 1);
        UVCOUNT.decref(&handle);
        assert_eq!(UVCOUNT.count(&handle), 0);
    }

    #[test]
    fn equality_is_by_identity_not_path() {
        let a = root_handle();
        let mut b = a.clone();
        b.path = String::from("/elsewhere");
        assert_eq!(a, b);
    }
}
