//! Nearest-ancestor ("cover") resolution.
//!
//! OpenBSD's `unveil_find_cover` walks up the real vnode graph via `..`
//! lookups, crossing mount points with `PDIRUNLOCK`/`dp = dp->v_mount->mnt_vnodecovered`
//! when it reaches a mount root. VeridianOS's [`crate::fs::Vfs`] resolves
//! paths as strings rather than walking a vnode graph with parent pointers,
//! so the walk here strips path components instead and re-resolves each
//! ancestor through the same `Vfs` the entry was unveiled from. A detached
//! mount (a filesystem mounted but no longer reachable from `/`) cannot
//! arise in this model, so the C original's "mount point with no covering
//! vnode" branch has no counterpart here.

#[cfg(feature = "alloc")]
extern crate alloc;

use alloc::string::{String, ToString};

use crate::fs::Vfs;

use super::{dir_handle::DirHandle, policy_table::PolicyTable};

/// Strip the last path component from an absolute path. Returns `None` once
/// `path` is already `/`.
pub(super) fn parent_of(path: &str) -> Option<String> {
    if path == "/" {
        return None;
    }
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => Some(String::from("/")),
        Some(idx) => Some(trimmed[..idx].to_string()),
        None => Some(String::from("/")),
    }
}

/// Find the nearest ancestor directory of `dir` that already has a live
/// entry in `table`, re-resolving each ancestor path through `vfs`.
///
/// Returns the index of that entry, or `None` if no ancestor (up to and
/// including `/`) is unveiled.
pub fn find_cover(dir: &DirHandle, table: &PolicyTable, vfs: &Vfs) -> Option<usize> {
    let mut path = dir.path().to_string();

    loop {
        let parent_path = parent_of(&path)?;

        if let Ok(node) = vfs.resolve_path(&parent_path) {
            if let Ok(handle) = DirHandle::new(node, parent_path.clone()) {
                if let Some(idx) = table.find(&handle) {
                    return Some(idx);
                }
            }
        }

        if parent_path == "/" {
            return None;
        }
        path = parent_path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ramfs::RamFs;
    use crate::fs::{Filesystem, Permissions};

    fn test_vfs() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.mount_root(alloc::sync::Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/a", Permissions::default()).unwrap();
        vfs.mkdir("/a/b", Permissions::default()).unwrap();
        vfs.mkdir("/a/b/c", Permissions::default()).unwrap();
        vfs
    }

    #[test]
    fn parent_of_walks_up_to_root() {
        assert_eq!(parent_of("/a/b/c"), Some(String::from("/a/b")));
        assert_eq!(parent_of("/a/b"), Some(String::from("/a")));
        assert_eq!(parent_of("/a"), Some(String::from("/")));
        assert_eq!(parent_of("/"), None);
    }

    #[test]
    fn finds_nearest_unveiled_ancestor() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();

        let a_node = vfs.resolve_path("/a").unwrap();
        let a_handle = DirHandle::new(a_node, String::from("/a")).unwrap();
        let a_idx = table.push(a_handle, None).unwrap();

        let c_node = vfs.resolve_path("/a/b/c").unwrap();
        let c_handle = DirHandle::new(c_node, String::from("/a/b/c")).unwrap();

        assert_eq!(find_cover(&c_handle, &table, &vfs), Some(a_idx));
    }

    #[test]
    fn no_cover_when_nothing_unveiled() {
        let vfs = test_vfs();
        let table = PolicyTable::new();
        let c_node = vfs.resolve_path("/a/b/c").unwrap();
        let c_handle = DirHandle::new(c_node, String::from("/a/b/c")).unwrap();
        assert_eq!(find_cover(&c_handle, &table, &vfs), None);
    }
}
