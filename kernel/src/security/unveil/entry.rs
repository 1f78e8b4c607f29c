//! A single unveiled directory within a process's policy table.

use spin::RwLock;

use super::{dir_handle::DirHandle, name_set::NameSet, perm::Perm};

/// One unveiled directory: the pinned handle, its own permission mask, the
/// per-name overrides beneath it, and the index of its nearest unveiled
/// ancestor within the same policy table.
pub struct UnveilEntry {
    /// `None` once the underlying directory has been revoked (invariant I6).
    dir: Option<DirHandle>,
    mask: Perm,
    names: RwLock<NameSet>,
    /// Index of the nearest ancestor `UnveilEntry` in the owning
    /// `PolicyTable`, or `None` if this entry has no unveiled ancestor.
    cover: Option<usize>,
}

impl UnveilEntry {
    /// Pin `dir` as a freshly auto-interposed entry: `INSPECT`-only mask,
    /// empty name overrides, `cover` computed by the caller.
    pub fn new(dir: DirHandle, cover: Option<usize>) -> Self {
        super::dir_handle::UVCOUNT.incref(&dir);
        Self {
            dir: Some(dir),
            mask: Perm::INSPECT,
            names: RwLock::new(NameSet::new()),
            cover,
        }
    }

    pub fn dir(&self) -> Option<&DirHandle> {
        self.dir.as_ref()
    }

    pub fn mask(&self) -> Perm {
        self.mask
    }

    pub fn set_mask(&mut self, mask: Perm) {
        self.mask = mask;
    }

    pub fn cover(&self) -> Option<usize> {
        self.cover
    }

    pub fn set_cover(&mut self, cover: Option<usize>) {
        self.cover = cover;
    }

    pub fn names(&self) -> &RwLock<NameSet> {
        &self.names
    }

    pub fn is_user_set(&self) -> bool {
        self.mask.contains(Perm::USER_SET)
    }

    /// True once the underlying directory has been cleared by revocation.
    pub fn is_revoked(&self) -> bool {
        self.dir.is_none()
    }

    /// Neutralize this entry in place (invariant I6): drop the handle,
    /// clear the mask, and release the reverse reference. The slot stays
    /// occupied until the next mutation compacts it.
    pub fn revoke(&mut self) {
        if let Some(dir) = self.dir.take() {
            super::dir_handle::UVCOUNT.decref(&dir);
        }
        self.mask = Perm::empty();
        self.names.write().drain();
    }

    /// Deep-clone this entry for `fork`, re-pinning the directory handle
    /// (incrementing its reverse reference count) rather than sharing state.
    pub fn clone_for_fork(&self) -> Self {
        let dir = self.dir.clone();
        if let Some(d) = &dir {
            super::dir_handle::UVCOUNT.incref(d);
        }
        Self {
            dir,
            mask: self.mask,
            names: RwLock::new(self.names.read().clone()),
            cover: self.cover,
        }
    }
}
