//! Per-process unveil policy table.

#[cfg(feature = "alloc")]
extern crate alloc;

use super::{
    dir_handle::DirHandle,
    entry::UnveilEntry,
    perm::Perm,
    UnveilError,
};

/// Maximum number of unveiled directories per process, matching OpenBSD's
/// `UNVEIL_MAX_VNODES`.
pub const MAX_DIRS: usize = 128;

/// Maximum total number of per-name overrides across all directories,
/// matching OpenBSD's `UNVEIL_MAX_NAMES`.
pub const MAX_NAMES: usize = 128;

/// The fixed-capacity per-process unveil policy.
///
/// Grounded on the no-alloc `ProcessArray` fallback in `process::table`
/// (`[const { None }; N]` over a non-`Copy` element type), since a
/// `PolicyTable` needs the same fixed-slot-with-holes shape as that array.
pub struct PolicyTable {
    entries: [Option<UnveilEntry>; MAX_DIRS],
    count: usize,
    names_total: usize,
    cwd_entry: Option<usize>,
    finalized: bool,
}

impl PolicyTable {
    pub const fn new() -> Self {
        Self {
            entries: [const { None }; MAX_DIRS],
            count: 0,
            names_total: 0,
            cwd_entry: None,
            finalized: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn names_total(&self) -> usize {
        self.names_total
    }

    pub fn finalized(&self) -> bool {
        self.finalized
    }

    pub fn mark_finalized(&mut self) {
        self.finalized = true;
    }

    pub fn entry(&self, index: usize) -> Option<&UnveilEntry> {
        self.entries.get(index).and_then(|e| e.as_ref())
    }

    pub fn entry_mut(&mut self, index: usize) -> Option<&mut UnveilEntry> {
        self.entries.get_mut(index).and_then(|e| e.as_mut())
    }

    pub fn cwd_entry_index(&self) -> Option<usize> {
        self.cwd_entry
    }

    pub fn set_cwd_entry_index(&mut self, index: Option<usize>) {
        self.cwd_entry = index;
    }

    pub fn cwd_entry(&self) -> Option<&UnveilEntry> {
        self.cwd_entry.and_then(|i| self.entry(i))
    }

    /// Iterate live (non-revoked, occupied) entries with their index.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &UnveilEntry)> {
        self.entries
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_ref().map(|e| (i, e)))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut UnveilEntry)> {
        self.entries
            .iter_mut()
            .enumerate()
            .filter_map(|(i, e)| e.as_mut().map(|e| (i, e)))
    }

    /// Find the index of the live entry pinning `dir`, if any (I5: at most
    /// one match).
    pub fn find(&self, dir: &DirHandle) -> Option<usize> {
        self.iter().find(|(_, e)| e.dir() == Some(dir)).map(|(i, _)| i)
    }

    /// Reserve a new slot for `dir` with the given initial cover, enforcing
    /// `MAX_DIRS`. Returns the new entry's index.
    pub fn push(&mut self, dir: DirHandle, cover: Option<usize>) -> Result<usize, UnveilError> {
        if self.count >= MAX_DIRS {
            return Err(UnveilError::TooManyPaths);
        }
        let slot = self
            .entries
            .iter()
            .position(|e| e.is_none())
            .ok_or(UnveilError::TooManyPaths)?;
        self.entries[slot] = Some(UnveilEntry::new(dir, cover));
        self.count += 1;
        Ok(slot)
    }

    /// Account for `n` additional names being inserted (§4.4 step 5/6).
    pub fn add_names(&mut self, n: usize) -> Result<(), UnveilError> {
        if self.names_total + n > MAX_NAMES {
            return Err(UnveilError::TooManyPaths);
        }
        self.names_total += n;
        Ok(())
    }

    /// Recompute every entry whose `cover` equals `changed_cover`, because
    /// the newly interposed entry at `new_index` may now be their nearest
    /// ancestor instead (§4.2's incremental cover-maintenance rule).
    ///
    /// The caller supplies `find_cover`, which re-walks from a directory
    /// handle up to the nearest entry using [`super::cover`].
    pub fn recompute_displaced_covers<F>(&mut self, new_index: usize, changed_cover: Option<usize>, mut find_cover: F)
    where
        F: FnMut(&DirHandle, &Self) -> Option<usize>,
    {
        let targets: alloc::vec::Vec<usize> = self
            .iter()
            .filter(|(i, e)| *i != new_index && e.cover() == changed_cover)
            .map(|(i, _)| i)
            .collect();

        for i in targets {
            let dir = match self.entry(i).and_then(|e| e.dir()) {
                Some(d) => d.clone(),
                None => continue,
            };
            let new_cover = find_cover(&dir, self);
            if let Some(e) = self.entry_mut(i) {
                e.set_cover(new_cover);
            }
        }
    }

    /// Drop every entry (process teardown). Matches `unveil_destroy`: each
    /// live handle releases its reverse reference and the table resets to
    /// empty.
    pub fn destroy(&mut self) {
        for slot in self.entries.iter_mut() {
            if let Some(mut entry) = slot.take() {
                entry.revoke();
            }
        }
        self.count = 0;
        self.names_total = 0;
        self.cwd_entry = None;
        self.finalized = false;
    }

    /// Deep-clone into a fresh table for `fork` (§5 ordering guarantee: the
    /// child gets a snapshot, independent of later parent mutation).
    pub fn clone_for_fork(&self) -> Self {
        let mut entries: [Option<UnveilEntry>; MAX_DIRS] = [const { None }; MAX_DIRS];
        for (i, slot) in self.entries.iter().enumerate() {
            entries[i] = slot.as_ref().map(|e| e.clone_for_fork());
        }
        Self {
            entries,
            count: self.count,
            names_total: self.names_total,
            cwd_entry: self.cwd_entry,
            finalized: self.finalized,
        }
    }

    /// Remove a revoked, unused entry to reclaim its slot. Called lazily by
    /// the next mutation rather than eagerly by revocation itself.
    pub fn compact(&mut self) {
        for slot in self.entries.iter_mut() {
            if matches!(slot, Some(e) if e.is_revoked()) {
                *slot = None;
                self.count -= 1;
            }
        }
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::{ramfs::RamFs, Filesystem};
    use alloc::string::String;

    fn handle(path: &str) -> DirHandle {
        let fs = RamFs::new();
        DirHandle::new(fs.root(), String::from(path)).unwrap()
    }

    #[test]
    fn push_enforces_max_dirs() {
        let mut table = PolicyTable::new();
        for i in 0..MAX_DIRS {
            let _ = table.push(handle(&alloc::format!("/d{i}")), None).unwrap();
        }
        assert_eq!(table.count(), MAX_DIRS);
        assert!(matches!(
            table.push(handle("/overflow"), None),
            Err(UnveilError::TooManyPaths)
        ));
    }

    #[test]
    fn add_names_enforces_max_names() {
        let mut table = PolicyTable::new();
        table.add_names(MAX_NAMES).unwrap();
        assert!(matches!(table.add_names(1), Err(UnveilError::TooManyPaths)));
    }

    #[test]
    fn destroy_empties_table() {
        let mut table = PolicyTable::new();
        table.push(handle("/a"), None).unwrap();
        table.destroy();
        assert_eq!(table.count(), 0);
        assert!(table.is_empty());
    }

    #[test]
    fn clone_for_fork_is_independent() {
        let mut parent = PolicyTable::new();
        let idx = parent.push(handle("/a"), None).unwrap();
        let mut child = parent.clone_for_fork();

        parent.entry_mut(idx).unwrap().set_mask(Perm::READ | Perm::USER_SET);
        assert_ne!(parent.entry(idx).unwrap().mask(), child.entry(idx).unwrap().mask());

        child.entry_mut(idx).unwrap().set_mask(Perm::WRITE | Perm::USER_SET);
        assert_ne!(parent.entry(idx).unwrap().mask(), child.entry(idx).unwrap().mask());
    }
}
