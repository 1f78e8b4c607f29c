//! `policy_revoke`: invoked by the filesystem layer when a directory handle
//! is destroyed out from under one or more policies (unlink of the last
//! link, or unmount).

#[cfg(feature = "alloc")]
extern crate alloc;

use super::dir_handle::DirHandle;

/// Neutralize every entry, across every process's policy table, that pins
/// `handle` (§4.6).
///
/// Mirrors `cap::revocation`'s global-process-iteration pattern:
/// revocation is not addressed to a single process, so it walks the whole
/// process table under its lock ordering, taking each table's own lock in
/// turn rather than holding a global lock across the sweep.
pub fn policy_revoke(handle: &DirHandle) {
    crate::process::table::PROCESS_TABLE.for_each(|process| {
        let mut table = process.unveil.lock();
        for (_, entry) in table.iter_mut() {
            if entry.dir() == Some(handle) {
                entry.revoke();
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::security::unveil::policy_table::PolicyTable;

    // `policy_revoke` itself sweeps the live global process table, which a
    // host unit test cannot stand up cheaply; this exercises the same
    // per-entry neutralization it performs on a standalone table instead.
    #[test]
    fn revoke_neutralizes_matching_entry_only() {
        use crate::fs::ramfs::RamFs;
        use crate::fs::Filesystem;
        use alloc::string::String;

        let fs = RamFs::new();
        let a = DirHandle::new(fs.root(), String::from("/a")).unwrap();
        let b_fs = RamFs::new();
        let b = DirHandle::new(b_fs.root(), String::from("/b")).unwrap();

        let mut table = PolicyTable::new();
        let a_idx = table.push(a.clone(), None).unwrap();
        let b_idx = table.push(b.clone(), None).unwrap();

        for (_, entry) in table.iter_mut() {
            if entry.dir() == Some(&a) {
                entry.revoke();
            }
        }

        assert!(table.entry(a_idx).unwrap().is_revoked());
        assert!(!table.entry(b_idx).unwrap().is_revoked());
    }
}
