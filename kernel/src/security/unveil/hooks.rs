//! The three hooks the filename-resolution machinery calls during a path
//! walk: `policy_start_relative`, `policy_check_component`, and
//! `policy_check_final`.

#[cfg(feature = "alloc")]
extern crate alloc;

use alloc::sync::Arc;

use crate::fs::{Vfs, VfsNode};
use crate::process::Process;

use super::{
    cover::find_cover, dir_handle::DirHandle, mutation::{PathResolution, TargetKind}, name::Name,
    perm::Perm, policy_table::PolicyTable, UnveilError,
};

/// Where a path walk begins: the process's current working directory, or an
/// arbitrary already-resolved starting directory (e.g. `openat`'s `dirfd`).
pub enum StartPoint {
    Cwd,
    Dir(DirHandle),
}

/// Per-resolution scratch state threaded through the three hooks below. A
/// fresh one is created per path walk and discarded with the syscall if
/// interrupted.
pub struct LookupState {
    requested: Perm,
    current_match: Option<usize>,
    eacces_sticky: bool,
}

impl LookupState {
    pub fn new(requested: Perm) -> Self {
        Self {
            requested,
            current_match: None,
            eacces_sticky: false,
        }
    }

    pub fn requested(&self) -> Perm {
        self.requested
    }

    pub fn current_match(&self) -> Option<usize> {
        self.current_match
    }

    pub fn eacces_sticky(&self) -> bool {
        self.eacces_sticky
    }
}

/// §4.5.4: every bit of `requested` must be present in `mask`. A mismatch
/// against anything other than a bare `INSPECT` mask sets `*sticky`.
fn flag_match(mask: Perm, requested: Perm, sticky: &mut bool) -> bool {
    let ok = mask.satisfies(requested);
    if !ok && mask != Perm::INSPECT {
        *sticky = true;
    }
    ok
}

/// §4.5.1. Seeds `state.current_match` from the walk's starting directory.
pub fn policy_start_relative(table: &PolicyTable, vfs: &Vfs, state: &mut LookupState, start: StartPoint) {
    if table.is_empty() {
        return;
    }

    let idx = match start {
        StartPoint::Cwd => table.cwd_entry_index(),
        StartPoint::Dir(dir) => table.find(&dir).or_else(|| find_cover(&dir, table, vfs)),
    };

    state.current_match = idx.filter(|&i| {
        table
            .entry(i)
            .map(|e| e.mask().satisfies(state.requested))
            .unwrap_or(false)
    });
}

/// §4.5.2. Called once per intermediate directory, including `".."` steps.
///
/// `bypass` stands in for the resolver's internal-operation flag (kernel
/// lookups that must ignore unveil entirely); when set, the hook is a
/// no-op.
pub fn policy_check_component(table: &PolicyTable, state: &mut LookupState, dir: &DirHandle, bypass: bool) {
    if bypass || table.is_empty() {
        return;
    }

    if let Some(idx) = state.current_match {
        if table.entry(idx).and_then(|e| e.dir()) == Some(dir) {
            state.current_match = table.entry(idx).and_then(|e| e.cover());
            state.eacces_sticky = false;
            return;
        }
    }

    if let Some(idx) = table.find(dir) {
        if let Some(entry) = table.entry(idx) {
            if entry.is_user_set() && flag_match(entry.mask(), state.requested, &mut state.eacces_sticky) {
                state.current_match = Some(idx);
            }
        }
    }
}

/// §4.5.3. Called once on the resolved terminal.
///
/// `terminal` is `Some((handle, is_directory))` when the path exists;
/// `parent` is the directory that would contain the final component;
/// `final_name` is that component, needed whenever the terminal is not
/// itself a directory (it may not exist at all).
pub fn policy_check_final(
    table: &PolicyTable,
    state: &mut LookupState,
    terminal: Option<(&DirHandle, bool)>,
    parent: &DirHandle,
    final_name: Option<&Name>,
    bypass: bool,
) -> Result<(), UnveilError> {
    if bypass || table.is_empty() {
        return Ok(());
    }

    match terminal {
        Some((dir, true)) => {
            if let Some(idx) = table.find(dir) {
                let entry = table.entry(idx).expect("just found");
                if entry.mask().satisfies(state.requested) {
                    state.current_match = Some(idx);
                    return Ok(());
                }
                return Err(if entry.is_user_set() {
                    UnveilError::AccessDenied
                } else {
                    UnveilError::NotFound
                });
            }
        }
        _ => {
            if let Some(pidx) = table.find(parent) {
                let entry = table.entry(pidx).expect("just found");

                if let Some(name) = final_name {
                    if let Some(perm) = entry.names().read().lookup(name) {
                        if perm.satisfies(state.requested) {
                            state.current_match = Some(pidx);
                            return Ok(());
                        }
                        return Err(UnveilError::AccessDenied);
                    }
                }

                if entry.mask().satisfies(state.requested) {
                    if entry.is_user_set() {
                        state.current_match = Some(pidx);
                    }
                } else if entry.is_user_set() {
                    return Err(UnveilError::AccessDenied);
                }
            }
        }
    }

    if state.current_match.is_some() {
        Ok(())
    } else if state.eacces_sticky {
        Err(UnveilError::AccessDenied)
    } else {
        Err(UnveilError::NotFound)
    }
}

/// Convenience entry point threading a `LookupState` through a whole path
/// walk in one call, for callers that don't need to interleave their own
/// component-by-component traversal with the three hooks above.
///
/// Added alongside the free-standing hooks rather than replacing them: the
/// real filename-resolution machinery (out of scope for this engine, per
/// `spec.md` §1) is expected to call `policy_start_relative` /
/// `policy_check_component` / `policy_check_final` directly as it walks, the
/// same way `Vfs::traverse_path` walks a path component by component. This
/// wrapper exists for call sites — like `syscall::unveil::sys_unveil`'s
/// sibling lookups, or tests — that just want a checked open of a whole
/// path. On denial, increments the calling process's `unveil-denied`
/// accounting bit (spec.md §6) before returning the error.
pub fn resolve_checked(
    process: &Process,
    vfs: &Vfs,
    path: &str,
    requested: Perm,
) -> Result<Arc<dyn VfsNode>, UnveilError> {
    let table = process.unveil.lock();
    if table.is_empty() {
        drop(table);
        return vfs.resolve_path(path).map_err(|_| UnveilError::NotFound);
    }

    let resolution = PathResolution::resolve(vfs, path)?;
    let mut state = LookupState::new(requested);

    policy_start_relative(&table, vfs, &mut state, StartPoint::Dir(resolution.target().clone()));
    for dir in resolution.traversed() {
        policy_check_component(&table, &mut state, dir, false);
    }

    let (terminal, final_name) = match resolution.kind() {
        TargetKind::Directory => (Some((resolution.target(), true)), None),
        TargetKind::Name(name) => (None, Some(name)),
    };

    let outcome = policy_check_final(&table, &mut state, terminal, resolution.target(), final_name, false);
    drop(table);

    match outcome {
        Ok(()) => vfs.resolve_path(path).map_err(|_| UnveilError::NotFound),
        Err(e) => {
            process.record_unveil_denied();
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ramfs::RamFs;
    use crate::fs::{Filesystem, Permissions};
    use crate::security::unveil::mutation::{policy_add, PathResolution, TargetKind};
    use alloc::sync::Arc;

    fn scenario_s1() -> (Vfs, PolicyTable) {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/etc", Permissions::default()).unwrap();
        vfs.mkdir("/var", Permissions::default()).unwrap();
        vfs.mkdir("/var/log", Permissions::default()).unwrap();
        vfs.resolve_path("/etc")
            .unwrap()
            .create("passwd", Permissions::default())
            .unwrap();
        vfs.resolve_path("/var/log")
            .unwrap()
            .create("messages", Permissions::default())
            .unwrap();

        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &resolution, "r").unwrap();
        (vfs, table)
    }

    fn check(
        vfs: &Vfs,
        table: &PolicyTable,
        path: &str,
        requested: Perm,
    ) -> Result<(), UnveilError> {
        let resolution = PathResolution::resolve(vfs, path).unwrap();
        let mut state = LookupState::new(requested);
        policy_start_relative(table, vfs, &mut state, StartPoint::Dir(resolution.target().clone()));
        for dir in resolution.traversed() {
            policy_check_component(table, &mut state, dir, false);
        }
        let (terminal, final_name) = match resolution.kind() {
            TargetKind::Directory => (Some((resolution.target(), true)), None),
            TargetKind::Name(name) => (None, Some(name)),
        };
        policy_check_final(table, &mut state, terminal, resolution.target(), final_name, false)
    }

    #[test]
    fn s1_read_allowed_write_denied_outside_enoent() {
        let (vfs, table) = scenario_s1();
        assert!(check(&vfs, &table, "/etc/passwd", Perm::READ).is_ok());
        assert_eq!(
            check(&vfs, &table, "/etc/passwd", Perm::WRITE),
            Err(UnveilError::AccessDenied)
        );
        assert_eq!(
            check(&vfs, &table, "/var/log/messages", Perm::READ),
            Err(UnveilError::NotFound)
        );
    }

    /// P6: any descendant of an added path is allowed at or below its mask.
    #[test]
    fn p6_descendant_of_added_path_is_allowed() {
        let (vfs, table) = scenario_s1();
        assert!(check(&vfs, &table, "/etc/passwd", Perm::READ).is_ok());
    }

    /// P7: a path sharing no added ancestor is `ENOENT` once the table is
    /// non-empty, regardless of requested permission.
    #[test]
    fn p7_path_with_no_added_ancestor_is_not_found() {
        let (vfs, table) = scenario_s1();
        assert_eq!(
            check(&vfs, &table, "/var/log/messages", Perm::empty()),
            Err(UnveilError::NotFound)
        );
    }

    /// S3 (create leg): `add("/tmp", "rwc")` lets `create` succeed for a
    /// not-yet-existing name directly under `/tmp`, and a sibling directory
    /// with no policy of its own stays `ENOENT` for the same request. The
    /// destination-side rename half of S3 has no counterpart here since this
    /// VFS exposes no `rename` primitive; the CREATE-permission semantics it
    /// depends on are the ones exercised below.
    #[test]
    fn s3_create_under_rwc_directory_is_allowed_outside_is_not_found() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/tmp", Permissions::default()).unwrap();
        vfs.mkdir("/var", Permissions::default()).unwrap();

        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/tmp").unwrap();
        policy_add(&mut table, &vfs, &resolution, "rwc").unwrap();

        assert!(check(&vfs, &table, "/tmp/foo", Perm::CREATE).is_ok());
        assert_eq!(
            check(&vfs, &table, "/var/foo", Perm::CREATE),
            Err(UnveilError::NotFound)
        );
    }

    #[test]
    fn empty_table_is_unrestricted() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/tmp", Permissions::default()).unwrap();
        let table = PolicyTable::new();
        assert!(check(&vfs, &table, "/tmp", Perm::READ).is_ok());
    }

    /// S2: a single-name unveil auto-interposes INSPECT-only ancestors.
    /// Existence probes (empty requested mask) succeed on those ancestors;
    /// permission-requesting opens on them resolve to ENOENT, not EACCES,
    /// because the ancestors are never USER_SET.
    #[test]
    fn s2_name_only_unveil_auto_interposes_inspect_ancestors() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/etc", Permissions::default()).unwrap();
        vfs.mkdir("/etc/ssl", Permissions::default()).unwrap();
        vfs.resolve_path("/etc/ssl")
            .unwrap()
            .create("cert.pem", Permissions::default())
            .unwrap();
        vfs.resolve_path("/etc/ssl")
            .unwrap()
            .create("other.pem", Permissions::default())
            .unwrap();

        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc/ssl/cert.pem").unwrap();
        policy_add(&mut table, &vfs, &resolution, "r").unwrap();

        assert!(check(&vfs, &table, "/etc/ssl/cert.pem", Perm::READ).is_ok());
        assert_eq!(
            check(&vfs, &table, "/etc/ssl/other.pem", Perm::READ),
            Err(UnveilError::NotFound)
        );
        assert!(check(&vfs, &table, "/etc", Perm::empty()).is_ok());
        assert_eq!(
            check(&vfs, &table, "/etc", Perm::READ),
            Err(UnveilError::NotFound)
        );
    }

    /// S4: unveiling a directory after one of its descendants is already
    /// unveiled retroactively becomes the descendant's cover, and both
    /// remain independently readable.
    #[test]
    fn s4_unveiling_ancestor_after_child_becomes_its_cover() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/a", Permissions::default()).unwrap();
        vfs.mkdir("/a/b", Permissions::default()).unwrap();

        let mut table = PolicyTable::new();
        let b = PathResolution::resolve(&vfs, "/a/b").unwrap();
        policy_add(&mut table, &vfs, &b, "r").unwrap();
        let a = PathResolution::resolve(&vfs, "/a").unwrap();
        policy_add(&mut table, &vfs, &a, "r").unwrap();

        let a_idx = table.find(a.target()).unwrap();
        let b_idx = table.find(b.target()).unwrap();
        assert_eq!(table.entry(b_idx).unwrap().cover(), Some(a_idx));
        assert!(table.entry(a_idx).unwrap().is_user_set());

        assert!(check(&vfs, &table, "/a", Perm::READ).is_ok());
        assert!(check(&vfs, &table, "/a/b", Perm::READ).is_ok());
    }

    /// S5: once a directory's handle is revoked, lookups beneath it fail
    /// closed (`ENOENT`, since the auto-cleared entry is never `USER_SET`)
    /// rather than falling through to whatever cover it used to have.
    #[test]
    fn s5_revoked_entry_denies_as_not_found() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/d", Permissions::default()).unwrap();

        let mut table = PolicyTable::new();
        let d = PathResolution::resolve(&vfs, "/d").unwrap();
        policy_add(&mut table, &vfs, &d, "r").unwrap();
        assert!(check(&vfs, &table, "/d", Perm::READ).is_ok());

        let idx = table.find(d.target()).unwrap();
        table.entry_mut(idx).unwrap().revoke();

        assert_eq!(
            check(&vfs, &table, "/d", Perm::READ),
            Err(UnveilError::NotFound)
        );
    }

    /// S6: fork produces an independent deep clone (P5) — a child's
    /// subsequent `add` narrowing a name's permissions is invisible to the
    /// parent, which keeps its original (looser) access.
    #[test]
    fn s6_fork_child_mutation_does_not_affect_parent() {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/home", Permissions::default()).unwrap();
        vfs.mkdir("/home/u", Permissions::default()).unwrap();

        let mut parent = PolicyTable::new();
        let home_u = PathResolution::resolve(&vfs, "/home/u").unwrap();
        policy_add(&mut parent, &vfs, &home_u, "rw").unwrap();

        let mut child = parent.clone_for_fork();
        let readonly = PathResolution::resolve(&vfs, "/home/u/readonly").unwrap();
        policy_add(&mut child, &vfs, &readonly, "r").unwrap();

        assert!(check(&vfs, &parent, "/home/u/readonly", Perm::WRITE).is_ok());
        assert_eq!(
            check(&vfs, &child, "/home/u/readonly", Perm::WRITE),
            Err(UnveilError::AccessDenied)
        );
    }
}
