//! `policy_add`: the sole way new entries enter a [`PolicyTable`].

#[cfg(feature = "alloc")]
extern crate alloc;

use alloc::{string::String, vec::Vec};

use crate::fs::{NodeType, Vfs};

use super::{
    cover::{find_cover, parent_of},
    dir_handle::DirHandle,
    name::Name,
    perm::Perm,
    policy_table::PolicyTable,
    UnveilError,
};

/// What a resolved path boils down to for `policy_add`: either the path
/// names a directory directly, or it names something beneath a directory
/// (a file, or a path that does not yet exist).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetKind {
    Directory,
    Name(Name),
}

/// The information the filename-resolution machinery hands to `policy_add`:
/// the final target (a directory, or the parent of a non-directory/missing
/// terminal) and every directory traversed en route, for auto-interposing
/// ancestor entries.
pub struct PathResolution {
    target: DirHandle,
    kind: TargetKind,
    traversed: Vec<DirHandle>,
}

impl PathResolution {
    /// Resolve `path` against `vfs`, classifying the terminal per §4.4 step
    /// 4: a directory terminal becomes the target directly; anything else
    /// (a file, or a path whose terminal does not exist) targets the parent
    /// with the last component carried as a name.
    pub fn resolve(vfs: &Vfs, path: &str) -> Result<Self, UnveilError> {
        if let Ok((node, trace)) = vfs.resolve_for_unveil(path) {
            if node.node_type() == NodeType::Directory {
                let target = DirHandle::new(node, String::from(path))
                    .map_err(|_| UnveilError::NotADirectory)?;
                let traversed = ancestors(&trace, &target);
                return Ok(Self {
                    target,
                    kind: TargetKind::Directory,
                    traversed,
                });
            }
        }

        let parent_path = parent_of(path).ok_or(UnveilError::NotADirectory)?;
        let (parent_node, trace) = vfs
            .resolve_for_unveil(&parent_path)
            .map_err(|_| UnveilError::NotADirectory)?;
        let target = DirHandle::new(parent_node, parent_path)
            .map_err(|_| UnveilError::NotADirectory)?;
        let name = last_component(path).ok_or(UnveilError::NotADirectory)?;
        let traversed = ancestors(&trace, &target);

        Ok(Self {
            target,
            kind: TargetKind::Name(name),
            traversed,
        })
    }

    pub fn target(&self) -> &DirHandle {
        &self.target
    }

    pub fn kind(&self) -> &TargetKind {
        &self.kind
    }

    pub fn traversed(&self) -> &[DirHandle] {
        &self.traversed
    }
}

fn ancestors(trace: &[(String, alloc::sync::Arc<dyn crate::fs::VfsNode>)], target: &DirHandle) -> Vec<DirHandle> {
    trace
        .iter()
        .filter_map(|(path, node)| DirHandle::new(node.clone(), path.clone()).ok())
        .filter(|handle| handle != target)
        .collect()
}

fn last_component(path: &str) -> Option<Name> {
    let trimmed = path.trim_end_matches('/');
    let component = trimmed.rsplit('/').next()?;
    if component.is_empty() {
        None
    } else {
        Name::new(component.as_bytes())
    }
}

/// Install or update a policy entry (§4.4).
///
/// `perm_string` is parsed per the `{r,w,x,c}` grammar; an empty string is
/// legal and denies everything under the path. Existing entries are always
/// replaced wholesale, never merged (P4) — OpenBSD's source guards
/// escalation of an existing entry behind a disabled block; this engine
/// makes replace-not-merge the unconditional behavior, so the `EPERM` that
/// block could return is unreachable here.
pub fn policy_add(
    table: &mut PolicyTable,
    vfs: &Vfs,
    resolution: &PathResolution,
    perm_string: &str,
) -> Result<(), UnveilError> {
    let requested = Perm::parse(perm_string).ok_or(UnveilError::InvalidPerm)?;

    let target = resolution.target();
    let target_idx = table.find(target);

    // Every traversed ancestor not already present becomes a new entry too;
    // collect the distinct set of them up front so the capacity check below
    // and the insertion loop further down agree on exactly how many new
    // slots (and, for `target`, names) this call needs.
    let mut new_ancestors: Vec<&DirHandle> = Vec::new();
    for dir in resolution.traversed() {
        if table.find(dir).is_none() && !new_ancestors.iter().any(|d| *d == dir) {
            new_ancestors.push(dir);
        }
    }

    let new_dirs = usize::from(target_idx.is_none()) + new_ancestors.len();
    if table.count() + new_dirs > super::policy_table::MAX_DIRS {
        return Err(UnveilError::TooManyPaths);
    }

    let new_names = match (target_idx, resolution.kind()) {
        (None, TargetKind::Name(_)) => 1,
        (Some(idx), TargetKind::Name(name)) => {
            let entry = table.entry(idx).expect("just found");
            usize::from(entry.names().read().lookup(name).is_none())
        }
        _ => 0,
    };
    if table.names_total() + new_names > super::policy_table::MAX_NAMES {
        return Err(UnveilError::TooManyPaths);
    }

    // Capacity for the whole operation (the target entry, every not-yet-
    // present traversed ancestor, and any new name) is confirmed above, so
    // nothing below can fail with `TooManyPaths` partway through: no
    // partial mutation can occur (spec.md §4.2, §7).
    match target_idx {
        Some(idx) => {
            match resolution.kind() {
                TargetKind::Directory => {
                    let entry = table.entry_mut(idx).expect("just found");
                    entry.set_mask(requested | Perm::USER_SET);
                }
                TargetKind::Name(name) => {
                    let entry = table.entry_mut(idx).expect("just found");
                    let inserted = {
                        let mut names = entry.names().write();
                        !names.replace(name.clone(), requested | Perm::USER_SET)
                    };
                    if inserted {
                        table.add_names(1)?;
                    }
                }
            }
        }
        None => {
            let cover = find_cover(target, table, vfs);
            let idx = table.push(target.clone(), cover)?;
            match resolution.kind() {
                TargetKind::Directory => {
                    table
                        .entry_mut(idx)
                        .expect("just pushed")
                        .set_mask(requested | Perm::USER_SET);
                }
                TargetKind::Name(name) => {
                    let entry = table.entry_mut(idx).expect("just pushed");
                    entry.names().write().insert(name.clone(), requested | Perm::USER_SET);
                    table.add_names(1)?;
                }
            }
            table.recompute_displaced_covers(idx, cover, |dir, t| find_cover(dir, t, vfs));
        }
    }

    for dir in new_ancestors {
        let cover = find_cover(dir, table, vfs);
        let new_idx = table.push(dir.clone(), cover)?;
        table.recompute_displaced_covers(new_idx, cover, |d, t| find_cover(d, t, vfs));
    }

    recompute_cwd(table, vfs);

    Ok(())
}

fn recompute_cwd(table: &mut PolicyTable, vfs: &Vfs) {
    let cwd_path = String::from(vfs.get_cwd());
    if let Ok((node, _)) = vfs.resolve_for_unveil(&cwd_path) {
        if let Ok(handle) = DirHandle::new(node, cwd_path) {
            let idx = table.find(&handle).or_else(|| find_cover(&handle, table, vfs));
            table.set_cwd_entry_index(idx);
            return;
        }
    }
    table.set_cwd_entry_index(None);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::ramfs::RamFs;
    use crate::fs::{Filesystem, Permissions};
    use alloc::sync::Arc;

    fn test_vfs() -> Vfs {
        let mut vfs = Vfs::new();
        vfs.mount_root(Arc::new(RamFs::new())).unwrap();
        vfs.mkdir("/etc", Permissions::default()).unwrap();
        vfs.mkdir("/etc/ssl", Permissions::default()).unwrap();
        vfs.resolve_path("/etc")
            .unwrap()
            .create("passwd", Permissions::default())
            .unwrap();
        vfs
    }

    #[test]
    fn add_directory_sets_mask_and_user_set() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &resolution, "r").unwrap();

        let idx = table.find(resolution.target()).unwrap();
        let entry = table.entry(idx).unwrap();
        assert!(entry.is_user_set());
        assert!(entry.mask().satisfies(Perm::READ));
    }

    #[test]
    fn add_name_under_directory_does_not_create_second_entry() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc/passwd").unwrap();
        policy_add(&mut table, &vfs, &resolution, "r").unwrap();

        assert_eq!(table.count(), 1);
        assert_eq!(table.names_total(), 1);
    }

    #[test]
    fn second_add_replaces_rather_than_merges() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &resolution, "rw").unwrap();
        policy_add(&mut table, &vfs, &resolution, "r").unwrap();

        let idx = table.find(resolution.target()).unwrap();
        let mask = table.entry(idx).unwrap().mask();
        assert!(mask.satisfies(Perm::READ));
        assert!(!mask.satisfies(Perm::WRITE));
    }

    #[test]
    fn adding_nested_directory_interposes_ancestor_and_sets_cover() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();

        let a = PathResolution::resolve(&vfs, "/etc/ssl").unwrap();
        policy_add(&mut table, &vfs, &a, "r").unwrap();

        let b = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &b, "r").unwrap();

        let etc_idx = table.find(b.target()).unwrap();
        let ssl_idx = table.find(a.target()).unwrap();
        assert_eq!(table.entry(ssl_idx).unwrap().cover(), Some(etc_idx));
    }

    /// P3: repeating the same `add` call changes nothing.
    #[test]
    fn p3_add_is_idempotent_on_perms() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();
        let resolution = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &resolution, "rw").unwrap();
        let after_first = (table.count(), table.names_total());
        let mask_after_first = table.entry(table.find(resolution.target()).unwrap()).unwrap().mask();

        policy_add(&mut table, &vfs, &resolution, "rw").unwrap();
        let after_second = (table.count(), table.names_total());
        let mask_after_second = table.entry(table.find(resolution.target()).unwrap()).unwrap().mask();

        assert_eq!(after_first, after_second);
        assert_eq!(mask_after_first, mask_after_second);
    }

    /// P1/I2/I4/I5: after a sequence of `add` calls touching nested
    /// directories and a leaf name, every entry's `cover` points at a strictly
    /// earlier, distinct slot, `names_total` matches the sum of per-entry
    /// NameSet sizes, and no directory appears twice.
    #[test]
    fn p1_invariants_hold_after_sequence_of_adds() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();

        let ssl = PathResolution::resolve(&vfs, "/etc/ssl").unwrap();
        policy_add(&mut table, &vfs, &ssl, "r").unwrap();
        let etc = PathResolution::resolve(&vfs, "/etc").unwrap();
        policy_add(&mut table, &vfs, &etc, "r").unwrap();
        let passwd = PathResolution::resolve(&vfs, "/etc/passwd").unwrap();
        policy_add(&mut table, &vfs, &passwd, "r").unwrap();

        let mut seen_dirs = Vec::new();
        let mut names_sum = 0;
        for (idx, entry) in table.iter() {
            if let Some(cover) = entry.cover() {
                assert!(cover < table.count());
                assert_ne!(cover, idx);
            }
            if let Some(dir) = entry.dir() {
                assert!(!seen_dirs.contains(&dir.clone()));
                seen_dirs.push(dir.clone());
            }
            names_sum += entry.names().read().len();
        }
        assert_eq!(names_sum, table.names_total());
    }

    /// Regression: a target whose ancestors still need auto-interposing
    /// must not be partially committed when the ancestor push is what
    /// actually runs out of room. Fill the table to exactly one slot below
    /// capacity, then add a path whose target *and* two ancestors ("/" and
    /// "/etc") are all still absent — three new entries are needed for one
    /// free slot, so the call must fail `TooManyPaths` and leave the table
    /// untouched rather than committing the target first.
    #[test]
    fn capacity_exhaustion_before_ancestors_leaves_table_untouched() {
        let vfs = test_vfs();
        let mut table = PolicyTable::new();

        for i in 0..super::super::policy_table::MAX_DIRS - 1 {
            let fs = RamFs::new();
            let dir = DirHandle::new(fs.root(), alloc::format!("/synthetic{i}")).unwrap();
            table.push(dir, None).unwrap();
        }

        let resolution = PathResolution::resolve(&vfs, "/etc/ssl").unwrap();
        let before_count = table.count();
        let before_names = table.names_total();

        let result = policy_add(&mut table, &vfs, &resolution, "r");

        assert_eq!(result, Err(UnveilError::TooManyPaths));
        assert_eq!(table.count(), before_count);
        assert_eq!(table.names_total(), before_names);
        assert!(table.find(resolution.target()).is_none());
    }
}
