//! Per-directory set of name -> permission overrides.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::collections::BTreeMap;

use super::{name::Name, perm::Perm};

/// A set of `(Name, Perm)` pairs, keyed uniquely by name.
///
/// Readers and writers are serialized by the owning `UnveilEntry`'s
/// `spin::RwLock`; `NameSet` itself holds no lock.
#[derive(Debug, Default, Clone)]
pub struct NameSet {
    map: BTreeMap<Name, Perm>,
}

impl NameSet {
    pub const fn new() -> Self {
        Self {
            map: BTreeMap::new(),
        }
    }

    /// Insert `(name, perm)` if `name` is absent. Returns `true` if it was
    /// inserted, `false` if a name already existed (left unchanged).
    pub fn insert(&mut self, name: Name, perm: Perm) -> bool {
        if self.map.contains_key(&name) {
            false
        } else {
            self.map.insert(name, perm);
            true
        }
    }

    /// Set `name`'s permission to exactly `perm`, replacing any existing
    /// value (no merge). Returns `true` if `name` was already present.
    pub fn replace(&mut self, name: Name, perm: Perm) -> bool {
        self.map.insert(name, perm).is_some()
    }

    pub fn lookup(&self, name: &Name) -> Option<Perm> {
        self.map.get(name).copied()
    }

    /// Remove every entry, returning the number removed.
    pub fn drain(&mut self) -> usize {
        let n = self.map.len();
        self.map.clear();
        n
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_then_insert_again_leaves_original() {
        let mut set = NameSet::new();
        assert!(set.insert(Name::from("a"), Perm::READ));
        assert!(!set.insert(Name::from("a"), Perm::WRITE));
        assert_eq!(set.lookup(&Name::from("a")), Some(Perm::READ));
    }

    #[test]
    fn replace_overwrites_without_merge() {
        let mut set = NameSet::new();
        set.insert(Name::from("a"), Perm::READ | Perm::WRITE);
        assert!(set.replace(Name::from("a"), Perm::EXEC));
        assert_eq!(set.lookup(&Name::from("a")), Some(Perm::EXEC));
    }

    #[test]
    fn replace_on_absent_name_inserts_and_reports_false() {
        let mut set = NameSet::new();
        assert!(!set.replace(Name::from("a"), Perm::READ));
        assert_eq!(set.lookup(&Name::from("a")), Some(Perm::READ));
    }

    #[test]
    fn drain_removes_everything_and_counts() {
        let mut set = NameSet::new();
        set.insert(Name::from("a"), Perm::READ);
        set.insert(Name::from("b"), Perm::WRITE);
        assert_eq!(set.drain(), 2);
        assert!(set.is_empty());
    }

    #[test]
    fn lookup_missing_is_none() {
        let set = NameSet::new();
        assert_eq!(set.lookup(&Name::from("missing")), None);
    }
}
