//! Path-component names used as `NameSet` keys.

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use core::cmp::Ordering;

/// Maximum length of a single path component, matching `fs::NAME_MAX`.
pub const NAME_MAX: usize = crate::fs::NAME_MAX;

/// An owned path-component name.
///
/// Ordered first by length, then lexicographically by bytes. This differs
/// from plain lexicographic order but is a total order and is cheaper to
/// compare for the common case of names of differing length; callers must
/// not depend on iteration order matching `strcmp`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Name(Vec<u8>);

impl Name {
    /// Build a `Name` from a path component, rejecting components longer
    /// than [`NAME_MAX`].
    pub fn new(bytes: &[u8]) -> Option<Self> {
        if bytes.is_empty() || bytes.len() > NAME_MAX {
            return None;
        }
        Some(Self(bytes.to_vec()))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl PartialOrd for Name {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Name {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .len()
            .cmp(&other.0.len())
            .then_with(|| self.0.cmp(&other.0))
    }
}

impl From<&str> for Name {
    fn from(s: &str) -> Self {
        Self::new(s.as_bytes()).expect("component name within NAME_MAX")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orders_by_length_first() {
        let short = Name::from("zz");
        let long = Name::from("aaa");
        assert!(short < long);
    }

    #[test]
    fn orders_lexicographically_within_same_length() {
        let a = Name::from("aaa");
        let b = Name::from("aab");
        assert!(a < b);
    }

    #[test]
    fn rejects_empty_and_oversize() {
        assert!(Name::new(b"").is_none());
        let oversize = Vec::from([b'a'; NAME_MAX + 1]);
        assert!(Name::new(&oversize).is_none());
    }
}
