//! Permission bits for the unveil policy engine.

use bitflags::bitflags;

bitflags! {
    /// Permission mask attached to an unveiled directory or name.
    ///
    /// `READ`, `WRITE`, `EXEC` and `CREATE` are the four user-requestable
    /// bits; `INSPECT` and `USER_SET` are internal bookkeeping bits that
    /// never appear in a permission string.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Perm: u8 {
        const READ = 0b0000_0001;
        const WRITE = 0b0000_0010;
        const EXEC = 0b0000_0100;
        const CREATE = 0b0000_1000;
        /// Auto-granted on ancestor directories so existence/metadata
        /// probes along an unveiled path succeed without widening access.
        const INSPECT = 0b0001_0000;
        /// Set when the entry was installed by an explicit `unveil()` call
        /// rather than auto-interposed while walking to one.
        const USER_SET = 0b0010_0000;
    }
}

/// The subset of bits a caller is ever allowed to name in a permission
/// string, or request from a lookup.
pub const REQUESTABLE: Perm = Perm::READ
    .union(Perm::WRITE)
    .union(Perm::EXEC)
    .union(Perm::CREATE);

impl Perm {
    /// Parse a permission string drawn from `{r,w,x,c}`, in any order, with
    /// no requirement that characters be unique. Returns `None` on any other
    /// character. An empty string is legal and parses to the empty mask,
    /// meaning "deny everything under this path".
    pub fn parse(s: &str) -> Option<Perm> {
        let mut perm = Perm::empty();
        for c in s.chars() {
            let bit = match c {
                'r' => Perm::READ,
                'w' => Perm::WRITE,
                'x' => Perm::EXEC,
                'c' => Perm::CREATE,
                _ => return None,
            };
            perm |= bit;
        }
        Some(perm)
    }

    /// True iff every bit of `requested` is present in `self`.
    ///
    /// `requested` must only name bits from [`REQUESTABLE`]; `INSPECT` and
    /// `USER_SET` are never part of a request.
    pub fn satisfies(self, requested: Perm) -> bool {
        self.contains(requested)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_is_deny_all() {
        assert_eq!(Perm::parse("").unwrap(), Perm::empty());
    }

    #[test]
    fn parse_all_four() {
        let p = Perm::parse("rwxc").unwrap();
        assert!(p.contains(Perm::READ | Perm::WRITE | Perm::EXEC | Perm::CREATE));
    }

    #[test]
    fn parse_rejects_unknown_char() {
        assert!(Perm::parse("rz").is_none());
    }

    #[test]
    fn parse_tolerates_duplicates() {
        assert_eq!(Perm::parse("rr").unwrap(), Perm::READ);
    }

    #[test]
    fn satisfies_checks_all_bits() {
        let mask = Perm::READ | Perm::WRITE;
        assert!(mask.satisfies(Perm::READ));
        assert!(mask.satisfies(Perm::READ | Perm::WRITE));
        assert!(!mask.satisfies(Perm::EXEC));
    }

    #[test]
    fn inspect_is_weaker_than_any_explicit_bit() {
        let inspect = Perm::INSPECT;
        assert!(!inspect.satisfies(Perm::READ));
        assert!(!inspect.satisfies(Perm::WRITE));
        assert!(!inspect.satisfies(Perm::EXEC));
        assert!(!inspect.satisfies(Perm::CREATE));
    }
}
