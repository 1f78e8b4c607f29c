//! Per-process path-access restriction engine.
//!
//! A process may voluntarily declare a set of filesystem paths it intends to
//! use, each annotated with a subset of {read, write, execute, create}.
//! Once declared, any filename lookup performed by that process must
//! resolve beneath one of the declared paths and request only permissions
//! compatible with that path's annotation, or the lookup is denied.
//!
//! The table below maps directly onto [`PolicyTable`]'s components:
//!
//! - [`perm::Perm`] / [`name::Name`] / [`name_set::NameSet`] — the
//!   permission lattice and per-directory name overrides.
//! - [`entry::UnveilEntry`] / [`dir_handle::DirHandle`] — one unveiled
//!   directory and the pinned handle it owns.
//! - [`policy_table::PolicyTable`] — the fixed-capacity per-process table.
//! - [`cover`] — nearest-ancestor resolution for entries lacking an
//!   explicit match.
//! - [`mutation`] — `policy_add`, the only way new entries are created.
//! - [`hooks`] — `policy_start_relative` / `policy_check_component` /
//!   `policy_check_final`, invoked by the filename-resolution machinery.
//! - [`revoke`] — `policy_revoke`, invoked by the filesystem layer when a
//!   directory handle is destroyed out from under a policy.

pub mod cover;
pub mod dir_handle;
pub mod entry;
pub mod hooks;
pub mod mutation;
pub mod name;
pub mod name_set;
pub mod perm;
pub mod policy_table;
pub mod revoke;

pub use dir_handle::DirHandle;
pub use entry::UnveilEntry;
pub use hooks::{resolve_checked, LookupState, StartPoint};
pub use mutation::{policy_add, PathResolution, TargetKind};
pub use name::Name;
pub use name_set::NameSet;
pub use perm::Perm;
pub use policy_table::{PolicyTable, MAX_DIRS, MAX_NAMES};
pub use revoke::policy_revoke;

/// Errors the unveil engine reports to callers, named after the errno they
/// carry across the syscall boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnveilError {
    /// Malformed permission string (`EINVAL`).
    InvalidPerm,
    /// Would exceed `MAX_DIRS` or `MAX_NAMES` (`E2BIG`).
    TooManyPaths,
    /// The target of `policy_add` is not a directory where one is required
    /// (`ENOTDIR`).
    NotADirectory,
    /// Flags on an existing entry could not be tightened in place
    /// (`EPERM`). Unreachable under the replace-not-merge policy this
    /// engine implements (see `policy_add`'s doc comment); kept so the full
    /// errno surface described for `policy_add` stays representable.
    PermissionDenied,
    /// A `USER_SET` entry actively denies the requested access (`EACCES`).
    AccessDenied,
    /// No entry, explicit or inherited, covers the requested path
    /// (`ENOENT`).
    NotFound,
}

impl UnveilError {
    /// The POSIX errno name this variant corresponds to, for logging.
    pub fn errno_name(self) -> &'static str {
        match self {
            UnveilError::InvalidPerm => "EINVAL",
            UnveilError::TooManyPaths => "E2BIG",
            UnveilError::NotADirectory => "ENOTDIR",
            UnveilError::PermissionDenied => "EPERM",
            UnveilError::AccessDenied => "EACCES",
            UnveilError::NotFound => "ENOENT",
        }
    }
}

impl core::fmt::Display for UnveilError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.errno_name())
    }
}
