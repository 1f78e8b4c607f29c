//! `unveil` system call: the userspace-facing way to install an entry in a
//! process's path-access restriction policy.
//!
//! Mirrors `syscall::filesystem::sys_open`'s pattern for reading a
//! NUL-terminated user-space path string; the flow is read-path,
//! read-permissions, resolve through the VFS, hand both to
//! `security::unveil::policy_add`.

#![allow(clippy::unnecessary_cast)]

use super::{SyscallError, SyscallResult};
use crate::{
    fs::try_get_vfs,
    process,
    security::unveil::{policy_add, PathResolution},
};

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

/// Read at most `limit` bytes from a user-space NUL-terminated string.
///
/// # Safety
/// `ptr` must point at mapped, readable user memory containing a
/// NUL-terminated byte string of at most `limit` bytes.
unsafe fn read_user_cstr(ptr: usize, limit: usize) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut p = ptr as *const u8;
    for _ in 0..limit {
        let byte = *p;
        if byte == 0 {
            break;
        }
        bytes.push(byte);
        p = p.add(1);
    }
    bytes
}

/// Unveil a path, restricting the calling process's future filename lookups
/// to paths beneath it at the given permissions.
///
/// # Arguments
/// - path: pointer to a NUL-terminated path string
/// - perms: pointer to a NUL-terminated permission string drawn from
///   `{r,w,x,c}`
///
/// Calling `unveil` with both pointers null is the userspace idiom for
/// "finalize": no further relaxation is possible for the rest of the
/// process's lifetime. Enforced right here — a finalized table rejects any
/// further `policy_add` attempt with `EPERM` before the VFS is even
/// consulted.
pub fn sys_unveil(path: usize, perms: usize) -> SyscallResult {
    if path == 0 && perms == 0 {
        let process = process::current_process().ok_or(SyscallError::InvalidArgument)?;
        process.unveil.lock().mark_finalized();
        return Ok(0);
    }

    if path == 0 || perms == 0 {
        return Err(SyscallError::InvalidArgument);
    }

    // SAFETY: both pointers were checked non-zero above. The caller must
    // provide valid, NUL-terminated strings in mapped user memory.
    let path_bytes = unsafe { read_user_cstr(path, 4096) };
    let perm_bytes = unsafe { read_user_cstr(perms, 8) };

    let path_str = core::str::from_utf8(&path_bytes).map_err(|_| SyscallError::InvalidArgument)?;
    let perm_str = core::str::from_utf8(&perm_bytes).map_err(|_| SyscallError::InvalidArgument)?;

    let process = process::current_process().ok_or(SyscallError::InvalidArgument)?;
    let vfs_lock = try_get_vfs().ok_or(SyscallError::ResourceNotFound)?;
    let vfs = vfs_lock.read();

    let resolution =
        PathResolution::resolve(&vfs, path_str).map_err(SyscallError::from)?;

    let mut table = process.unveil.lock();
    if table.finalized() {
        return Err(SyscallError::PermissionDenied);
    }
    policy_add(&mut table, &vfs, &resolution, perm_str)?;

    println!("[UNVEIL] pid={} path={} perms={}", process.pid.0, path_str, perm_str);

    Ok(0)
}

#[cfg(test)]
mod tests {
    // `sys_unveil` reads raw pointers out of user space and touches the
    // live global VFS/process table, neither of which a host unit test can
    // stand up cheaply; `security::unveil::mutation` and `policy_table`
    // cover `policy_add`'s actual semantics against an in-memory `Vfs`.
}
