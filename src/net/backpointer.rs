//! container_of: recover an enclosing struct from an embedded member
use crate::core::overlay::StructView;
use crate::core::profile::Profile;
use crate::error::AnalysisError;
use crate::memory::AddressSpace;

/// Address of the struct that embeds a member at `member_offset` bytes,
/// given the member's address.
pub fn container_of(member_address: u64, member_offset: u64) -> Result<u64, AnalysisError> {
    member_address
        .checked_sub(member_offset)
        .ok_or(AnalysisError::InvalidAddress(member_address))
}

/// `SOCKET_I()`: sockets are allocated as `struct socket_alloc { struct
/// socket socket; struct inode vfs_inode; }`, so the socket sits exactly
/// `sizeof(struct socket)` bytes before its inode.
pub fn socket_from_inode<'a>(
    profile: &'a Profile,
    space: &'a dyn AddressSpace,
    inode_address: u64,
) -> Result<StructView<'a>, AnalysisError> {
    let socket_size = profile.struct_size("socket")?;
    let socket_address = container_of(inode_address, socket_size as u64)?;
    log::trace!(
        "inode 0x{:x} -> socket 0x{:x}",
        inode_address,
        socket_address
    );
    profile.object("socket", socket_address, space)
}
