//! Socket reconstruction: from open files to decoded connections
use crate::core::profile::Profile;
use crate::error::AnalysisError;

pub mod backpointer;
pub mod decode;
pub mod flags;
pub mod pipeline;
pub mod render;

pub use decode::{Endpoints, Protocol, TcpState};
pub use pipeline::{SocketEntry, SocketScanner};

/// Everything the socket chain needs from the profile, checked once before
/// the scan so a missing struct or field fails the run instead of every
/// record.
#[derive(Debug, Clone)]
pub struct NetLayout {
    pub socket_file_ops: u64,
    pub sk_common: &'static str,
    pub local_addr: &'static str,
    pub remote_addr: &'static str,
    pub local_port: &'static str,
    pub remote_port: &'static str,
}

impl NetLayout {
    pub fn check(profile: &Profile) -> Result<Self, AnalysisError> {
        let socket_file_ops = profile.symbol("socket_file_ops")?;

        for (type_name, field_name) in [
            ("file", "f_op"),
            ("file", "f_path"),
            ("path", "dentry"),
            ("dentry", "d_inode"),
            ("socket", "sk"),
            ("inet_sock", "sk"),
            ("sock", "sk_protocol"),
            ("sock_common", "skc_state"),
        ] {
            profile.field(type_name, field_name)?;
        }
        for (type_name, field_name) in [
            ("file", "f_op"),
            ("path", "dentry"),
            ("dentry", "d_inode"),
            ("socket", "sk"),
            ("sock", "sk_protocol"),
            ("sock_common", "skc_state"),
        ] {
            check_scalar(profile, type_name, field_name)?;
        }
        if profile.struct_size("socket")? == 0 {
            return Err(AnalysisError::ProfileError(
                "struct socket has zero size".to_string(),
            ));
        }

        let layout = NetLayout {
            socket_file_ops,
            sk_common: profile.field_alias("sock", &["__sk_common", "sk_common"])?,
            local_addr: profile.field_alias("inet_sock", &["inet_rcv_saddr", "rcv_saddr"])?,
            remote_addr: profile.field_alias("inet_sock", &["inet_daddr", "daddr"])?,
            local_port: profile.field_alias("inet_sock", &["inet_sport", "sport"])?,
            remote_port: profile.field_alias("inet_sock", &["inet_dport", "dport"])?,
        };
        for field_name in [
            layout.local_addr,
            layout.remote_addr,
            layout.local_port,
            layout.remote_port,
        ] {
            check_scalar(profile, "inet_sock", field_name)?;
        }
        log::debug!("Socket layout: {:?}", layout);
        Ok(layout)
    }
}

/// Pointers and integers are read as one word of at most 8 bytes.
fn check_scalar(profile: &Profile, type_name: &str, field_name: &str) -> Result<(), AnalysisError> {
    let size = profile.field(type_name, field_name)?.size;
    if size == 0 || size > 8 {
        return Err(AnalysisError::ProfileError(format!(
            "{}.{} has unusable width {}",
            type_name, field_name, size
        )));
    }
    Ok(())
}
