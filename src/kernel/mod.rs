//! Kernel data structure parsing module
use crate::memory::AddressSpace;
use serde::Serialize;

pub mod open_files;
pub mod tasks;

pub use open_files::OpenFileWalker;
pub use tasks::TaskWalker;

/// Structure to hold process information.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ProcessInfo {
    /// Virtual address of the task_struct
    pub offset: u64,
    pub pid: i32,
    pub comm: String,
}

/// One open file descriptor of one process.
#[derive(Clone)]
pub struct OpenFileRecord<'a> {
    pub task: ProcessInfo,
    /// Virtual address of the `struct file`
    pub file: u64,
    pub fd: usize,
    pub space: &'a dyn AddressSpace,
}

impl std::fmt::Debug for OpenFileRecord<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenFileRecord")
            .field("task", &self.task)
            .field("file", &format_args!("0x{:x}", self.file))
            .field("fd", &self.fd)
            .finish()
    }
}

/// Structure to hold network connection information.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ConnectionInfo {
    /// Virtual address of the inet_sock
    pub offset: u64,
    pub protocol: String,
    pub local_addr: String,
    pub local_port: u16,
    pub remote_addr: String,
    pub remote_port: u16,
    pub state: String,
    pub pid: i32,
    pub comm: String,
    pub fd: usize,
}

/// Structure to hold open file information.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub pid: i32,
    pub comm: String,
    pub fd: usize,
    /// Virtual address of the `struct file`
    pub file: u64,
    pub f_op: u64,
    pub kind: String,
}
