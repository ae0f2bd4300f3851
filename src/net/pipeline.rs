//! Socket enumeration: open files in, `inet_sock` views out
use crate::core::overlay::StructView;
use crate::core::profile::Profile;
use crate::error::AnalysisError;
use crate::kernel::{OpenFileRecord, ProcessInfo};
use crate::net::backpointer;
use crate::net::NetLayout;

/// A socket-backed descriptor and the protocol socket behind it.
#[derive(Debug)]
pub struct SocketEntry<'a> {
    pub task: ProcessInfo,
    pub fd: usize,
    pub inet_sock: StructView<'a>,
}

/// Lazily turns a stream of open files into the sockets among them.
///
/// Single pass, in input order. A record whose chain cannot be resolved is
/// logged and skipped; it never ends the scan.
pub struct SocketScanner<'a, I> {
    profile: &'a Profile,
    layout: &'a NetLayout,
    records: I,
}

impl<'a, I> SocketScanner<'a, I>
where
    I: Iterator<Item = OpenFileRecord<'a>>,
{
    pub fn new(profile: &'a Profile, layout: &'a NetLayout, records: I) -> Self {
        SocketScanner {
            profile,
            layout,
            records,
        }
    }

    /// `f_op` identity check against `socket_file_ops`.
    pub fn is_socket_file(&self, record: &OpenFileRecord<'a>) -> Result<bool, AnalysisError> {
        let file = self.profile.object("file", record.file, record.space)?;
        Ok(file.read_pointer("f_op")? == self.layout.socket_file_ops)
    }

    /// file -> f_path.dentry -> d_inode -> socket -> sk -> inet_sock
    pub fn resolve(&self, record: &OpenFileRecord<'a>) -> Result<StructView<'a>, AnalysisError> {
        let file = self.profile.object("file", record.file, record.space)?;
        let inode = file
            .member("f_path")?
            .deref("dentry")?
            .read_pointer("d_inode")?;
        let socket = backpointer::socket_from_inode(self.profile, record.space, inode)?;
        let sk = socket.read_pointer("sk")?;
        self.profile.object("inet_sock", sk, record.space)
    }
}

impl<'a, I> Iterator for SocketScanner<'a, I>
where
    I: Iterator<Item = OpenFileRecord<'a>>,
{
    type Item = SocketEntry<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(record) = self.records.next() {
            let resolved = self
                .is_socket_file(&record)
                .and_then(|is_socket| is_socket.then(|| self.resolve(&record)).transpose());
            match resolved {
                Ok(Some(inet_sock)) => {
                    return Some(SocketEntry {
                        task: record.task,
                        fd: record.fd,
                        inet_sock,
                    })
                }
                Ok(None) => continue,
                Err(e) if e.is_per_record() => log::warn!(
                    "Skipping fd {} of {} (pid {}), file 0x{:x}: {}",
                    record.fd,
                    record.task.comm,
                    record.task.pid,
                    record.file,
                    e
                ),
                // Layout problems were meant to be caught by NetLayout::check
                Err(e) => log::error!(
                    "Skipping fd {} of pid {}: {}",
                    record.fd,
                    record.task.pid,
                    e
                ),
            }
        }
        None
    }
}
