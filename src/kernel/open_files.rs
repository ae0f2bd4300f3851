//! Open file enumeration: `task.files -> fdt -> fd[]`
use crate::core::profile::Profile;
use crate::error::AnalysisError;
use crate::kernel::{OpenFileRecord, ProcessInfo};
use crate::memory::AddressSpace;

/// Upper bound on descriptors read per task; a smeared `max_fds` would
/// otherwise turn into millions of reads.
pub const MAX_FDS: usize = 1 << 20;

struct FdCursor {
    task: ProcessInfo,
    array: u64,
    max_fds: usize,
    index: usize,
}

/// Lazily expands a task stream into one record per open descriptor.
///
/// Tasks with no `files` (kernel threads) contribute nothing. A task whose
/// table cannot be read is logged and skipped.
pub struct OpenFileWalker<'a, T> {
    profile: &'a Profile,
    space: &'a dyn AddressSpace,
    tasks: T,
    pointer_size: usize,
    current: Option<FdCursor>,
}

impl<'a, T> OpenFileWalker<'a, T>
where
    T: Iterator<Item = ProcessInfo>,
{
    pub fn new(profile: &'a Profile, space: &'a dyn AddressSpace, tasks: T) -> Result<Self, AnalysisError> {
        profile.field("task_struct", "files")?;
        profile.field("files_struct", "fdt")?;
        profile.field("fdtable", "max_fds")?;
        let pointer_size = profile.field("fdtable", "fd")?.size;
        if pointer_size == 0 || pointer_size > 8 {
            return Err(AnalysisError::ProfileError(format!(
                "fdtable.fd has unusable pointer size {}",
                pointer_size
            )));
        }
        Ok(OpenFileWalker {
            profile,
            space,
            tasks,
            pointer_size,
            current: None,
        })
    }

    fn fd_table(&self, task: ProcessInfo) -> Result<Option<FdCursor>, AnalysisError> {
        let view = self.profile.object("task_struct", task.offset, self.space)?;
        if view.read_pointer("files")? == 0 {
            log::debug!("{} (pid {}) has no files_struct", task.comm, task.pid);
            return Ok(None);
        }
        let fdt = view.deref("files")?.deref("fdt")?;

        let mut max_fds = fdt.read_value("max_fds")? as usize;
        if max_fds > MAX_FDS {
            log::warn!(
                "{} (pid {}) claims {} descriptors; reading the first {}",
                task.comm,
                task.pid,
                max_fds,
                MAX_FDS
            );
            max_fds = MAX_FDS;
        }
        let array = fdt.read_pointer("fd")?;
        if array == 0 {
            return Ok(None);
        }
        Ok(Some(FdCursor {
            task,
            array,
            max_fds,
            index: 0,
        }))
    }
}

impl<'a, T> Iterator for OpenFileWalker<'a, T>
where
    T: Iterator<Item = ProcessInfo>,
{
    type Item = OpenFileRecord<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(cursor) = self.current.as_mut() {
                while cursor.index < cursor.max_fds {
                    let fd = cursor.index;
                    cursor.index += 1;
                    let slot = match (fd as u64)
                        .checked_mul(self.pointer_size as u64)
                        .and_then(|off| cursor.array.checked_add(off))
                    {
                        Some(slot) => slot,
                        None => break,
                    };
                    match self.space.read_uint(slot, self.pointer_size) {
                        Ok(0) => continue,
                        Ok(file) => {
                            return Some(OpenFileRecord {
                                task: cursor.task.clone(),
                                file,
                                fd,
                                space: self.space,
                            })
                        }
                        Err(e) => {
                            log::warn!(
                                "Stopping fd table of {} (pid {}) at fd {}: {}",
                                cursor.task.comm,
                                cursor.task.pid,
                                fd,
                                e
                            );
                            break;
                        }
                    }
                }
                self.current = None;
            }

            let task = self.tasks.next()?;
            let (pid, task_address) = (task.pid, task.offset);
            match self.fd_table(task) {
                Ok(cursor) => self.current = cursor,
                Err(e) => log::warn!(
                    "Skipping files of pid {} (task_struct 0x{:x}): {}",
                    pid,
                    task_address,
                    e
                ),
            }
        }
    }
}
