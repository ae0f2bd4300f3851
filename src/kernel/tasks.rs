//! Process list walking over `init_task.tasks`
use crate::core::profile::Profile;
use crate::error::AnalysisError;
use crate::kernel::ProcessInfo;
use crate::memory::AddressSpace;
use crate::net::backpointer::container_of;
use std::collections::HashSet;

/// Safety limit to prevent infinite loops on a corrupted list
pub const MAX_TASKS: usize = 100_000;

/// Lazy walk of the circular task list, `init_task` itself excluded.
///
/// The walk ends on returning to `init_task`, on a node already seen, on a
/// NULL or unreadable link, or after [`MAX_TASKS`] nodes. A task whose own
/// fields cannot be read is logged and skipped.
pub struct TaskWalker<'a> {
    profile: &'a Profile,
    space: &'a dyn AddressSpace,
    head: u64,
    tasks_offset: u64,
    next: u64,
    visited: HashSet<u64>,
    done: bool,
}

impl<'a> TaskWalker<'a> {
    pub fn new(profile: &'a Profile, space: &'a dyn AddressSpace) -> Result<Self, AnalysisError> {
        let init_task = profile.symbol("init_task")?;
        let tasks_offset = profile.field("task_struct", "tasks")?.offset as u64;
        profile.field("task_struct", "pid")?;
        profile.field("task_struct", "comm")?;

        let head = init_task
            .checked_add(tasks_offset)
            .ok_or(AnalysisError::InvalidAddress(init_task))?;
        let next = space.read_u64(head)?;
        log::debug!(
            "init_task at 0x{:x}, tasks offset 0x{:x}, first link 0x{:x}",
            init_task,
            tasks_offset,
            next
        );

        let mut visited = HashSet::new();
        visited.insert(head);
        Ok(TaskWalker {
            profile,
            space,
            head,
            tasks_offset,
            next,
            visited,
            done: false,
        })
    }

    fn read_task(&self, task: u64) -> Result<ProcessInfo, AnalysisError> {
        let view = self.profile.object("task_struct", task, self.space)?;
        Ok(ProcessInfo {
            offset: task,
            pid: view.read_value("pid")? as u32 as i32,
            comm: view.read_string("comm")?,
        })
    }
}

impl Iterator for TaskWalker<'_> {
    type Item = ProcessInfo;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            let link = self.next;
            if link == self.head {
                log::debug!("Completed circular list - back at init_task");
                self.done = true;
                break;
            }
            if link == 0 {
                log::warn!("NULL link in task list; stopping walk");
                self.done = true;
                break;
            }
            if !self.visited.insert(link) {
                log::warn!("Task list revisits 0x{:x}; stopping walk", link);
                self.done = true;
                break;
            }
            if self.visited.len() > MAX_TASKS {
                log::warn!("Maximum iterations reached while walking process list");
                self.done = true;
                break;
            }

            match self.space.read_u64(link) {
                Ok(next) => self.next = next,
                Err(e) => {
                    log::warn!("Unreadable task link 0x{:x}: {}", link, e);
                    self.done = true;
                }
            }

            let task = match container_of(link, self.tasks_offset) {
                Ok(task) => task,
                Err(e) => {
                    log::warn!("Bad task link 0x{:x}: {}", link, e);
                    continue;
                }
            };
            match self.read_task(task) {
                Ok(info) => return Some(info),
                Err(e) => log::warn!("Skipping task_struct at 0x{:x}: {}", task, e),
            }
        }
        None
    }
}
